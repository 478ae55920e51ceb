//! HTTP page fetching behind a trait so strategies can run against canned pages.

use crate::error::{CheckerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use std::time::Duration;

pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";
pub const ACCEPT_JSON: &str = "application/json";

/// Retrieves the raw body behind a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, accept: &str) -> Result<String>;
}

/// reqwest-backed fetcher with a browser-like User-Agent and a bounded timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, accept: &str) -> Result<String> {
        let response = self.client.get(url).header(ACCEPT, accept).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckerError::Http(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        Ok(response.text().await?)
    }
}
