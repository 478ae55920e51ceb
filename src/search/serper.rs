//! Serper.dev Google search API.

use super::{SearchProvider, SimilarCandidate};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

#[derive(Debug, Deserialize)]
struct SerperItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct SerperResp {
    #[serde(default)]
    organic: Vec<SerperItem>,
}

fn candidates_from(resp: SerperResp, k: usize) -> Vec<SimilarCandidate> {
    resp.organic
        .into_iter()
        .filter(|item| !item.title.trim().is_empty())
        .take(k)
        .map(|item| SimilarCandidate::new(item.title.trim(), item.snippet.trim()))
        .collect()
}

pub struct SerperProvider {
    http: Client,
    key: String,
}

impl SerperProvider {
    pub fn new(key: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, key })
    }
}

#[async_trait]
impl SearchProvider for SerperProvider {
    fn name(&self) -> &'static str {
        "serper"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SimilarCandidate>> {
        let resp = self
            .http
            .post(SERPER_ENDPOINT)
            .header("X-API-KEY", &self.key)
            .json(&serde_json::json!({ "q": query, "num": k }))
            .send()
            .await?
            .error_for_status()?
            .json::<SerperResp>()
            .await?;
        Ok(candidates_from(resp, k))
    }
}
