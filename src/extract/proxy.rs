//! Readability proxy strategy: ask a reader service for a rendered version of
//! the page and take its `title` / `content` fields.

use super::ExtractionStrategy;
use super::fetch::{ACCEPT_JSON, PageFetcher};
use crate::document::ExtractedDocument;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
struct ProxyPayload {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Reader services answer either flat or wrapped in `data`.
#[derive(Debug, Deserialize)]
struct ProxyResponse {
    #[serde(flatten)]
    top: ProxyPayload,
    #[serde(default)]
    data: Option<ProxyPayload>,
}

/// Parse a proxy response body into a document.
pub fn parse_proxy_response(body: &str) -> Result<Option<ExtractedDocument>> {
    let response: ProxyResponse = serde_json::from_str(body)?;
    let payload = match response.data {
        Some(data) if data.content.is_some() => data,
        _ => response.top,
    };

    let Some(content) = payload.content else {
        return Ok(None);
    };
    let title = payload.title.unwrap_or_default();
    Ok(Some(ExtractedDocument::new(
        title.trim(),
        content.trim(),
    )))
}

pub struct ReadabilityProxyStrategy {
    fetcher: Arc<dyn PageFetcher>,
    base: String,
}

impl ReadabilityProxyStrategy {
    pub fn new(fetcher: Arc<dyn PageFetcher>, base: impl Into<String>) -> Self {
        Self {
            fetcher,
            base: base.into(),
        }
    }

    /// The page URL is appended verbatim to the proxy base.
    fn endpoint(&self, url: &str) -> String {
        let base = self.base.trim_end_matches('/');
        format!("{}/{}", base, url)
    }
}

#[async_trait]
impl ExtractionStrategy for ReadabilityProxyStrategy {
    fn name(&self) -> &'static str {
        "readability-proxy"
    }

    async fn extract(&self, url: &str) -> Result<Option<ExtractedDocument>> {
        let body = self.fetcher.fetch(&self.endpoint(url), ACCEPT_JSON).await?;
        parse_proxy_response(&body)
    }
}
