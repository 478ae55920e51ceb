//! DuckDuckGo HTML endpoint. Keyless; throttled responses simply parse to no results.

use super::{SearchProvider, SimilarCandidate};
use crate::document::compact_ws;
use crate::error::{CheckerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const DDG_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

fn text_of(elem: ElementRef<'_>) -> String {
    compact_ws(&elem.text().collect::<Vec<_>>().join(" "))
}

/// Parse result titles and snippets out of a DuckDuckGo HTML results page.
pub fn parse_ddg_results(html: &str, limit: usize) -> Vec<SimilarCandidate> {
    let document = Html::parse_document(html);
    let (Ok(container_sel), Ok(title_sel), Ok(snippet_sel)) = (
        Selector::parse("div.result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for container in document.select(&container_sel) {
        if out.len() >= limit {
            break;
        }
        let is_ad = container
            .value()
            .classes()
            .any(|class| class == "result--ad");
        if is_ad {
            continue;
        }

        let Some(title) = container.select(&title_sel).next().map(text_of) else {
            continue;
        };
        if title.is_empty() {
            continue;
        }
        let snippet = container
            .select(&snippet_sel)
            .next()
            .map(text_of)
            .unwrap_or_default();

        out.push(SimilarCandidate::new(title, snippet));
    }
    out
}

pub struct DuckDuckGoProvider {
    client: Client,
}

impl DuckDuckGoProvider {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SimilarCandidate>> {
        let response = self
            .client
            .get(DDG_HTML_ENDPOINT)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckerError::Http(format!(
                "DuckDuckGo returned {}",
                status
            )));
        }

        let html = response.text().await?;
        Ok(parse_ddg_results(&html, k))
    }
}
