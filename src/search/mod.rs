//! Similar-page lookup.
//!
//! Candidates only enrich the judge prompt, so [`SimilarityQuerier::search`]
//! never fails: provider errors, throttling and timeouts all degrade to an
//! empty list.

mod duckduckgo;
mod serper;

pub use duckduckgo::{DuckDuckGoProvider, parse_ddg_results};
pub use serper::SerperProvider;

use crate::config::{SearchConfig, SearchProviderKind};
use crate::document::truncate_chars;
use crate::error::{CheckerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A page that may duplicate the article under review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarCandidate {
    pub title: String,
    pub snippet: String,
}

impl SimilarCandidate {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
        }
    }

    /// `"<title> — <snippet>"`, as listed in the judge prompt.
    pub fn prompt_line(&self) -> String {
        format!("{} — {}", self.title, self.snippet)
    }
}

/// External web-search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Up to `k` ranked results for `query`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SimilarCandidate>>;
}

/// Provider used when search is switched off.
pub struct DisabledSearch;

#[async_trait]
impl SearchProvider for DisabledSearch {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<SimilarCandidate>> {
        Ok(Vec::new())
    }
}

/// Error-absorbing front for a [`SearchProvider`].
pub struct SimilarityQuerier {
    provider: Arc<dyn SearchProvider>,
    top_k: usize,
    max_query_chars: usize,
}

impl SimilarityQuerier {
    pub fn new(provider: Arc<dyn SearchProvider>, top_k: usize, max_query_chars: usize) -> Self {
        Self {
            provider,
            top_k,
            max_query_chars,
        }
    }

    pub fn from_config(config: &SearchConfig, user_agent: &str) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let provider: Arc<dyn SearchProvider> = match config.provider {
            SearchProviderKind::DuckDuckGo => Arc::new(DuckDuckGoProvider::new(user_agent, timeout)?),
            SearchProviderKind::Serper => {
                let key = config.serper_api_key.clone().ok_or_else(|| {
                    CheckerError::InvalidConfig("serper provider needs an API key".to_string())
                })?;
                Arc::new(SerperProvider::new(key, timeout)?)
            }
            SearchProviderKind::None => Arc::new(DisabledSearch),
        };
        Ok(Self::new(provider, config.top_k, config.max_query_chars))
    }

    /// Configured number of candidates.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Query the provider; any failure yields an empty list.
    pub async fn search(&self, query: &str, k: usize) -> Vec<SimilarCandidate> {
        let query = truncate_chars(query.trim(), self.max_query_chars).trim_end();
        if query.is_empty() || k == 0 {
            return Vec::new();
        }

        match self.provider.search(query, k).await {
            Ok(mut candidates) => {
                candidates.truncate(k);
                debug!(
                    provider = self.provider.name(),
                    query,
                    count = candidates.len(),
                    "similar pages found"
                );
                candidates
            }
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    query,
                    error = %e,
                    "similar-page search failed, continuing without candidates"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingProvider {
        queries: Mutex<Vec<String>>,
        results: usize,
    }

    #[async_trait]
    impl SearchProvider for RecordingProvider {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn search(&self, query: &str, _k: usize) -> Result<Vec<SimilarCandidate>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok((0..self.results)
                .map(|i| SimilarCandidate::new(format!("t{}", i), format!("s{}", i)))
                .collect())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl SearchProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<SimilarCandidate>> {
            Err(CheckerError::Http("202 Ratelimit".to_string()))
        }
    }

    fn recording(results: usize) -> Arc<RecordingProvider> {
        Arc::new(RecordingProvider {
            queries: Mutex::new(Vec::new()),
            results,
        })
    }

    #[tokio::test]
    async fn test_failures_become_empty_results() {
        let querier = SimilarityQuerier::new(Arc::new(FailingProvider), 5, 100);
        assert!(querier.search("anything", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_long_query_is_truncated() {
        let provider = recording(1);
        let querier = SimilarityQuerier::new(provider.clone(), 5, 100);

        let query = "é".repeat(250);
        querier.search(&query, 5).await;

        let sent = provider.queries.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chars().count(), 100);
    }

    #[tokio::test]
    async fn test_results_capped_to_k() {
        let provider = recording(8);
        let querier = SimilarityQuerier::new(provider, 5, 100);

        let results = querier.search("coffee", 3).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], SimilarCandidate::new("t0", "s0"));
    }

    #[tokio::test]
    async fn test_empty_query_skips_provider() {
        let provider = recording(2);
        let querier = SimilarityQuerier::new(provider.clone(), 5, 100);

        assert!(querier.search("   ", 5).await.is_empty());
        assert!(provider.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_search() {
        let config = SearchConfig {
            provider: SearchProviderKind::None,
            ..Default::default()
        };
        let querier = SimilarityQuerier::from_config(&config, "ua").unwrap();
        assert_eq!(querier.provider_name(), "none");
        assert_eq!(querier.top_k(), 5);
        assert!(querier.search("query", 5).await.is_empty());
    }

    #[test]
    fn test_prompt_line() {
        let c = SimilarCandidate::new("Title", "snippet text");
        assert_eq!(c.prompt_line(), "Title — snippet text");
    }
}
