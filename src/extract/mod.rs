//! Article extraction.
//!
//! A source string is either raw article text, which is returned as-is, or an
//! HTTP(S) URL. URLs go through an ordered list of strategies; the first one
//! that yields a non-empty body wins and later strategies are never called.
//! Strategy failures are logged and swallowed. When every strategy comes back
//! empty the extractor returns an empty document, which the caller must treat
//! as a failed extraction.

mod fetch;
mod html;
mod proxy;

pub use fetch::{ACCEPT_HTML, ACCEPT_JSON, HttpFetcher, PageFetcher};
pub use html::{ArticleStrategy, MarkupScanStrategy, parse_article, parse_paragraphs};
pub use proxy::{ReadabilityProxyStrategy, parse_proxy_response};

use crate::config::ExtractConfig;
use crate::document::ExtractedDocument;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// One way of turning a URL into a document.
///
/// `Ok(None)` and `Err(_)` both mean "try the next strategy"; the error is
/// only kept for the log.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, url: &str) -> Result<Option<ExtractedDocument>>;
}

/// True when `source` is a single absolute http(s) URL.
pub fn is_url(source: &str) -> bool {
    let source = source.trim();
    let lower = source.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return false;
    }
    if source.contains(char::is_whitespace) {
        return false;
    }
    Url::parse(source)
        .map(|u| u.host_str().is_some())
        .unwrap_or(false)
}

/// Ordered-fallback extractor.
pub struct Extractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    max_body_chars: usize,
}

impl Extractor {
    /// Create an extractor from an explicit strategy list.
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>, max_body_chars: usize) -> Self {
        Self {
            strategies,
            max_body_chars,
        }
    }

    /// Standard chain: article parse, markup scan, then the readability proxy when configured.
    pub fn from_config(config: &ExtractConfig) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Standard chain over a caller-supplied fetcher.
    pub fn with_fetcher(config: &ExtractConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        let mut strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(ArticleStrategy::new(fetcher.clone())),
            Box::new(MarkupScanStrategy::new(fetcher.clone())),
        ];
        if let Some(base) = config.readability_proxy.as_deref() {
            strategies.push(Box::new(ReadabilityProxyStrategy::new(fetcher, base)));
        }
        Self::new(strategies, config.max_body_chars)
    }

    /// Names of the configured strategies, in call order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract `(title, body)` from a URL or raw text.
    pub async fn extract(&self, source: &str) -> ExtractedDocument {
        if !is_url(source) {
            return ExtractedDocument::from_text(source);
        }

        let url = source.trim();
        for strategy in &self.strategies {
            match strategy.extract(url).await {
                Ok(Some(doc)) if !doc.is_empty() => {
                    let doc = doc.capped(self.max_body_chars);
                    info!(
                        strategy = strategy.name(),
                        url,
                        chars = doc.body.chars().count(),
                        "extracted article"
                    );
                    return doc;
                }
                Ok(_) => {
                    debug!(strategy = strategy.name(), url, "empty body, falling back");
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), url, error = %e, "extraction failed, falling back");
                }
            }
        }

        warn!(url, "every extraction strategy came back empty");
        ExtractedDocument::default()
    }
}
