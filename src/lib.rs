//! SQEG quick checker - LLM-judged page-quality evaluation for web articles.
//!
//! # Overview
//!
//! A check runs four stages in sequence:
//! 1. **Extract** the article from a URL (ordered fallback strategies) or take
//!    pasted text as-is
//! 2. **Search** for similar pages that may duplicate it
//! 3. **Evaluate** the body and candidates with an LLM judge, falling back to
//!    a second model if the first call fails, and parse a strict JSON verdict
//! 4. **Log** the verdict as one row of an append-only CSV file
//!
//! # Quick Start
//!
//! ```no_run
//! use sqeg_checker::{config::Config, pipeline::QualityChecker};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let checker = QualityChecker::from_config(&config)?;
//!     let assessment = checker.check("https://example.com/some-article").await?;
//!
//!     println!("Page quality: {}", assessment.result.pq);
//!     if assessment.result.needs_rewrite() {
//!         println!("Consider rewriting this article.");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Extractor**: URL or text to `(title, body)`, capped at 20,000 characters
//! - **SimilarityQuerier**: never-failing front for a web-search provider
//! - **Evaluator**: prompt construction, model fallback chain, verdict parsing
//! - **ResultLog**: CSV sink with a lock-guarded, write-once header
//! - **QualityChecker**: wires the stages together

pub mod config;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod llm;
pub mod log;
pub mod pipeline;
pub mod search;

// Re-export commonly used types
pub use config::Config;
pub use document::ExtractedDocument;
pub use error::{CheckerError, Result};
pub use evaluator::{EvaluationResult, Evaluator, NeedsMet, PageQuality};
pub use extract::Extractor;
pub use llm::LlmClient;
pub use log::{LogRecord, ResultLog};
pub use pipeline::{Assessment, QualityChecker};
pub use search::{SimilarCandidate, SimilarityQuerier};
