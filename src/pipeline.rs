//! End-to-end check: extract → find similar pages → judge → log.
//!
//! Extraction and search failures are absorbed by their components; an empty
//! extraction stops the run before any model call. Judge failures propagate
//! and nothing is logged for a failed run.

use crate::config::Config;
use crate::document::{ExtractedDocument, truncate_chars};
use crate::error::{CheckerError, Result};
use crate::evaluator::{EvaluationResult, Evaluator};
use crate::extract::Extractor;
use crate::llm::LlmClient;
use crate::log::{LogRecord, ResultLog, SOURCE_CHARS};
use crate::search::{SimilarCandidate, SimilarityQuerier};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Everything produced by one successful check.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub document: ExtractedDocument,
    /// Query sent to the search provider.
    pub query: String,
    pub candidates: Vec<SimilarCandidate>,
    pub result: EvaluationResult,
    /// Log file the result was appended to, if logging is on.
    pub logged_to: Option<PathBuf>,
}

pub struct QualityChecker {
    extractor: Extractor,
    querier: SimilarityQuerier,
    evaluator: Evaluator,
    log: Option<ResultLog>,
}

impl QualityChecker {
    pub fn new(
        extractor: Extractor,
        querier: SimilarityQuerier,
        evaluator: Evaluator,
        log: Option<ResultLog>,
    ) -> Self {
        Self {
            extractor,
            querier,
            evaluator,
            log,
        }
    }

    /// Wire up the production collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let extractor = Extractor::from_config(&config.extract)?;
        let querier = SimilarityQuerier::from_config(&config.search, &config.extract.user_agent)?;
        let client = LlmClient::new(config.llm.clone())?;
        let evaluator = Evaluator::new(Arc::new(client), config.llm.model_chain());
        let log = ResultLog::new(&config.log.path);
        Ok(Self::new(extractor, querier, evaluator, Some(log)))
    }

    /// Turn result logging off.
    pub fn without_log(mut self) -> Self {
        self.log = None;
        self
    }

    /// Run the whole pipeline for one URL or pasted article.
    pub async fn check(&self, source: &str) -> Result<Assessment> {
        let document = self.extractor.extract(source).await;
        if document.is_empty() {
            return Err(CheckerError::ExtractionFailed {
                input: truncate_chars(source.trim(), SOURCE_CHARS).to_string(),
            });
        }

        let query = document.derive_query();
        let candidates = self.querier.search(&query, self.querier.top_k()).await;
        info!(
            words = document.word_count(),
            candidates = candidates.len(),
            "evaluating article"
        );

        let result = self.evaluator.evaluate(&document.body, &candidates).await?;

        let logged_to = match &self.log {
            Some(log) => {
                log.append(&LogRecord::now(source, &result))?;
                Some(log.path().to_path_buf())
            }
            None => None,
        };

        Ok(Assessment {
            document,
            query,
            candidates,
            result,
            logged_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::PageQuality;
    use crate::llm::ChatModel;
    use crate::search::SearchProvider;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const LOW: &str = r#"{"pq":"Low","nm":"Slightly","effort":1,"originality":1,"duplication_rate":80,"skill":2,"accuracy":3,"eeat_summary":"thin","improvement_advice":"write original analysis"}"#;

    struct FixedChat {
        reply: &'static str,
        calls: AtomicUsize,
        last_user: Mutex<String>,
    }

    #[async_trait]
    impl ChatModel for FixedChat {
        async fn complete(&self, _model: &str, _system: &str, user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_user.lock().unwrap() = user.to_string();
            Ok(self.reply.to_string())
        }
    }

    struct QueryEcho {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchProvider for QueryEcho {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn search(&self, query: &str, _k: usize) -> Result<Vec<SimilarCandidate>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(vec![SimilarCandidate::new("Mirror site", "copied paragraph")])
        }
    }

    struct Harness {
        checker: QualityChecker,
        chat: Arc<FixedChat>,
        search: Arc<QueryEcho>,
        log_path: PathBuf,
        _dir: TempDir,
    }

    fn harness(reply: &'static str) -> Harness {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("sqeg_log.csv");
        let chat = Arc::new(FixedChat {
            reply,
            calls: AtomicUsize::new(0),
            last_user: Mutex::new(String::new()),
        });
        let search = Arc::new(QueryEcho {
            queries: Mutex::new(Vec::new()),
        });
        let checker = QualityChecker::new(
            Extractor::new(Vec::new(), 20_000),
            SimilarityQuerier::new(search.clone(), 5, 100),
            Evaluator::new(chat.clone(), vec!["primary".to_string()]),
            Some(ResultLog::new(&log_path)),
        );
        Harness {
            checker,
            chat,
            search,
            log_path,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_raw_text_runs_end_to_end() {
        let h = harness(LOW);
        let text = "Ten tips for better sleep. Keep a schedule and avoid screens before bed.";

        let assessment = h.checker.check(text).await.unwrap();

        assert_eq!(assessment.result.pq, PageQuality::Low);
        assert!(assessment.result.needs_rewrite());
        assert_eq!(assessment.logged_to.as_deref(), Some(h.log_path.as_path()));
        assert_eq!(h.search.queries.lock().unwrap()[0], assessment.query);
        assert!(assessment.query.starts_with("Ten tips for better sleep."));
        assert!(
            h.chat
                .last_user
                .lock()
                .unwrap()
                .contains("Mirror site — copied paragraph")
        );

        let rows = ResultLog::new(&h.log_path).read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, text);
    }

    #[tokio::test]
    async fn test_failed_extraction_skips_remote_calls() {
        let h = harness(LOW);

        let err = h.checker.check("https://unreachable.test/post").await.unwrap_err();

        assert!(matches!(err, CheckerError::ExtractionFailed { .. }));
        assert_eq!(h.chat.calls.load(Ordering::SeqCst), 0);
        assert!(h.search.queries.lock().unwrap().is_empty());
        assert!(!h.log_path.exists());
    }

    #[tokio::test]
    async fn test_malformed_result_is_not_logged() {
        let h = harness("I think this page is fine.");

        let err = h.checker.check("some article text").await.unwrap_err();

        assert_eq!(err.raw_response(), Some("I think this page is fine."));
        assert!(!h.log_path.exists());
    }

    #[tokio::test]
    async fn test_without_log() {
        let h = harness(LOW);
        let checker = h.checker.without_log();

        let assessment = checker.check("some article text").await.unwrap();
        assert!(assessment.logged_to.is_none());
        assert!(!h.log_path.exists());
    }
}
