//! LLM-as-judge page-quality evaluation.
//!
//! The article body is shortened to a fixed width, paired with the similar-page
//! candidates and sent to the judge model. Models are tried in order; only a
//! call-level failure moves on to the next one. The reply must be a single JSON
//! object (optionally fenced) whose fields are all present and in range.

use crate::document::truncate_chars;
use crate::error::{CheckerError, ModelAttempt, Result};
use crate::llm::{ChatModel, Prompts};
use crate::search::SimilarCandidate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Maximum characters of body placed in the prompt.
pub const PROMPT_BODY_CHARS: usize = 12_000;
/// Appended to the body when it had to be shortened.
pub const TRUNCATION_MARKER: &str = " ...[cut]...";

pub const MAX_EEAT_SUMMARY_CHARS: usize = 100;
pub const MAX_ADVICE_CHARS: usize = 200;

/// Page Quality rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PageQuality {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

impl PageQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageQuality::Lowest => "Lowest",
            PageQuality::Low => "Low",
            PageQuality::Medium => "Medium",
            PageQuality::High => "High",
            PageQuality::Highest => "Highest",
        }
    }

    /// Lowest and Low warrant a rewrite advisory.
    pub fn is_low(&self) -> bool {
        matches!(self, PageQuality::Lowest | PageQuality::Low)
    }
}

impl fmt::Display for PageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Needs Met rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NeedsMet {
    Fails,
    Slightly,
    Moderately,
    Highly,
    Fully,
}

impl NeedsMet {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeedsMet::Fails => "Fails",
            NeedsMet::Slightly => "Slightly",
            NeedsMet::Moderately => "Moderately",
            NeedsMet::Highly => "Highly",
            NeedsMet::Fully => "Fully",
        }
    }
}

impl fmt::Display for NeedsMet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The judge's verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub pq: PageQuality,
    pub nm: NeedsMet,
    pub effort: u8,
    pub originality: u8,
    pub duplication_rate: u8,
    pub skill: u8,
    pub accuracy: u8,
    pub eeat_summary: String,
    pub improvement_advice: String,
}

impl EvaluationResult {
    /// Check numeric ranges and text limits. Enum vocabularies are already
    /// enforced by deserialization.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let scores = [
            ("effort", self.effort),
            ("originality", self.originality),
            ("skill", self.skill),
            ("accuracy", self.accuracy),
        ];
        for (field, value) in scores {
            if value > 5 {
                return Err(format!("{} must be 0-5, got {}", field, value));
            }
        }

        if self.duplication_rate > 100 {
            return Err(format!(
                "duplication_rate must be 0-100, got {}",
                self.duplication_rate
            ));
        }

        let summary_len = self.eeat_summary.chars().count();
        if summary_len > MAX_EEAT_SUMMARY_CHARS {
            return Err(format!(
                "eeat_summary is {} characters, limit is {}",
                summary_len, MAX_EEAT_SUMMARY_CHARS
            ));
        }

        let advice_len = self.improvement_advice.chars().count();
        if advice_len > MAX_ADVICE_CHARS {
            return Err(format!(
                "improvement_advice is {} characters, limit is {}",
                advice_len, MAX_ADVICE_CHARS
            ));
        }

        Ok(())
    }

    /// True when the page quality rating calls for a rewrite.
    pub fn needs_rewrite(&self) -> bool {
        self.pq.is_low()
    }
}

/// Shorten `text` to at most `width` characters, preferring to cut at
/// whitespace, and append `marker` when anything was removed.
pub fn shorten(text: &str, width: usize, marker: &str) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }

    let head = truncate_chars(text, width);
    let cut_on_boundary = text[head.len()..]
        .chars()
        .next()
        .is_none_or(char::is_whitespace);

    let kept = if cut_on_boundary {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 => &head[..idx],
            // One giant token: no boundary to back off to.
            _ => head,
        }
    };

    format!("{}{}", kept.trim_end(), marker)
}

/// Inner text of a leading code fence, or the trimmed input when unfenced.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    let inner = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    inner.trim()
}

/// Parse and validate a raw model reply. Nothing is coerced or guessed.
pub fn parse_result(raw: &str) -> Result<EvaluationResult> {
    let json = strip_code_fence(raw);

    let result: EvaluationResult = serde_json::from_str(json).map_err(|e| {
        CheckerError::malformed(format!("reply is not the expected JSON object: {}", e), raw)
    })?;

    result
        .validate()
        .map_err(|reason| CheckerError::malformed(reason, raw))?;

    Ok(result)
}

/// Page-quality judge with an ordered model fallback chain.
pub struct Evaluator {
    chat: Arc<dyn ChatModel>,
    models: Vec<String>,
    body_chars: usize,
}

impl Evaluator {
    /// `models` is the call order: primary first, then fallbacks.
    pub fn new(chat: Arc<dyn ChatModel>, models: Vec<String>) -> Self {
        Self {
            chat,
            models,
            body_chars: PROMPT_BODY_CHARS,
        }
    }

    /// The user message sent to the judge.
    pub fn build_user_message(&self, body: &str, candidates: &[SimilarCandidate]) -> String {
        let body = shorten(body, self.body_chars, TRUNCATION_MARKER);
        Prompts::evaluation_user(&body, candidates)
    }

    /// Evaluate an article body against its similar-page candidates.
    pub async fn evaluate(
        &self,
        body: &str,
        candidates: &[SimilarCandidate],
    ) -> Result<EvaluationResult> {
        if self.models.is_empty() {
            return Err(CheckerError::InvalidConfig(
                "no judge model configured".to_string(),
            ));
        }

        let system = Prompts::evaluator_system();
        let user = self.build_user_message(body, candidates);

        let mut attempts = Vec::new();
        for model in &self.models {
            match self.chat.complete(model, system, &user).await {
                Ok(raw) => {
                    info!(model = %model, fallbacks_used = attempts.len(), "judge replied");
                    return parse_result(&raw);
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "judge call failed");
                    attempts.push(ModelAttempt {
                        model: model.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Err(CheckerError::ModelCall { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::BODY_HEADING;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const GOOD: &str = r#"{"pq":"Medium","nm":"Moderately","effort":3,"originality":2,"duplication_rate":40,"skill":3,"accuracy":4,"eeat_summary":"ok","improvement_advice":"add citations"}"#;

    fn good_result() -> EvaluationResult {
        EvaluationResult {
            pq: PageQuality::Medium,
            nm: NeedsMet::Moderately,
            effort: 3,
            originality: 2,
            duplication_rate: 40,
            skill: 3,
            accuracy: 4,
            eeat_summary: "ok".to_string(),
            improvement_advice: "add citations".to_string(),
        }
    }

    /// Answers per model from a script and records every call.
    struct ScriptedChat {
        replies: Vec<(&'static str, std::result::Result<&'static str, &'static str>)>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedChat {
        fn new(
            replies: Vec<(&'static str, std::result::Result<&'static str, &'static str>)>,
        ) -> Arc<Self> {
            Arc::new(Self {
                replies,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn models_called(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        async fn complete(&self, model: &str, _system: &str, user: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), user.to_string()));
            let reply = self
                .replies
                .iter()
                .find(|(m, _)| *m == model)
                .map(|(_, r)| *r)
                .unwrap_or(Err("unknown model"));
            reply
                .map(str::to_string)
                .map_err(|e| CheckerError::LlmApi(e.to_string()))
        }
    }

    fn evaluator(chat: Arc<ScriptedChat>) -> Evaluator {
        Evaluator::new(chat, vec!["primary".to_string(), "fallback".to_string()])
    }

    #[tokio::test]
    async fn test_well_formed_reply_is_returned_unmodified() {
        let chat = ScriptedChat::new(vec![("primary", Ok(GOOD))]);
        let result = evaluator(chat.clone()).evaluate("body", &[]).await.unwrap();
        assert_eq!(result, good_result());
        assert_eq!(chat.models_called(), vec!["primary"]);
    }

    #[tokio::test]
    async fn test_fenced_reply_matches_unfenced() {
        let fenced: &'static str = "```json\n{\"pq\":\"Medium\",\"nm\":\"Moderately\",\"effort\":3,\"originality\":2,\"duplication_rate\":40,\"skill\":3,\"accuracy\":4,\"eeat_summary\":\"ok\",\"improvement_advice\":\"add citations\"}\n```";
        let chat = ScriptedChat::new(vec![("primary", Ok(fenced))]);
        let result = evaluator(chat).evaluate("body", &[]).await.unwrap();
        assert_eq!(result, good_result());
    }

    #[tokio::test]
    async fn test_leading_prose_is_malformed() {
        let raw = "Sure, here you go: {\"pq\":\"Medium\"}";
        let chat = ScriptedChat::new(vec![("primary", Ok(raw))]);
        let err = evaluator(chat.clone())
            .evaluate("body", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, CheckerError::MalformedResult { .. }));
        assert_eq!(err.raw_response(), Some(raw));
        // A malformed reply is terminal; the fallback model is not consulted.
        assert_eq!(chat.models_called(), vec!["primary"]);
    }

    #[tokio::test]
    async fn test_fallback_used_once_after_primary_fails() {
        let chat = ScriptedChat::new(vec![
            ("primary", Err("model_not_found")),
            ("fallback", Ok(GOOD)),
        ]);
        let result = evaluator(chat.clone()).evaluate("body", &[]).await.unwrap();
        assert_eq!(result, good_result());
        assert_eq!(chat.models_called(), vec!["primary", "fallback"]);
    }

    #[tokio::test]
    async fn test_all_models_failing_aggregates_attempts() {
        let chat = ScriptedChat::new(vec![
            ("primary", Err("quota exceeded")),
            ("fallback", Err("timeout")),
        ]);
        let err = evaluator(chat.clone())
            .evaluate("body", &[])
            .await
            .unwrap_err();

        match err {
            CheckerError::ModelCall { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].model, "primary");
                assert!(attempts[0].error.contains("quota exceeded"));
                assert_eq!(attempts[1].model, "fallback");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(chat.models_called().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_model_list() {
        let chat = ScriptedChat::new(vec![]);
        let evaluator = Evaluator::new(chat, vec![]);
        assert!(matches!(
            evaluator.evaluate("body", &[]).await,
            Err(CheckerError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_prompt_carries_shortened_body_and_candidates() {
        let chat = ScriptedChat::new(vec![("primary", Ok(GOOD))]);
        let body = "word ".repeat(5_000);
        let candidates = vec![SimilarCandidate::new("Copy", "same text")];
        evaluator(chat.clone())
            .evaluate(&body, &candidates)
            .await
            .unwrap();

        let calls = chat.calls.lock().unwrap();
        let user = &calls[0].1;
        assert!(user.starts_with(BODY_HEADING));
        assert!(user.contains(TRUNCATION_MARKER));
        assert!(user.ends_with("Copy — same text"));
    }

    #[test]
    fn test_shorten_leaves_short_text_alone() {
        assert_eq!(shorten("a b c", 10, TRUNCATION_MARKER), "a b c");
    }

    #[test]
    fn test_shorten_cuts_at_token_boundary() {
        // The width ends right after a space.
        let body = "abcd ".repeat(3_000) + "tail";
        let out = shorten(&body, PROMPT_BODY_CHARS, TRUNCATION_MARKER);
        let kept = out.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert!(kept.chars().count() <= PROMPT_BODY_CHARS);
        assert!(kept.ends_with("abcd"));

        // Shift by two so the width falls inside "abcd".
        let body = "ab".to_string() + &"abcd ".repeat(3_000);
        let out = shorten(&body, PROMPT_BODY_CHARS, TRUNCATION_MARKER);
        let kept = out.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert!(kept.chars().count() <= PROMPT_BODY_CHARS);
        assert!(kept.ends_with("abcd"));
        assert!(body[kept.len()..].starts_with(char::is_whitespace));
    }

    #[test]
    fn test_shorten_single_token_hard_cut() {
        let body = "あ".repeat(13_000);
        let out = shorten(&body, PROMPT_BODY_CHARS, TRUNCATION_MARKER);
        let kept = out.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert_eq!(kept.chars().count(), PROMPT_BODY_CHARS);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```\ntrailing"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_rejects_unknown_enum() {
        let raw = GOOD.replace("\"Medium\"", "\"Average\"");
        assert!(matches!(
            parse_result(&raw),
            Err(CheckerError::MalformedResult { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_out_of_range_scores() {
        let raw = GOOD.replace("\"effort\":3", "\"effort\":7");
        let err = parse_result(&raw).unwrap_err();
        assert!(err.to_string().contains("effort"));

        let raw = GOOD.replace("\"duplication_rate\":40", "\"duplication_rate\":140");
        assert!(parse_result(&raw).is_err());

        let raw = GOOD.replace("\"skill\":3", "\"skill\":-1");
        assert!(parse_result(&raw).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let raw = GOOD.replace(",\"accuracy\":4", "");
        assert!(parse_result(&raw).is_err());
    }

    #[test]
    fn test_parse_rejects_overlong_summary() {
        let raw = GOOD.replace("\"eeat_summary\":\"ok\"", &format!("\"eeat_summary\":\"{}\"", "s".repeat(101)));
        assert!(parse_result(&raw).is_err());

        let raw = GOOD.replace("\"eeat_summary\":\"ok\"", &format!("\"eeat_summary\":\"{}\"", "信".repeat(100)));
        assert!(parse_result(&raw).is_ok());
    }

    #[test]
    fn test_low_quality_advisory() {
        assert!(PageQuality::Lowest.is_low());
        assert!(PageQuality::Low.is_low());
        assert!(!PageQuality::Medium.is_low());
        assert!(!PageQuality::High.is_low());
        assert!(!PageQuality::Highest.is_low());

        let mut result = good_result();
        assert!(!result.needs_rewrite());
        result.pq = PageQuality::Low;
        assert!(result.needs_rewrite());
    }
}
