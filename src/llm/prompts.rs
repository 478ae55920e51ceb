//! Prompts for the page-quality judge.

use crate::search::SimilarCandidate;

/// Heading that introduces the article body in the user message.
pub const BODY_HEADING: &str = "### Body";
/// Heading that introduces the similar-page list in the user message.
pub const SIMILAR_HEADING: &str = "### Similar";

/// Collection of prompts used for evaluation.
pub struct Prompts;

impl Prompts {
    /// System instruction: rubric references, output schema, JSON-only directive.
    pub fn evaluator_system() -> &'static str {
        r#"You are a Google Search Quality Evaluator.
You will receive the body of a web article and a list of similar pages found on the web.
Rate the article following the Search Quality Evaluator Guidelines 2025-01, sections 3.2 / 4.6.6 / 5.2.1 / 7.1.
Use the similar pages to judge originality and how much of the content is duplicated elsewhere.

Reply with exactly this JSON shape:
{
  "pq": "Lowest|Low|Medium|High|Highest",
  "nm": "Fails|Slightly|Moderately|Highly|Fully",
  "effort": <integer 0-5>,
  "originality": <integer 0-5>,
  "duplication_rate": <integer 0-100>,
  "skill": <integer 0-5>,
  "accuracy": <integer 0-5>,
  "eeat_summary": "<at most 100 characters>",
  "improvement_advice": "<at most 200 characters>"
}

"pq" is Page Quality and "nm" is Needs Met; use exactly one of the listed words for each.
Output only the single JSON object. No prose before or after it, no code fences."#
    }

    /// User message: article body, then one line per similar page.
    pub fn evaluation_user(body: &str, candidates: &[SimilarCandidate]) -> String {
        let similar = candidates
            .iter()
            .map(SimilarCandidate::prompt_line)
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "{}\n{}\n\n{}\n{}",
            BODY_HEADING, body, SIMILAR_HEADING, similar
        )
    }
}
