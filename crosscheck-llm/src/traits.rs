use async_trait::async_trait;
use crosscheck_common::{CrosscheckError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

/// How a piece of evidence relates to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntailmentVerdict {
    Supported,
    Contradicted,
    Neutral,
}

/// A single claim/evidence judgment returned by the entailment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntailmentJudgment {
    pub verdict: EntailmentVerdict,
    pub reasoning: String,
}

/// A claim as the extraction provider reports it, before the engine
/// normalizes ids and citation numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawClaim {
    pub text: String,
    #[serde(default)]
    pub cited_sources: Vec<usize>,
}

/// Batch text-embedding capability.
///
/// One call embeds the whole batch; the returned vectors are in input order
/// and share a single dimension.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding model name being used
    fn embed_model_name(&self) -> &str;
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Check if the LLM service is available
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Extract discrete factual claims from a synthesized answer.
    ///
    /// Claims carry the 1-indexed `[n]` citation numbers the answer
    /// attributed them to. At most `max_claims` are returned; the provider
    /// is best-effort and the caller re-validates everything.
    async fn extract_claims(&self, answer: &str, max_claims: usize) -> Result<Vec<RawClaim>> {
        let prompt = format!(
            r#"Return STRICT JSON ONLY: an array of at most {max_claims} objects with this schema:

[
  {{
    "text": string,             // one atomic, verifiable factual statement
    "cited_sources": [ int ]    // the [n] citation numbers attached to it, [] if none
  }}
]

Rules:
- Split compound statements into separate atomic claims.
- Skip opinions, hedges, and meta-commentary.
- Keep each claim's own wording; do not invent facts.
- "cited_sources" holds the numbers inside [n] markers near the claim.

Answer text:
{answer}
"#
        );

        let response = self
            .generate(&prompt, Some(CLAIM_EXTRACTION_SYSTEM_PROMPT), None, Some(0.1))
            .await?;

        let text = response.text.trim();
        let json_str = extract_json_block(text).unwrap_or_else(|| text.to_string());
        let mut claims: Vec<RawClaim> = serde_json::from_str(&json_str).map_err(|e| {
            CrosscheckError::Provider(format!("failed to parse claim extraction JSON: {e}"))
        })?;
        claims.truncate(max_claims);
        Ok(claims)
    }

    /// Judge whether `evidence` supports, contradicts, or is neutral toward
    /// `claim`. Exactly one pair per call.
    async fn classify_entailment(&self, claim: &str, evidence: &str) -> Result<EntailmentJudgment> {
        let prompt = format!(
            r#"Return STRICT JSON ONLY with this schema:

{{
  "verdict": "SUPPORTED" | "CONTRADICTED" | "NEUTRAL",
  "reasoning": string          // one or two sentences
}}

CLAIM: "{claim}"

EVIDENCE: "{evidence}"
"#
        );

        let response = self
            .generate(&prompt, Some(ENTAILMENT_SYSTEM_PROMPT), Some(200), Some(0.0))
            .await?;

        let text = response.text.trim();
        let json_str = extract_json_block(text).unwrap_or_else(|| text.to_string());
        let wire: EntailmentWire = serde_json::from_str(&json_str).map_err(|e| {
            CrosscheckError::Provider(format!("failed to parse entailment JSON: {e}"))
        })?;

        Ok(EntailmentJudgment {
            verdict: normalize_verdict(&wire.verdict),
            reasoning: wire.reasoning.unwrap_or_default(),
        })
    }
}

/// Wire-format to deserialize strictly from the model output. The verdict
/// stays a raw string so off-schema labels degrade to NEUTRAL instead of
/// failing the parse.
#[derive(Debug, Clone, Deserialize)]
struct EntailmentWire {
    verdict: String,
    #[serde(default)]
    reasoning: Option<String>,
}

fn normalize_verdict(raw: &str) -> EntailmentVerdict {
    match raw.trim().to_ascii_uppercase().as_str() {
        "SUPPORTED" => EntailmentVerdict::Supported,
        "CONTRADICTED" => EntailmentVerdict::Contradicted,
        _ => EntailmentVerdict::Neutral,
    }
}

/// Try to extract a ```json ... ``` fenced block; fall back to the first
/// naked JSON object or array.
pub(crate) fn extract_json_block(text: &str) -> Option<String> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    static PLAIN: OnceLock<Regex> = OnceLock::new();

    let re_fence = FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*([\[{].*?[\]}])\s*```").expect("fence regex"));
    if let Some(caps) = re_fence.captures(text) {
        return Some(caps.get(1)?.as_str().to_string());
    }
    let re_plain =
        PLAIN.get_or_init(|| Regex::new(r"(?s)([\[{].*[\]}])").expect("plain regex"));
    re_plain
        .captures(text)
        .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
}

pub const CLAIM_EXTRACTION_SYSTEM_PROMPT: &str = r#"
You are an expert at extracting verifiable factual claims from research answers.

Tasks:
1) Break the answer into atomic factual statements that can be checked against sources.
2) Record which [n] citation markers the answer attached to each statement.
3) Ignore opinions, advice, and anything that cannot be verified.

Output rules:
- Output STRICT JSON ONLY that matches the schema provided in the user message.
- Keep strings concise. No markdown, no prose outside fields.
"#;

pub const ENTAILMENT_SYSTEM_PROMPT: &str = r#"
You are an impartial natural-language-inference judge.

Given one CLAIM and one EVIDENCE passage, decide whether the evidence
supports the claim, contradicts it, or is neutral (neither).

Guidance:
- SUPPORTED: the evidence states or directly implies the claim.
- CONTRADICTED: the evidence states or directly implies the opposite.
- NEUTRAL: the evidence is about something else, or is too vague to decide.
- Judge ONLY from the evidence text. Do not use outside knowledge.

Return STRICT JSON ONLY.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_is_preferred() {
        let text = "Here you go:\n```json\n{\"verdict\": \"SUPPORTED\"}\n```\nDone.";
        assert_eq!(
            extract_json_block(text).as_deref(),
            Some("{\"verdict\": \"SUPPORTED\"}")
        );
    }

    #[test]
    fn naked_array_is_found() {
        let text = "Sure: [{\"text\": \"a\", \"cited_sources\": [1]}] hope that helps";
        let block = extract_json_block(text).expect("block");
        let claims: Vec<RawClaim> = serde_json::from_str(&block).expect("parse");
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].cited_sources, vec![1]);
    }

    #[test]
    fn off_schema_verdicts_degrade_to_neutral() {
        assert_eq!(normalize_verdict("supported"), EntailmentVerdict::Supported);
        assert_eq!(
            normalize_verdict(" CONTRADICTED "),
            EntailmentVerdict::Contradicted
        );
        assert_eq!(normalize_verdict("UNSURE"), EntailmentVerdict::Neutral);
        assert_eq!(normalize_verdict(""), EntailmentVerdict::Neutral);
    }

    #[test]
    fn verdict_serializes_screaming() {
        let json = serde_json::to_string(&EntailmentVerdict::Supported).unwrap();
        assert_eq!(json, "\"SUPPORTED\"");
    }
}
