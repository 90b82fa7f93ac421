//! Data model for one verification run.
//!
//! Everything here serializes to the flat camelCase JSON the downstream
//! adjudication step and the UI consume. `VerifiedClaim` and
//! `VerificationOutput` are terminal values: built once, never mutated.

use chrono::{DateTime, Utc};
use crosscheck_llm::traits::EntailmentVerdict;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A retrieved document the answer was synthesized from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

/// A windowed span of sentences from one source, used as a retrieval unit.
///
/// `source_index` is 1-indexed and matches the `[n]` citation numbering the
/// answer uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub text: String,
    pub source_id: String,
    pub source_index: usize,
    pub source_title: String,
}

/// An atomic factual statement extracted from the answer, after the engine
/// has re-numbered ids (`c1..cN`) and validated citation numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedClaim {
    pub id: String,
    pub text: String,
    pub cited_sources: Vec<usize>,
}

/// Outcome of matching one claim embedding against all passage embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub best_passage: Passage,
    pub global_best_support: f32,
    pub cited_source_support: f32,
    pub citation_mismatch: bool,
}

/// Numeric cross-check between a claim and its best evidence passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericCheck {
    pub claim_numbers: Vec<String>,
    pub evidence_numbers: Vec<String>,
    #[serde(rename = "match")]
    pub is_match: bool,
}

/// Discretized confidence bucket derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Combined confidence signal for one claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedVerdict {
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub issues: Vec<String>,
}

/// Terminal record for one claim: the claim, its evidence, and every signal
/// the aggregator folded into the confidence score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedClaim {
    #[serde(flatten)]
    pub claim: ExtractedClaim,
    /// Absent on degraded paths (no evidence, per-claim failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<RetrievalResult>,
    pub entailment: EntailmentVerdict,
    pub entailment_reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_check: Option<NumericCheck>,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub issues: Vec<String>,
}

/// Per-run tallies by entailment category and mismatch type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSummary {
    pub supported: usize,
    pub contradicted: usize,
    pub neutral: usize,
    pub citation_mismatches: usize,
    pub numeric_mismatches: usize,
}

/// The full result of one verification run.
///
/// `claims` preserves the input claim order; `overall_confidence` is the
/// mean per-claim confidence scaled to 0–100.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutput {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub claims: Vec<VerifiedClaim>,
    pub overall_confidence: u32,
    pub summary: VerificationSummary,
    pub duration_ms: u64,
}

/// Passages plus their embeddings, prepared once per run.
///
/// Produced by [`crate::Verifier::prepare_evidence`]; callers may build it
/// ahead of time (while the answer is still streaming) and hand it to
/// [`crate::Verifier::verify_claims`] later.
#[derive(Debug, Clone, Default)]
pub struct EvidenceBundle {
    pub passages: Vec<Passage>,
    pub embeddings: Vec<Vec<f32>>,
}

impl EvidenceBundle {
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}
