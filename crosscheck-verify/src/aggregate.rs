//! Signal aggregation: one calibrated confidence per claim.

use crate::types::{AggregatedVerdict, ConfidenceLevel, NumericCheck};
use crosscheck_common::VerifyConfig;
use crosscheck_llm::traits::EntailmentVerdict;

/// Fold the entailment verdict, retrieval quality, citation-mismatch flag,
/// and numeric check into a confidence score, level, and issue list.
///
/// The verdict sets the base; each weak signal multiplies a penalty in
/// independently. A numeric mismatch carries the steepest penalty: a hard
/// factual conflict should dominate the score. The result is clamped to
/// [0, 1] so that reconfigured penalty factors can never push it outside
/// the scale.
pub fn aggregate_signals(
    verdict: EntailmentVerdict,
    retrieval_similarity: f32,
    citation_mismatch: bool,
    numeric_check: Option<&NumericCheck>,
    cfg: &VerifyConfig,
) -> AggregatedVerdict {
    let mut issues = Vec::new();

    let mut confidence = match verdict {
        EntailmentVerdict::Supported => cfg.base_supported,
        EntailmentVerdict::Neutral => {
            issues.push("evidence neither clearly supports nor contradicts the claim".to_string());
            cfg.base_neutral
        }
        EntailmentVerdict::Contradicted => {
            issues.push("evidence contradicts the claim".to_string());
            cfg.base_contradicted
        }
    };

    if retrieval_similarity < cfg.low_similarity_threshold {
        confidence *= cfg.penalty_low_similarity;
        issues.push("low semantic similarity".to_string());
    }
    if citation_mismatch {
        confidence *= cfg.penalty_citation_mismatch;
        issues.push("best evidence comes from a source the answer did not cite".to_string());
    }
    if let Some(check) = numeric_check {
        if !check.is_match {
            confidence *= cfg.penalty_numeric_mismatch;
            issues.push("numbers in the claim do not match the evidence".to_string());
        }
    }

    let confidence = confidence.clamp(0.0, 1.0);

    AggregatedVerdict {
        confidence,
        confidence_level: level_for(confidence, cfg),
        issues,
    }
}

pub(crate) fn level_for(confidence: f64, cfg: &VerifyConfig) -> ConfidenceLevel {
    if confidence >= cfg.high_confidence_cutoff {
        ConfidenceLevel::High
    } else if confidence >= cfg.medium_confidence_cutoff {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> VerifyConfig {
        VerifyConfig::default()
    }

    fn numeric(is_match: bool) -> NumericCheck {
        NumericCheck {
            claim_numbers: vec!["100".to_string()],
            evidence_numbers: vec!["200".to_string()],
            is_match,
        }
    }

    #[test]
    fn clean_supported_claim_scores_high() {
        let verdict = aggregate_signals(EntailmentVerdict::Supported, 0.9, false, None, &cfg());
        assert_eq!(verdict.confidence, 1.0);
        assert_eq!(verdict.confidence_level, ConfidenceLevel::High);
        assert!(verdict.issues.is_empty());
    }

    #[test]
    fn neutral_base_lands_in_medium() {
        let verdict = aggregate_signals(EntailmentVerdict::Neutral, 0.9, false, None, &cfg());
        assert!((verdict.confidence - 0.55).abs() < 1e-9);
        assert_eq!(verdict.confidence_level, ConfidenceLevel::Medium);
        assert_eq!(verdict.issues.len(), 1);
    }

    #[test]
    fn contradiction_lands_in_low() {
        let verdict = aggregate_signals(EntailmentVerdict::Contradicted, 0.9, false, None, &cfg());
        assert!((verdict.confidence - 0.15).abs() < 1e-9);
        assert_eq!(verdict.confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn weak_retrieval_multiplies_in() {
        let verdict = aggregate_signals(EntailmentVerdict::Supported, 0.2, false, None, &cfg());
        assert!((verdict.confidence - 0.7).abs() < 1e-9);
        assert!(verdict
            .issues
            .iter()
            .any(|i| i == "low semantic similarity"));
    }

    #[test]
    fn numeric_mismatch_dominates() {
        let check = numeric(false);
        let verdict =
            aggregate_signals(EntailmentVerdict::Supported, 0.9, false, Some(&check), &cfg());
        assert!((verdict.confidence - 0.4).abs() < 1e-9);
        assert_eq!(verdict.confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn matching_numbers_add_no_penalty() {
        let check = numeric(true);
        let verdict =
            aggregate_signals(EntailmentVerdict::Supported, 0.9, false, Some(&check), &cfg());
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn penalties_compose_multiplicatively() {
        let check = numeric(false);
        let verdict =
            aggregate_signals(EntailmentVerdict::Neutral, 0.2, true, Some(&check), &cfg());
        // 0.55 * 0.7 * 0.85 * 0.4
        assert!((verdict.confidence - 0.1309).abs() < 1e-9);
        assert_eq!(verdict.confidence_level, ConfidenceLevel::Low);
        assert_eq!(verdict.issues.len(), 4);
    }

    #[test]
    fn oversized_penalty_factors_cannot_escape_the_scale() {
        let mut cfg = cfg();
        cfg.penalty_citation_mismatch = 1.8;
        let verdict = aggregate_signals(EntailmentVerdict::Supported, 0.9, true, None, &cfg);
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn level_cutoffs_are_inclusive() {
        let cfg = cfg();
        assert_eq!(level_for(0.72, &cfg), ConfidenceLevel::High);
        assert_eq!(level_for(0.7199, &cfg), ConfidenceLevel::Medium);
        assert_eq!(level_for(0.42, &cfg), ConfidenceLevel::Medium);
        assert_eq!(level_for(0.4199, &cfg), ConfidenceLevel::Low);
    }
}
