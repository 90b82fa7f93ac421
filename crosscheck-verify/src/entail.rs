//! Entailment checking against the external NLI provider.

use crosscheck_llm::traits::{EntailmentJudgment, EntailmentVerdict, LlmClient};

/// Judge one claim/evidence pair.
///
/// Provider failures degrade to NEUTRAL instead of propagating: one flaky
/// NLI call must not take down the sibling claims in a run.
pub async fn check_entailment(
    llm: &dyn LlmClient,
    claim: &str,
    evidence: &str,
) -> EntailmentJudgment {
    match llm.classify_entailment(claim, evidence).await {
        Ok(judgment) => judgment,
        Err(e) => {
            tracing::warn!(error = %e, "entailment provider failed, degrading to NEUTRAL");
            EntailmentJudgment {
                verdict: EntailmentVerdict::Neutral,
                reasoning: "NLI check failed".to_string(),
            }
        }
    }
}
