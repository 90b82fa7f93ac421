//! The verification run: claims in, ordered `VerifiedClaim`s out.
//!
//! Claim verification fans out across a fixed worker budget. Workers drain a
//! shared atomic index counter and each writes `(index, result)` pairs that
//! are scattered into pre-sized slots after the join barrier, so output
//! order always equals input order no matter how completions interleave.
//! A claim that fails mid-pipeline degrades to a zero-confidence record
//! instead of aborting its siblings.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use crosscheck_common::{CrosscheckError, Result, VerifyConfig};
use crosscheck_llm::traits::{EmbeddingClient, EntailmentVerdict, LlmClient};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::aggregate::aggregate_signals;
use crate::chunk::chunk_sources_into_passages;
use crate::entail::check_entailment;
use crate::numeric::{check_numeric_consistency, extract_numbers};
use crate::retrieve::retrieve_evidence;
use crate::types::{
    ConfidenceLevel, EvidenceBundle, ExtractedClaim, Source, VerificationOutput,
    VerificationSummary, VerifiedClaim,
};

const NO_SOURCES_ISSUE: &str = "No sources available for verification";
const SYSTEM_ERROR_ISSUE: &str = "System error during verification";

/// The verification engine. Holds the injected capability providers and the
/// tuned configuration; a single instance serves many runs.
pub struct Verifier {
    llm: Arc<dyn LlmClient>,
    embeddings: Arc<dyn EmbeddingClient>,
    config: Arc<VerifyConfig>,
}

impl Verifier {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        embeddings: Arc<dyn EmbeddingClient>,
        config: VerifyConfig,
    ) -> Self {
        Self {
            llm,
            embeddings,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Chunk the sources and embed every passage in one batched call.
    ///
    /// This is deliberately separable from [`Verifier::verify_claims`]: a
    /// caller can start it while the answer is still streaming and await
    /// the bundle later, overlapping the two slow operations.
    pub async fn prepare_evidence(&self, sources: &[Source]) -> Result<EvidenceBundle> {
        let passages = chunk_sources_into_passages(sources, &self.config);
        tracing::debug!(
            sources = sources.len(),
            passages = passages.len(),
            "chunked sources"
        );
        if passages.is_empty() {
            return Ok(EvidenceBundle::default());
        }

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let embeddings = self.embeddings.embed(&texts).await?;
        if embeddings.len() != passages.len() {
            return Err(CrosscheckError::Provider(format!(
                "passage embedding count mismatch: {} passages, {} vectors",
                passages.len(),
                embeddings.len()
            )));
        }

        Ok(EvidenceBundle {
            passages,
            embeddings,
        })
    }

    /// Verify the claims in `answer` against `sources`.
    ///
    /// At most `max_claims` are extracted; per-claim verification runs under
    /// a budget of `concurrency` workers. `precomputed` short-circuits the
    /// chunk+embed step when an earlier pipeline stage already produced the
    /// bundle. The returned claims preserve extraction order.
    pub async fn verify_claims(
        &self,
        answer: &str,
        sources: &[Source],
        max_claims: usize,
        concurrency: usize,
        precomputed: Option<EvidenceBundle>,
    ) -> Result<VerificationOutput> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();

        let claims = self.extract_claims(answer, max_claims, sources.len()).await?;
        tracing::info!(%run_id, claims = claims.len(), "extracted claims");
        if claims.is_empty() {
            return Ok(assemble_output(run_id, started_at, Vec::new(), started));
        }

        let bundle = match precomputed {
            Some(bundle) => bundle,
            None => self.prepare_evidence(sources).await?,
        };

        if bundle.is_empty() {
            // Verification cannot silently pass claims it has no evidence
            // for; emit an explicitly degraded record per claim.
            tracing::warn!(%run_id, "no passages available, degrading all claims");
            let verified = claims.into_iter().map(no_evidence_claim).collect();
            return Ok(assemble_output(run_id, started_at, verified, started));
        }

        let claim_texts: Vec<String> = claims.iter().map(|c| c.text.clone()).collect();
        let claim_embeddings = self.embeddings.embed(&claim_texts).await?;
        if claim_embeddings.len() != claims.len() {
            return Err(CrosscheckError::Provider(format!(
                "claim embedding count mismatch: {} claims, {} vectors",
                claims.len(),
                claim_embeddings.len()
            )));
        }

        let total = claims.len();
        let claims = Arc::new(claims);
        let claim_embeddings = Arc::new(claim_embeddings);
        let bundle = Arc::new(bundle);
        let next_index = Arc::new(AtomicUsize::new(0));
        let workers = concurrency.max(1).min(total);

        let mut pool: JoinSet<Vec<(usize, VerifiedClaim)>> = JoinSet::new();
        for worker in 0..workers {
            let claims = Arc::clone(&claims);
            let claim_embeddings = Arc::clone(&claim_embeddings);
            let bundle = Arc::clone(&bundle);
            let next_index = Arc::clone(&next_index);
            let llm = Arc::clone(&self.llm);
            let config = Arc::clone(&self.config);

            pool.spawn(async move {
                let mut produced = Vec::new();
                loop {
                    let i = next_index.fetch_add(1, Ordering::SeqCst);
                    if i >= total {
                        break;
                    }
                    let claim = &claims[i];
                    tracing::debug!(worker, claim = %claim.id, "verifying claim");
                    let verified = match verify_one(
                        llm.as_ref(),
                        &config,
                        claim,
                        &claim_embeddings[i],
                        &bundle,
                    )
                    .await
                    {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::error!(claim = %claim.id, error = %e, "claim verification failed");
                            degraded_claim(claim.clone())
                        }
                    };
                    produced.push((i, verified));
                }
                produced
            });
        }

        let mut slots: Vec<Option<VerifiedClaim>> = (0..total).map(|_| None).collect();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(pairs) => {
                    for (i, verified) in pairs {
                        slots[i] = Some(verified);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "verification worker died");
                }
            }
        }

        // A dead worker leaves holes; degrade those claims rather than
        // aborting the run.
        let verified: Vec<VerifiedClaim> = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.unwrap_or_else(|| degraded_claim(claims[i].clone())))
            .collect();

        Ok(assemble_output(run_id, started_at, verified, started))
    }

    /// Normalize the extraction provider's best-effort output: drop blank
    /// claims, discard citation numbers that point outside the source list,
    /// cap the count, and re-number ids `c1..cN`.
    async fn extract_claims(
        &self,
        answer: &str,
        max_claims: usize,
        source_count: usize,
    ) -> Result<Vec<ExtractedClaim>> {
        if answer.trim().is_empty() || max_claims == 0 {
            return Ok(Vec::new());
        }

        let raw = self.llm.extract_claims(answer, max_claims).await?;

        let mut claims = Vec::new();
        for candidate in raw {
            let text = candidate.text.trim();
            if text.is_empty() {
                continue;
            }
            let mut cited: Vec<usize> = candidate
                .cited_sources
                .into_iter()
                .filter(|&n| n >= 1 && n <= source_count)
                .collect();
            cited.sort_unstable();
            cited.dedup();

            claims.push(ExtractedClaim {
                id: format!("c{}", claims.len() + 1),
                text: text.to_string(),
                cited_sources: cited,
            });
            if claims.len() == max_claims {
                break;
            }
        }
        Ok(claims)
    }
}

/// Run one claim through retrieval, entailment, and the numeric check.
async fn verify_one(
    llm: &dyn LlmClient,
    cfg: &VerifyConfig,
    claim: &ExtractedClaim,
    claim_embedding: &[f32],
    bundle: &EvidenceBundle,
) -> Result<VerifiedClaim> {
    let retrieval = retrieve_evidence(
        claim_embedding,
        &bundle.passages,
        &bundle.embeddings,
        &claim.cited_sources,
        cfg,
    )?;

    let judgment = check_entailment(llm, &claim.text, &retrieval.best_passage.text).await;

    let claim_numbers = extract_numbers(&claim.text);
    let numeric_check = if claim_numbers.is_empty() {
        None
    } else {
        let evidence_numbers = extract_numbers(&retrieval.best_passage.text);
        Some(check_numeric_consistency(
            &claim_numbers,
            &evidence_numbers,
            cfg,
        ))
    };

    let aggregated = aggregate_signals(
        judgment.verdict,
        retrieval.global_best_support,
        retrieval.citation_mismatch,
        numeric_check.as_ref(),
        cfg,
    );

    Ok(VerifiedClaim {
        claim: claim.clone(),
        evidence: Some(retrieval),
        entailment: judgment.verdict,
        entailment_reasoning: judgment.reasoning,
        numeric_check,
        confidence: aggregated.confidence,
        confidence_level: aggregated.confidence_level,
        issues: aggregated.issues,
    })
}

fn no_evidence_claim(claim: ExtractedClaim) -> VerifiedClaim {
    VerifiedClaim {
        claim,
        evidence: None,
        entailment: EntailmentVerdict::Neutral,
        entailment_reasoning: NO_SOURCES_ISSUE.to_string(),
        numeric_check: None,
        confidence: 0.0,
        confidence_level: ConfidenceLevel::Low,
        issues: vec![NO_SOURCES_ISSUE.to_string()],
    }
}

fn degraded_claim(claim: ExtractedClaim) -> VerifiedClaim {
    VerifiedClaim {
        claim,
        evidence: None,
        entailment: EntailmentVerdict::Neutral,
        entailment_reasoning: SYSTEM_ERROR_ISSUE.to_string(),
        numeric_check: None,
        confidence: 0.0,
        confidence_level: ConfidenceLevel::Low,
        issues: vec![SYSTEM_ERROR_ISSUE.to_string()],
    }
}

fn assemble_output(
    run_id: Uuid,
    started_at: chrono::DateTime<Utc>,
    claims: Vec<VerifiedClaim>,
    started: Instant,
) -> VerificationOutput {
    let mut summary = VerificationSummary::default();
    for claim in &claims {
        match claim.entailment {
            EntailmentVerdict::Supported => summary.supported += 1,
            EntailmentVerdict::Contradicted => summary.contradicted += 1,
            EntailmentVerdict::Neutral => summary.neutral += 1,
        }
        if claim.evidence.as_ref().is_some_and(|e| e.citation_mismatch) {
            summary.citation_mismatches += 1;
        }
        if claim.numeric_check.as_ref().is_some_and(|n| !n.is_match) {
            summary.numeric_mismatches += 1;
        }
    }

    let overall_confidence = if claims.is_empty() {
        0
    } else {
        let mean = claims.iter().map(|c| c.confidence).sum::<f64>() / claims.len() as f64;
        (mean * 100.0).round() as u32
    };

    let output = VerificationOutput {
        run_id,
        started_at,
        claims,
        overall_confidence,
        summary,
        duration_ms: started.elapsed().as_millis() as u64,
    };
    tracing::info!(
        %run_id,
        claims = output.claims.len(),
        overall_confidence,
        duration_ms = output.duration_ms,
        "verification run complete"
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::level_for;

    fn claim(id: &str, confidence: f64, verdict: EntailmentVerdict) -> VerifiedClaim {
        VerifiedClaim {
            claim: ExtractedClaim {
                id: id.to_string(),
                text: "t".to_string(),
                cited_sources: vec![],
            },
            evidence: None,
            entailment: verdict,
            entailment_reasoning: String::new(),
            numeric_check: None,
            confidence,
            confidence_level: level_for(confidence, &VerifyConfig::default()),
            issues: vec![],
        }
    }

    #[test]
    fn overall_confidence_is_rounded_mean_percent() {
        let claims = vec![
            claim("c1", 1.0, EntailmentVerdict::Supported),
            claim("c2", 0.55, EntailmentVerdict::Neutral),
            claim("c3", 0.15, EntailmentVerdict::Contradicted),
        ];
        let out = assemble_output(Uuid::new_v4(), Utc::now(), claims, Instant::now());
        // mean = 0.5666... -> 57
        assert_eq!(out.overall_confidence, 57);
        assert_eq!(out.summary.supported, 1);
        assert_eq!(out.summary.neutral, 1);
        assert_eq!(out.summary.contradicted, 1);
    }

    #[test]
    fn empty_run_scores_zero() {
        let out = assemble_output(Uuid::new_v4(), Utc::now(), Vec::new(), Instant::now());
        assert_eq!(out.overall_confidence, 0);
        assert!(out.claims.is_empty());
        assert_eq!(out.summary.supported, 0);
    }
}
