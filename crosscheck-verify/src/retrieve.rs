//! Evidence retrieval: rank passages against a claim embedding.
//!
//! Beyond the single best passage, retrieval separates "best match among
//! cited sources" from "best match globally". When the answer cited source
//! X but the strongest evidence lives in uncited source Y, the draft answer
//! under-cited or mis-cited, and the aggregator penalizes that signal.

use crate::types::{Passage, RetrievalResult};
use crosscheck_common::{CrosscheckError, Result, VerifyConfig};

/// Cosine similarity between two equal-length vectors. A zero-norm vector
/// yields 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank every passage against the claim embedding and report the best
/// match, the best cited-source match, and whether the two disagree enough
/// to flag a citation mismatch.
///
/// Preconditions (programming errors, not degraded outputs): at least one
/// passage, embeddings aligned 1:1 with passages, and every embedding the
/// same dimension as the claim's.
pub fn retrieve_evidence(
    claim_embedding: &[f32],
    passages: &[Passage],
    passage_embeddings: &[Vec<f32>],
    cited_source_indices: &[usize],
    cfg: &VerifyConfig,
) -> Result<RetrievalResult> {
    if passages.is_empty() || passages.len() != passage_embeddings.len() {
        return Err(CrosscheckError::NoPassages);
    }
    for embedding in passage_embeddings {
        if embedding.len() != claim_embedding.len() {
            return Err(CrosscheckError::DimensionMismatch {
                expected: claim_embedding.len(),
                got: embedding.len(),
            });
        }
    }

    let mut best_index = 0usize;
    let mut global_best = f32::MIN;
    let mut cited_best: Option<f32> = None;

    for (i, embedding) in passage_embeddings.iter().enumerate() {
        let similarity = cosine_similarity(claim_embedding, embedding);
        if similarity > global_best {
            global_best = similarity;
            best_index = i;
        }
        if cited_source_indices.contains(&passages[i].source_index) {
            cited_best = Some(cited_best.map_or(similarity, |c: f32| c.max(similarity)));
        }
    }

    let cited_source_support = cited_best.unwrap_or(0.0);
    let best_passage = passages[best_index].clone();

    let citation_mismatch = !cited_source_indices.is_empty()
        && global_best - cited_source_support > cfg.citation_mismatch_margin
        && !cited_source_indices.contains(&best_passage.source_index);

    tracing::trace!(
        global_best,
        cited_source_support,
        citation_mismatch,
        best_source = best_passage.source_index,
        "retrieval scored"
    );

    Ok(RetrievalResult {
        best_passage,
        global_best_support: global_best,
        cited_source_support,
        citation_mismatch,
    })
}
