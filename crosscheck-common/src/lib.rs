//! Common types and utilities shared across Crosscheck crates.
//!
//! This crate defines configuration, observability helpers, and shared error
//! types used throughout the Crosscheck workspace. It is intentionally
//! lightweight and dependency‑minimal so that all crates can depend on it
//! without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`VerifyConfig`]: Tuned thresholds and penalties for the verification engine
//! - [`ProviderConfig`]: Provider‑agnostic LLM/embedding configuration
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`CrosscheckError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! Constructing a default configuration:
//!
//! ```rust
//! use crosscheck_common::VerifyConfig;
//!
//! let cfg = VerifyConfig::default();
//! assert_eq!(cfg.citation_mismatch_margin, 0.12);
//! assert_eq!(cfg.concurrency, 5);
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Configuration for an LLM/embedding provider used by the engine.
///
/// See the `crosscheck-llm` crate for concrete client implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProviderConfig {
    Ollama {
        base_url: String,
        model: String,
        embed_model: String,
    },
    OpenAi {
        api_key: String,
        model: String,
        embed_model: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    None,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::Ollama {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            embed_model: "nomic-embed-text".to_string(),
        }
    }
}

/// Tuned constants for the verification engine.
///
/// The thresholds and tolerances here were calibrated empirically; they are
/// surfaced as configuration instead of literals so deployments can adjust
/// them without touching the scoring code. The defaults are the calibrated
/// values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Maximum number of claims extracted from one answer.
    pub max_claims_to_verify: usize,
    /// Worker budget for per‑claim verification.
    pub concurrency: usize,
    /// Sentences shorter than this (chars) are not usable as passage material.
    pub min_sentence_len: usize,
    /// Largest sentence window emitted as a single passage.
    pub max_passage_window: usize,
    /// How far the global best similarity must exceed the cited‑source best
    /// before we call the citation mismatched.
    pub citation_mismatch_margin: f32,
    /// Retrieval similarity under this value counts as weak evidence.
    pub low_similarity_threshold: f32,
    /// Absolute tolerance (percentage points) when comparing percentages.
    pub percent_tolerance: f64,
    /// Relative tolerance for all other magnitudes.
    pub ratio_tolerance: f64,
    /// Relative tolerance when matching range endpoints.
    pub range_endpoint_tolerance: f64,
    /// Base confidence per entailment verdict.
    pub base_supported: f64,
    pub base_neutral: f64,
    pub base_contradicted: f64,
    /// Multiplicative penalties. All must stay ≤ 1.0; aggregation clamps
    /// the final score regardless.
    pub penalty_low_similarity: f64,
    pub penalty_citation_mismatch: f64,
    pub penalty_numeric_mismatch: f64,
    /// Confidence level cutoffs.
    pub high_confidence_cutoff: f64,
    pub medium_confidence_cutoff: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            max_claims_to_verify: 10,
            concurrency: 5,
            min_sentence_len: 20,
            max_passage_window: 3,
            citation_mismatch_margin: 0.12,
            low_similarity_threshold: 0.45,
            percent_tolerance: 0.5,
            ratio_tolerance: 0.05,
            range_endpoint_tolerance: 0.10,
            base_supported: 1.0,
            base_neutral: 0.55,
            base_contradicted: 0.15,
            penalty_low_similarity: 0.7,
            penalty_citation_mismatch: 0.85,
            penalty_numeric_mismatch: 0.4,
            high_confidence_cutoff: 0.72,
            medium_confidence_cutoff: 0.42,
        }
    }
}

/// Error types used across the Crosscheck system.
#[derive(thiserror::Error, Debug)]
pub enum CrosscheckError {
    /// An external provider (LLM, embeddings) failed or returned garbage.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Retrieval was asked to run with no passages available.
    #[error("no passages available for retrieval")]
    NoPassages,

    /// Two embedding vectors of different dimensions were compared.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`CrosscheckError`].
pub type Result<T> = std::result::Result<T, CrosscheckError>;
