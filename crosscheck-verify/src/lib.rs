//! Fact-checking engine for synthesized research answers.
//!
//! Given an answer and the sources it was built from, the engine extracts
//! discrete factual claims, retrieves the best supporting passage for each,
//! cross-checks entailment and numeric consistency, and folds the signals
//! into a calibrated confidence per claim and overall.
//!
//! The external capabilities (batch embeddings, claim extraction, and
//! entailment classification) come in through the `crosscheck-llm` traits,
//! so production providers and deterministic test fakes are
//! interchangeable.
//!
//! # Examples
//! ```no_run
//! use crosscheck_common::{ProviderConfig, VerifyConfig};
//! use crosscheck_llm::providers_from_config;
//! use crosscheck_verify::{Source, Verifier};
//!
//! # async fn demo() -> crosscheck_common::Result<()> {
//! let providers = providers_from_config(&ProviderConfig::default()).await?;
//! let verifier = Verifier::new(providers.llm, providers.embeddings, VerifyConfig::default());
//!
//! let sources = vec![Source {
//!     id: "s1".into(),
//!     title: "Quarterly report".into(),
//!     url: "https://example.com/q3".into(),
//!     snippet: "Revenue grew 18.5% year over year to $96.8 billion.".into(),
//!     published_date: None,
//! }];
//!
//! // Evidence can be prepared early, while the answer is still streaming.
//! let bundle = verifier.prepare_evidence(&sources).await?;
//! let output = verifier
//!     .verify_claims("Revenue grew 18.5% [1].", &sources, 10, 5, Some(bundle))
//!     .await?;
//! println!("{}", output.overall_confidence);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod chunk;
pub mod entail;
pub mod numeric;
pub mod orchestrate;
pub mod retrieve;
pub mod types;

pub use crosscheck_llm::traits::{EntailmentJudgment, EntailmentVerdict};
pub use orchestrate::Verifier;
pub use types::{
    AggregatedVerdict, ConfidenceLevel, EvidenceBundle, ExtractedClaim, NumericCheck, Passage,
    RetrievalResult, Source, VerificationOutput, VerificationSummary, VerifiedClaim,
};
