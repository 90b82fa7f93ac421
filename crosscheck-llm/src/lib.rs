//! Provider‑agnostic LLM and embedding integration for Crosscheck.
//!
//! This crate exposes the capability traits the verification engine is
//! written against: [`traits::LlmClient`] for generation (claim extraction,
//! entailment classification) and [`traits::EmbeddingClient`] for batch text
//! embeddings. It also provides concrete provider implementations for
//! OpenAI and Ollama, and a convenience function that builds both
//! capabilities from a [`crosscheck_common::ProviderConfig`].
//!
//! # Examples
//! ```no_run
//! use crosscheck_common::{ProviderConfig, Result};
//! use crosscheck_llm::providers_from_config;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let cfg = ProviderConfig::default();
//! let providers = providers_from_config(&cfg).await?;
//! assert!(!providers.llm.model_name().is_empty());
//! # Ok(())
//! # }
//! ```
pub mod ollama;
pub mod openai;
pub mod traits;

use crosscheck_common::{CrosscheckError, ProviderConfig};
use ollama::OllamaClient;
use openai::OpenAiClient;
use std::sync::Arc;
use traits::{EmbeddingClient, LlmClient};

/// Default model recommendations for verification tasks
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_OLLAMA_EMBED_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_EMBED_MODEL: &str = "text-embedding-3-small";

/// The two capability handles the verification engine needs.
#[derive(Clone)]
pub struct Providers {
    pub llm: Arc<dyn LlmClient>,
    pub embeddings: Arc<dyn EmbeddingClient>,
}

/// Build provider clients from configuration (probing local servers where
/// the provider requires it).
pub async fn providers_from_config(
    config: &ProviderConfig,
) -> crosscheck_common::Result<Providers> {
    match config {
        ProviderConfig::Ollama {
            base_url,
            model,
            embed_model,
        } => {
            let client = Arc::new(
                OllamaClient::new(base_url.clone(), model.clone(), embed_model.clone()).await?,
            );
            Ok(Providers {
                llm: client.clone(),
                embeddings: client,
            })
        }
        ProviderConfig::OpenAi {
            api_key,
            model,
            embed_model,
            base_url,
        } => {
            let client = match base_url {
                Some(base) => Arc::new(OpenAiClient::with_base_url(
                    api_key.clone(),
                    model.clone(),
                    embed_model.clone(),
                    base,
                )?),
                None => Arc::new(OpenAiClient::new(
                    api_key.clone(),
                    model.clone(),
                    embed_model.clone(),
                )?),
            };
            Ok(Providers {
                llm: client.clone(),
                embeddings: client,
            })
        }
        ProviderConfig::None => Err(CrosscheckError::Config(
            "No provider configured".to_string(),
        )),
    }
}
