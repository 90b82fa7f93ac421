use crate::traits::{EmbeddingClient, LlmClient, LlmResponse};
use async_trait::async_trait;
use crosscheck_common::{CrosscheckError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

/// Ollama client for local model inference and embeddings.
///
/// Expects a running Ollama server (see https://github.com/ollama/ollama).
/// Construction probes the server and pulls missing models, so a ready
/// client is a usable client.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    embed_model: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

impl OllamaClient {
    /// Create a new client and verify server/model availability.
    pub async fn new(base_url: String, model: String, embed_model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                CrosscheckError::Provider(format!("Failed to create HTTP client: {}", e))
            })?;

        let ollama = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            embed_model,
        };

        let local_models = ollama.list_local_models().await?;
        for wanted in [&ollama.model, &ollama.embed_model] {
            if !local_models.iter().any(|m| m == wanted) {
                tracing::info!("Model {} not found locally, pulling...", wanted);
                ollama.pull_model(wanted).await?;
            }
        }

        Ok(ollama)
    }

    /// Server probe doubling as model inventory.
    async fn list_local_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| CrosscheckError::Provider(OLLAMA_CONNECTION_ERROR.to_string()))?;

        if !resp.status().is_success() {
            return Err(CrosscheckError::Provider(OLLAMA_CONNECTION_ERROR.to_string()));
        }

        let tags: TagsResponse = resp.json().await.map_err(|e| {
            CrosscheckError::Provider(format!("Failed to parse models response: {}", e))
        })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        let url = format!("{}/api/pull", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&PullRequest {
                model,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| CrosscheckError::Provider(format!("Failed to pull model: {}", e)))?;

        if !resp.status().is_success() {
            return Err(CrosscheckError::Provider(format!(
                "Failed to pull model: HTTP {}",
                resp.status()
            )));
        }
        tracing::info!("Successfully pulled model: {}", model);
        Ok(())
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", self.base_url);

        // Ollama's plain generate endpoint takes one prompt string, so the
        // system prompt is folded in chat-transcript style.
        let full_prompt = match system_prompt {
            Some(sys) => format!("{}\n\nUser: {}\n\nAssistant:", sys, prompt),
            None => prompt.to_string(),
        };

        let request = GenerateRequest {
            model: &self.model,
            prompt: full_prompt,
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CrosscheckError::Provider(format!("Generate request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(CrosscheckError::Provider(format!(
                "Generate failed: HTTP {}",
                resp.status()
            )));
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| CrosscheckError::Provider(format!("Failed to parse response: {}", e)))?;

        Ok(LlmResponse {
            text: body.response,
            model: Some(self.model.clone()),
            tokens_used: body.eval_count,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.list_local_models().await.is_ok())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingClient for OllamaClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.embed_model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| CrosscheckError::Provider(format!("Embed request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(CrosscheckError::Provider(format!(
                "Embed failed: HTTP {}",
                resp.status()
            )));
        }

        let body: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| CrosscheckError::Provider(format!("Failed to parse response: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(CrosscheckError::Provider(format!(
                "embedding count mismatch: sent {}, got {}",
                texts.len(),
                body.embeddings.len()
            )));
        }

        Ok(body.embeddings)
    }

    fn embed_model_name(&self) -> &str {
        &self.embed_model
    }
}
