use crate::traits::{EmbeddingClient, LlmClient, LlmResponse};
use async_trait::async_trait;
use crosscheck_common::{CrosscheckError, Result};
use crosscheck_http::{HttpClient, HttpError};
use serde::{Deserialize, Serialize};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
    embed_model: String,
}

#[derive(Serialize)]
pub struct ResponsesApiRequest {
    model: String,
    input: String,
    instructions: String,
}

#[derive(Debug, Deserialize)]
pub struct ResponsesApiResponse {
    pub id: String,
    pub status: String,
    pub model: String,
    #[serde(default)]
    pub output: Vec<ResponseMessage>,
}

/// One element in the `output` array
#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<ResponseContent>,
}

/// One part of the message `content`
#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiClient {
    /// Create a new client for the given API key and models.
    pub fn new(api_key: String, model: String, embed_model: String) -> Result<Self> {
        Self::with_base_url(api_key, model, embed_model, OPENAI_API_BASE)
    }

    /// Point the client at an OpenAI-compatible gateway.
    pub fn with_base_url(
        api_key: String,
        model: String,
        embed_model: String,
        base_url: &str,
    ) -> Result<Self> {
        let client = HttpClient::new(base_url)
            .map_err(|e| CrosscheckError::Provider(format!("HttpClient init failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            embed_model,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let instructions = match system_prompt {
            Some(s) => s.to_string(),
            None => "You are an objective, unbiased fact-checking assistant.".to_string(),
        };

        let req = ResponsesApiRequest {
            model: self.model.clone(),
            input: prompt.to_string(),
            instructions,
        };

        let resp: ResponsesApiResponse = self
            .client
            .post_json("responses", Some(&self.api_key), &req)
            .await
            .map_err(http_to_crosscheck)?;

        let text = resp
            .output
            .iter()
            .flat_map(|msg| &msg.content)
            .find(|c| c.kind == "output_text")
            .map(|c| c.text.clone())
            .unwrap_or_default();

        Ok(LlmResponse {
            text,
            model: Some(resp.model),
            tokens_used: None,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        // Simple health check by trying to generate a minimal response
        let test_prompt = "Respond with just 'OK'";

        match self.generate(test_prompt, None, Some(5), Some(0.1)).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("OpenAi health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let req = EmbeddingsRequest {
            model: &self.embed_model,
            input: texts,
        };

        let resp: EmbeddingsResponse = self
            .client
            .post_json("embeddings", Some(&self.api_key), &req)
            .await
            .map_err(http_to_crosscheck)?;

        if resp.data.len() != texts.len() {
            return Err(CrosscheckError::Provider(format!(
                "embedding count mismatch: sent {}, got {}",
                texts.len(),
                resp.data.len()
            )));
        }

        // The API tags rows with their input index; order on it rather than
        // trusting response order.
        let mut rows = resp.data;
        rows.sort_by_key(|r| r.index);
        Ok(rows.into_iter().map(|r| r.embedding).collect())
    }

    fn embed_model_name(&self) -> &str {
        &self.embed_model
    }
}

fn http_to_crosscheck(e: HttpError) -> CrosscheckError {
    CrosscheckError::Provider(format!("{e}"))
}
