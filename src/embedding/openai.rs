//! OpenAI API-based text embedder implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::embedding::embedder::TextEmbedder;
use crate::error::{Result, SiftError};

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Per-request timeout. An unbounded hang here would stall every
/// classification that depends on the provider.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry attempts for rate-limit and server errors.
const MAX_ATTEMPTS: u32 = 3;

/// Backoff before the first retry; doubles per attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Request structure for the OpenAI Embeddings API.
#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    /// Model identifier to use for embeddings.
    model: String,
    /// Input texts to embed (batch).
    input: Vec<String>,
}

/// Response structure from the OpenAI Embeddings API.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    /// List of embedding data objects.
    data: Vec<EmbeddingData>,
}

/// Individual embedding data from an API response.
#[derive(Debug, Deserialize)]
struct EmbeddingData {
    /// The embedding vector.
    embedding: Vec<f32>,
}

/// OpenAI API-based embedder.
///
/// Requires an API key and internet connection. Rate-limit (429) and
/// server (5xx) responses are retried with doubling backoff; other API
/// errors surface immediately with the response body for audit.
pub struct OpenAiEmbedder {
    /// HTTP client for making API requests.
    client: Client,
    /// OpenAI API key for authentication.
    api_key: String,
    /// Model name (e.g., "text-embedding-3-small").
    model: String,
    /// Dimension of the output embeddings.
    dimension: usize,
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl OpenAiEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SiftError::embedding(format!("Failed to build HTTP client: {e}")))?;

        let dimension = Self::default_dimension(&model);

        Ok(Self {
            client,
            api_key,
            model,
            dimension,
        })
    }

    /// Get the default dimension for a given model.
    fn default_dimension(model: &str) -> usize {
        match model {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536, // fallback
        }
    }

    /// Issue one embeddings request, retrying 429/5xx with backoff.
    async fn request_embeddings(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let expected = inputs.len();
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: inputs,
        };

        let mut backoff = INITIAL_BACKOFF;
        for attempt in 1..=MAX_ATTEMPTS {
            let outcome = self
                .client
                .post(EMBEDDINGS_URL)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&request)
                .send()
                .await;

            let retryable = match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Self::parse_response(response, expected).await;
                    }
                    let body = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        format!("status {status}: {body}")
                    } else {
                        return Err(SiftError::embedding(format!(
                            "OpenAI API error (status {status}): {body}"
                        )));
                    }
                }
                Err(e) => format!("request failed: {e}"),
            };

            if attempt == MAX_ATTEMPTS {
                return Err(SiftError::embedding(format!(
                    "OpenAI API unavailable after {MAX_ATTEMPTS} attempts: {retryable}"
                )));
            }
            log::warn!("embedding attempt {attempt}/{MAX_ATTEMPTS} failed ({retryable}), retrying");
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }

        unreachable!("retry loop returns on the final attempt")
    }

    async fn parse_response(
        response: reqwest::Response,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>> {
        let response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| SiftError::embedding(format!("Failed to parse OpenAI response: {e}")))?;

        let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        if vectors.len() != expected {
            return Err(SiftError::embedding(format!(
                "OpenAI returned {} embeddings for {expected} inputs",
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl TextEmbedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request_embeddings(vec![text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| SiftError::embedding("No embedding in response"))
    }

    /// Batched embedding in a single API request; output order matches
    /// input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let inputs = texts.iter().map(|s| s.to_string()).collect();
        self.request_embeddings(inputs).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}
