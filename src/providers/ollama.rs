//! Ollama provider implementation using the `/api/generate` API.

use serde::{Deserialize, Serialize};

use super::{check_http_response, CompletionProvider, ProviderError};
use crate::config::GenerationConfig;

/// Default Ollama API base URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Stop sequences cutting generation off at the next speaker label.
pub const STOP_SEQUENCES: &[&str] = &[
    "Doctor:",
    "Patient:",
    "**Doctor**:",
    "**Patient**:",
    "\nDoctor:",
    "\nPatient:",
];

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Ollama generate API request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    /// Model name.
    pub model: String,
    /// Fully formatted prompt.
    pub prompt: String,
    /// Disable streaming; one response body per request.
    pub stream: bool,
    /// Generation options.
    pub options: GenerateOptions,
}

/// Ollama generation options.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GenerateOptions {
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling cutoff.
    pub top_p: f64,
    /// Repetition penalty.
    pub repeat_penalty: f64,
    /// Context window size in tokens.
    pub num_ctx: u32,
    /// Stop sequences.
    pub stop: Vec<String>,
    /// Maximum tokens to generate.
    pub num_predict: u32,
}

/// Ollama generate API response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    /// Generated completion text.
    pub response: String,
}

/// Ollama `/api/tags` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    /// Installed models.
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

/// One installed model entry from `/api/tags`.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ModelTag {
    /// Model name, e.g. `"virtual-patient:latest"`.
    pub name: String,
}

/// Ollama `/api/version` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    /// Server version string.
    #[serde(default)]
    pub version: String,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Ollama generate API provider.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// Model name passed to Ollama.
    #[doc(hidden)]
    pub model: String,
    /// Base URL for the Ollama API.
    #[doc(hidden)]
    pub base_url: String,
    generation: GenerationConfig,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create an Ollama provider for a model with the given sampling options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: &str,
        model: &str,
        generation: GenerationConfig,
        timeout: std::time::Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            model: model.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            generation,
            client,
        })
    }

    /// Ask the Ollama server for its version string.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the server is unreachable or the response
    /// does not parse.
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url).send().await?;
        let payload = check_http_response(response).await?;
        let parsed: VersionResponse =
            serde_json::from_str(&payload).map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(parsed.version)
    }

    /// List the model names installed on the Ollama server.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the server is unreachable or the response
    /// does not parse.
    pub async fn installed_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;
        let payload = check_http_response(response).await?;
        let parsed: TagsResponse =
            serde_json::from_str(&payload).map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build an Ollama generate request body.
#[doc(hidden)]
pub fn build_request(model: &str, prompt: &str, generation: &GenerationConfig) -> GenerateRequest {
    GenerateRequest {
        model: model.to_owned(),
        prompt: prompt.to_owned(),
        stream: false,
        options: GenerateOptions {
            temperature: generation.temperature,
            top_p: generation.top_p,
            repeat_penalty: generation.repeat_penalty,
            num_ctx: generation.num_ctx,
            stop: STOP_SEQUENCES.iter().map(|s| (*s).to_owned()).collect(),
            num_predict: generation.num_predict,
        },
    }
}

/// Parse an Ollama generate response into the completion text.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the response cannot be deserialized.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, ProviderError> {
    let resp: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(resp.response)
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_request = build_request(&self.model, prompt, &self.generation);

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    async fn is_available(&self) -> bool {
        self.version().await.is_ok()
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
