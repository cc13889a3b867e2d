//! LLM Client — unified interface for Ollama and OpenAI-compatible backends.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use hearth_core::config::LlmConfig;

use crate::error::LlmError;
use crate::model::LanguageModel;
use crate::types::{LlmRequest, LlmResponse};

/// Provider backend for LLM inference.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Ollama running locally (recommended).
    Ollama { base_url: String },
    /// OpenAI-compatible API (also works with Together, OpenRouter, etc.).
    OpenAiCompatible { base_url: String, api_key: String },
    /// No LLM available; all calls return `Unavailable`.
    None,
}

/// The main LLM client that routes requests to the configured backend.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_retries,
        }
    }

    /// Create a client with no LLM backend.
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), 0)
    }

    /// Build a client from the `[llm]` configuration section.
    ///
    /// # Errors
    /// Returns `LlmError::ConfigError` for an unknown provider name.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let provider = match config.provider.to_ascii_lowercase().as_str() {
            "ollama" => LlmProvider::Ollama { base_url },
            "openai" | "openai_compatible" => LlmProvider::OpenAiCompatible {
                base_url,
                api_key: config.api_key.clone(),
            },
            "none" | "" => LlmProvider::None,
            other => {
                return Err(LlmError::ConfigError(format!("unknown LLM provider '{other}'")));
            }
        };
        Ok(Self::new(provider, config.model.clone(), config.max_retries))
    }

    /// Generate a response from the LLM.
    ///
    /// # Errors
    /// Returns `Err` if the LLM is unavailable or all transport retries fail.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let model = request.model.as_deref().unwrap_or(self.model.as_str());
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => {
                let body = json!({
                    "model": model,
                    "system": request.system,
                    "prompt": request.user,
                    "stream": false,
                    "options": {
                        "temperature": request.temperature,
                        "num_predict": request.max_tokens,
                    }
                });
                let url = format!("{base_url}/api/generate");
                let (json, latency_ms) = self.post("Ollama", &url, None, &body, request).await?;
                Ok(LlmResponse {
                    text: json["response"].as_str().unwrap_or_default().to_string(),
                    tokens_generated: token_count(&json["eval_count"]),
                    latency_ms,
                    model: model.to_string(),
                })
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let body = json!({
                    "model": model,
                    "messages": [
                        { "role": "system", "content": request.system },
                        { "role": "user", "content": request.user },
                    ],
                    "max_tokens": request.max_tokens,
                    "temperature": request.temperature,
                });
                let url = format!("{base_url}/v1/chat/completions");
                let (json, latency_ms) =
                    self.post("OpenAI", &url, Some(api_key), &body, request).await?;
                Ok(LlmResponse {
                    text: json["choices"][0]["message"]["content"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                    tokens_generated: token_count(&json["usage"]["completion_tokens"]),
                    latency_ms,
                    model: model.to_string(),
                })
            }
        }
    }

    /// POST `body` with transport-level retries, returning the parsed JSON
    /// body and the latency of the successful attempt.
    async fn post(
        &self,
        backend: &str,
        url: &str,
        api_key: Option<&str>,
        body: &Value,
        request: &LlmRequest,
    ) -> Result<(Value, u64), LlmError> {
        let mut last_error = LlmError::Unavailable(format!("{backend} was never called"));
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!("Retrying {backend} call (attempt {}/{})", attempt + 1, self.max_retries + 1);
            }

            let mut builder = self
                .http
                .post(url)
                .json(body)
                .timeout(Duration::from_millis(request.timeout_ms));
            if let Some(key) = api_key {
                builder = builder.bearer_auth(key);
            }

            let start = Instant::now();
            let result = builder.send().await;
            let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let json: Value = resp.json().await.map_err(|e| {
                        if e.is_decode() {
                            LlmError::ParseError(e.to_string())
                        } else {
                            LlmError::from_transport(&e, request.timeout_ms)
                        }
                    })?;
                    return Ok((json, latency_ms));
                }
                Ok(resp) => {
                    last_error = LlmError::RequestFailed(format!(
                        "HTTP {}: {}",
                        resp.status(),
                        resp.text().await.unwrap_or_default()
                    ));
                    warn!("{backend} returned error: {last_error}");
                }
                Err(e) => {
                    last_error = LlmError::from_transport(&e, request.timeout_ms);
                    warn!("{backend} request failed: {last_error}");
                }
            }
        }

        // A backend that never answers in time is reported as such.
        Err(match last_error {
            timeout @ LlmError::Timeout(_) => timeout,
            other => LlmError::RetriesExhausted {
                attempts: self.max_retries + 1,
                last_error: other.to_string(),
            },
        })
    }

    /// Check if the LLM client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }
}

impl LanguageModel for LlmClient {
    fn complete(
        &self,
        request: &LlmRequest,
    ) -> impl Future<Output = Result<LlmResponse, LlmError>> + Send {
        self.generate(request)
    }
}

fn token_count(value: &Value) -> u32 {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}
