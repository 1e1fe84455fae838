use super::{GenerationOptions, Oracle};
use crate::error::LoreError;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3-8B-Instruct";
pub const TOKEN_VARS: [&str; 2] = ["HF_API_TOKEN", "HUGGINGFACE_API_KEY"];

const ENDPOINT_BASE: &str = "https://api-inference.huggingface.co/models";
const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Hugging Face Inference API client.
pub struct HttpOracle {
    client: Client,
    endpoint: String,
    token: String,
    /// Wait after a 503 while the model is loading.
    loading_wait: Duration,
    /// Wait after a timeout or any other failed attempt.
    retry_wait: Duration,
}

impl HttpOracle {
    pub fn new(model: &str, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(LoreError::OracleMisconfigured("empty API token".to_string()).into());
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{ENDPOINT_BASE}/{model}"),
            token,
            loading_wait: Duration::from_secs(20),
            retry_wait: Duration::from_secs(5),
        })
    }

    /// Reads the token from `HF_API_TOKEN`, then `HUGGINGFACE_API_KEY`.
    pub fn from_env(model: &str) -> Result<Self> {
        let token = TOKEN_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| {
                LoreError::OracleMisconfigured(format!(
                    "{} not set. Get a token from https://huggingface.co/settings/tokens",
                    TOKEN_VARS.join(" or ")
                ))
            })?;
        Self::new(model, token)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_waits(mut self, loading_wait: Duration, retry_wait: Duration) -> Self {
        self.loading_wait = loading_wait;
        self.retry_wait = retry_wait;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, payload: &Value) -> Result<Attempt> {
        let response = match self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Ok(Attempt::TimedOut),
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(Attempt::Loading);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LoreError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let data: Value = response.json().await?;
        Ok(Attempt::Done(extract_generated_text(&data)))
    }
}

enum Attempt {
    Done(String),
    Loading,
    TimedOut,
}

pub fn build_payload(prompt: &str, options: GenerationOptions) -> Value {
    json!({
        "inputs": prompt,
        "parameters": {
            "max_new_tokens": options.max_new_tokens,
            "temperature": options.temperature,
            "return_full_text": false
        }
    })
}

/// `[0].generated_text` trimmed, or the raw JSON when the shape is unexpected.
pub fn extract_generated_text(data: &Value) -> String {
    data.get(0)
        .and_then(|first| first.get("generated_text"))
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .unwrap_or_else(|| data.to_string())
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String> {
        let payload = build_payload(prompt, options);

        for attempt in 1..=MAX_ATTEMPTS {
            debug!(
                "POST {} (attempt {}/{}, max_new_tokens {})",
                self.endpoint, attempt, MAX_ATTEMPTS, options.max_new_tokens
            );
            match self.post(&payload).await {
                Ok(Attempt::Done(text)) => return Ok(text),
                Ok(Attempt::Loading) => {
                    warn!("Model loading, retrying in {:?}...", self.loading_wait);
                    tokio::time::sleep(self.loading_wait).await;
                }
                Ok(Attempt::TimedOut) => {
                    warn!("Request timeout, retrying in {:?}...", self.retry_wait);
                    tokio::time::sleep(self.retry_wait).await;
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!("Inference error: {:#}, retrying in {:?}...", e, self.retry_wait);
                    tokio::time::sleep(self.retry_wait).await;
                }
                Err(e) => return Err(e),
            }
        }

        anyhow::bail!("Max retries exceeded after {} attempts", MAX_ATTEMPTS)
    }
}
