use crate::error::{EngineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Connection settings for an OpenAI-compatible chat endpoint, supplied by
/// the caller per request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    pub timeout_s: u64,
    pub max_tokens: u32,
}

/// Text-generation capability consumed by the answer engine. Failures are
/// surfaced as `ProviderUnavailable`; the engine never fabricates output.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn complete(&self, system: &str, user: &str, config: &ModelConfig) -> Result<String>;

    /// Stream completion text as incremental segments into `tx`. The
    /// default falls back to one segment from `complete`.
    async fn complete_stream(
        &self,
        system: &str,
        user: &str,
        config: &ModelConfig,
        tx: mpsc::Sender<String>,
    ) -> Result<()> {
        let text = self.complete(system, user, config).await?;
        let _ = tx.send(text).await;
        Ok(())
    }
}

/// HTTP provider speaking the OpenAI `/chat/completions` wire format.
///
/// Transient failures (429, 5xx) are retried a bounded number of times
/// with exponential backoff before `ProviderUnavailable` reaches the
/// caller with enough detail to retry externally.
pub struct HttpGenerationProvider {
    client: reqwest::Client,
    max_retries: u32,
}

const BASE_BACKOFF_SECS: u64 = 1;

impl HttpGenerationProvider {
    pub fn new(max_retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| EngineError::provider_unavailable(format!("http client: {e}")))?;
        Ok(Self {
            client,
            max_retries,
        })
    }

    /// `/chat/completions` URL, avoiding duplicate version segments
    fn chat_url(base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let last = base.rsplit('/').next().unwrap_or("");
        if last.starts_with('v') && last.len() > 1 && last[1..].chars().all(|c| c.is_ascii_digit())
        {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }

    fn payload(system: &str, user: &str, config: &ModelConfig, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": config.model_name,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": config.max_tokens,
            "stream": stream,
        })
    }

    async fn send(
        &self,
        config: &ModelConfig,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        let url = Self::chat_url(&config.base_url);
        for attempt in 0..=self.max_retries {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&config.api_key)
                .timeout(Duration::from_secs(config.timeout_s))
                .json(body)
                .send()
                .await;

            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let retryable = status.as_u16() == 429 || status.is_server_error();
                    if !retryable || attempt == self.max_retries {
                        return Err(EngineError::provider_unavailable(format!(
                            "generation endpoint returned {status}"
                        )));
                    }
                    let delay = retry_delay(&response, attempt);
                    log::warn!(
                        "generation endpoint returned {status}, retrying in {}s ({}/{})",
                        delay.as_secs(),
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if attempt == self.max_retries => {
                    return Err(EngineError::provider_unavailable(format!(
                        "generation request failed: {e}"
                    )));
                }
                Err(e) => {
                    let delay = Duration::from_secs(BASE_BACKOFF_SECS << attempt);
                    log::warn!(
                        "generation request failed ({e}), retrying in {}s ({}/{})",
                        delay.as_secs(),
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Err(EngineError::provider_unavailable("retries exhausted"))
    }
}

/// Honor `Retry-After` when present, else exponential backoff
fn retry_delay(response: &reqwest::Response, attempt: u32) -> Duration {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(BASE_BACKOFF_SECS << attempt))
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl GenerationProvider for HttpGenerationProvider {
    async fn complete(&self, system: &str, user: &str, config: &ModelConfig) -> Result<String> {
        let body = Self::payload(system, user, config, false);
        let response = self.send(config, &body).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::provider_unavailable(format!("malformed response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EngineError::provider_unavailable("response carried no choices"))
    }

    async fn complete_stream(
        &self,
        system: &str,
        user: &str,
        config: &ModelConfig,
        tx: mpsc::Sender<String>,
    ) -> Result<()> {
        let body = Self::payload(system, user, config, true);
        let mut response = self.send(config, &body).await?;

        // Server-sent events: "data: {json}\n\n" frames, "[DONE]" sentinel
        let mut buffer = String::new();
        loop {
            let chunk = response
                .chunk()
                .await
                .map_err(|e| EngineError::provider_unavailable(format!("stream read: {e}")))?;
            let Some(bytes) = chunk else {
                break;
            };
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim().to_string();
                buffer.drain(..=pos);

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data == "[DONE]" {
                    return Ok(());
                }
                let Ok(frame) = serde_json::from_str::<StreamChunk>(data) else {
                    continue;
                };
                for choice in frame.choices {
                    if let Some(content) = choice.delta.content {
                        if !content.is_empty() && tx.send(content).await.is_err() {
                            // Receiver dropped: the caller canceled
                            return Ok(());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
