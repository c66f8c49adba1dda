use crate::error::{Result, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Embedding capability. Injected into the pipeline and the answer engine;
/// both must use the same provider for a given index.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier recorded in snapshots so a reload can detect mismatches
    fn id(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Deterministic hash-based fallback embedder.
///
/// Same text always maps to the same unit vector, so the system functions
/// with no external embedding service configured — at reduced retrieval
/// quality, since similar texts do not get similar vectors.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub const DEFAULT_DIMENSION: usize = 384;

    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn id(&self) -> &str {
        "hash-fallback"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let digest = Sha256::digest(text.as_bytes());
        let mut seed = u64::from_be_bytes(digest[..8].try_into().unwrap_or([0u8; 8]));

        let mut vector: Vec<f32> = (0..self.dimension)
            .map(|_| {
                let x = splitmix64(&mut seed);
                // Map the top 53 bits to [-1, 1)
                ((x >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0) as f32
            })
            .collect();

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Connection settings for an OpenAI-compatible embeddings endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEmbedderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    pub dimension: usize,
    pub timeout_s: u64,
    /// In-flight request cap toward the provider
    pub max_concurrency: usize,
}

/// Remote embedder speaking the OpenAI `/embeddings` wire format.
///
/// Calls are individually bounded by the configured timeout and by a
/// semaphore limiting in-flight requests toward the provider.
pub struct RemoteEmbedder {
    config: RemoteEmbedderConfig,
    client: reqwest::Client,
    limiter: Arc<Semaphore>,
    id: String,
}

impl RemoteEmbedder {
    /// Texts sent per request
    const BATCH_SIZE: usize = 64;

    pub fn new(config: RemoteEmbedderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_s))
            .build()
            .map_err(|e| StoreError::provider(format!("http client: {e}")))?;
        let limiter = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        let id = format!("remote:{}", config.model_name);
        Ok(Self {
            config,
            client,
            limiter,
            id,
        })
    }

    /// `/embeddings` URL, avoiding duplicate version segments when the
    /// base URL already carries one
    fn embeddings_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let last = base.rsplit('/').next().unwrap_or("");
        if last.starts_with('v') && last[1..].chars().all(|c| c.is_ascii_digit()) && last.len() > 1
        {
            format!("{base}/embeddings")
        } else {
            format!("{base}/v1/embeddings")
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| StoreError::provider("embedding limiter closed"))?;

        let payload = serde_json::json!({
            "model": self.config.model_name,
            "input": texts,
        });
        let response = self
            .client
            .post(self.embeddings_url())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StoreError::provider(format!("embeddings request: {e}")))?;

        if !response.status().is_success() {
            return Err(StoreError::provider(format!(
                "embeddings request failed with status {}",
                response.status()
            )));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::provider(format!("embeddings response: {e}")))?;

        let vectors: Vec<Vec<f32>> = body.data.into_iter().map(|d| d.embedding).collect();
        if vectors.len() != texts.len() {
            return Err(StoreError::provider(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        for vector in &vectors {
            if vector.len() != self.config.dimension {
                return Err(StoreError::InvalidDimension {
                    expected: self.config.dimension,
                    actual: vector.len(),
                });
            }
        }
        Ok(vectors)
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| StoreError::provider("empty embeddings response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(Self::BATCH_SIZE) {
            out.extend(self.request(batch).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("fn main() {}").await.unwrap();
        let b = embedder.embed("fn main() {}").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), HashEmbedder::DEFAULT_DIMENSION);
    }

    #[tokio::test]
    async fn test_hash_embedder_distinct_texts() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("alpha").await.unwrap();
        let b = embedder.embed("beta").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_hash_embedder_unit_norm() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("normalize me").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = HashEmbedder::default();
        let batch = embedder
            .embed_batch(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert_eq!(batch[0], embedder.embed("one").await.unwrap());
        assert_eq!(batch[1], embedder.embed("two").await.unwrap());
    }

    #[test]
    fn test_embeddings_url_building() {
        let make = |base: &str| {
            RemoteEmbedder::new(RemoteEmbedderConfig {
                base_url: base.to_string(),
                api_key: "k".into(),
                model_name: "m".into(),
                dimension: 4,
                timeout_s: 5,
                max_concurrency: 2,
            })
            .unwrap()
            .embeddings_url()
        };
        assert_eq!(make("https://api.host.com"), "https://api.host.com/v1/embeddings");
        assert_eq!(make("https://api.host.com/v1"), "https://api.host.com/v1/embeddings");
        assert_eq!(make("https://api.host.com/v4/"), "https://api.host.com/v4/embeddings");
    }
}
