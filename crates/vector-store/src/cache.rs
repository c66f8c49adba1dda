use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// On-disk cache of computed embeddings, keyed by (provider, text hash).
///
/// Re-analysis of a commit re-chunks everything, but chunks whose text did
/// not change hit the cache and skip the provider round trip.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EmbeddingCache {
    entries: HashMap<String, Vec<f32>>,
    #[serde(skip)]
    path: Option<PathBuf>,
    #[serde(skip)]
    dirty: bool,
}

impl EmbeddingCache {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache from disk; a missing or unreadable file starts empty
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut cache = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data).unwrap_or_else(|e| {
                log::warn!("embedding cache at {} unreadable ({e}), starting empty", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        cache.path = Some(path);
        cache
    }

    fn key(provider_id: &str, text: &str) -> String {
        use std::fmt::Write;
        let digest = Sha256::digest(text.as_bytes());
        let mut key = String::with_capacity(provider_id.len() + 65);
        key.push_str(provider_id);
        key.push(':');
        for b in digest {
            let _ = write!(key, "{b:02x}");
        }
        key
    }

    pub fn get(&self, provider_id: &str, text: &str) -> Option<&Vec<f32>> {
        self.entries.get(&Self::key(provider_id, text))
    }

    pub fn insert(&mut self, provider_id: &str, text: &str, vector: Vec<f32>) {
        self.entries.insert(Self::key(provider_id, text), vector);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write back if anything changed since load
    pub async fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec(self)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        self.dirty = false;
        log::debug!("embedding cache saved: {} entries", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_after_insert() {
        let mut cache = EmbeddingCache::in_memory();
        assert!(cache.get("p", "text").is_none());
        cache.insert("p", "text", vec![1.0, 2.0]);
        assert_eq!(cache.get("p", "text"), Some(&vec![1.0, 2.0]));
        // Different provider misses
        assert!(cache.get("q", "text").is_none());
    }

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = EmbeddingCache::load(&path).await;
        cache.insert("p", "hello", vec![0.5]);
        cache.save().await.unwrap();

        let reloaded = EmbeddingCache::load(&path).await;
        assert_eq!(reloaded.get("p", "hello"), Some(&vec![0.5]));
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let cache = EmbeddingCache::load(dir.path().join("nope.json")).await;
        assert!(cache.is_empty());
    }
}
