use crate::error::{Result, StoreError};
use crate::index::{DistanceMetric, VectorIndex};
use repolens_chunker::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// A retrieval hit: the chunk plus its similarity score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Immutable index snapshot for one (repo, commit): the vector index plus
/// the chunks it indexes, persisted together so a reload answers queries
/// identically without recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub repo_id: String,
    pub commit: String,
    /// Provider that produced the vectors; a different provider means the
    /// snapshot cannot serve that engine's queries
    pub provider_id: String,
    index: VectorIndex,
    chunks: BTreeMap<String, Chunk>,
}

impl IndexSnapshot {
    pub fn new(
        repo_id: impl Into<String>,
        commit: impl Into<String>,
        provider_id: impl Into<String>,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Self {
        Self {
            repo_id: repo_id.into(),
            commit: commit.into(),
            provider_id: provider_id.into(),
            index: VectorIndex::new(dimension, metric),
            chunks: BTreeMap::new(),
        }
    }

    /// Insert or replace a chunk and its vector
    pub fn upsert(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
        self.index.upsert(chunk.id.clone(), vector)?;
        self.chunks.insert(chunk.id.clone(), chunk);
        Ok(())
    }

    pub fn chunk(&self, id: &str) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Top-k chunks for a query vector, optionally restricted by a chunk
    /// predicate (module scoping)
    pub fn search<F>(&self, query: &[f32], top_k: usize, admit: F) -> Result<Vec<SearchHit>>
    where
        F: Fn(&Chunk) -> bool,
    {
        let scored = self.index.top_k_filtered(query, top_k, |id| {
            self.chunks.get(id).map(&admit).unwrap_or(false)
        })?;
        Ok(scored
            .into_iter()
            .filter_map(|(id, score)| {
                self.chunks.get(&id).map(|chunk| SearchHit {
                    chunk: chunk.clone(),
                    score,
                })
            })
            .collect())
    }

    /// Persist to disk. The write goes to a sibling temp file first and is
    /// renamed into place, so readers only ever observe complete snapshots.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec(self)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, path).await?;
        log::info!(
            "saved index snapshot {}@{} ({} chunks) to {}",
            self.repo_id,
            self.commit,
            self.chunks.len(),
            path.display()
        );
        Ok(())
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        let data = tokio::fs::read(path).await?;
        let snapshot: Self = serde_json::from_slice(&data)?;
        log::info!(
            "loaded index snapshot {}@{} ({} chunks)",
            snapshot.repo_id,
            snapshot.commit,
            snapshot.chunks.len()
        );
        Ok(snapshot)
    }
}

/// Shared handle to the active snapshot. A rebuild produces a fresh
/// snapshot and swaps the `Arc`; readers keep whatever snapshot they
/// already cloned, so queries never observe a half-built index.
pub struct SnapshotHandle {
    inner: RwLock<Arc<IndexSnapshot>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: IndexSnapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Arc<IndexSnapshot> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn swap(&self, snapshot: IndexSnapshot) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use repolens_chunker::Granularity;
    use tempfile::TempDir;

    fn chunk(id: &str, module: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            granularity: Granularity::File,
            module_id: Some(module.to_string()),
            file_path: format!("{id}.py"),
            symbol: None,
            symbol_id: None,
            line_start: Some(1),
            line_end: Some(1),
            text: text.to_string(),
            estimated_tokens: 4,
        }
    }

    fn snapshot() -> IndexSnapshot {
        let mut snap = IndexSnapshot::new("repo", "c0ffee", "hash-fallback", 2, DistanceMetric::Cosine);
        snap.upsert(chunk("a", "core", "alpha"), vec![1.0, 0.0]).unwrap();
        snap.upsert(chunk("b", "core", "beta"), vec![0.8, 0.2]).unwrap();
        snap.upsert(chunk("c", "api", "gamma"), vec![0.0, 1.0]).unwrap();
        snap
    }

    #[test]
    fn test_search_with_module_filter() {
        let snap = snapshot();
        let all = snap.search(&[1.0, 0.0], 10, |_| true).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].chunk.id, "a");

        let scoped = snap
            .search(&[1.0, 0.0], 10, |c| c.module_id.as_deref() == Some("api"))
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].chunk.id, "c");
    }

    #[tokio::test]
    async fn test_save_load_round_trip_identical_results() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        let snap = snapshot();

        let queries: Vec<Vec<f32>> = vec![vec![1.0, 0.0], vec![0.3, 0.7], vec![0.0, 1.0]];
        let before: Vec<Vec<(String, f32)>> = queries
            .iter()
            .map(|q| {
                snap.search(q, 3, |_| true)
                    .unwrap()
                    .into_iter()
                    .map(|h| (h.chunk.id, h.score))
                    .collect()
            })
            .collect();

        snap.save(&path).await.unwrap();
        let loaded = IndexSnapshot::load(&path).await.unwrap();

        let after: Vec<Vec<(String, f32)>> = queries
            .iter()
            .map(|q| {
                loaded
                    .search(q, 3, |_| true)
                    .unwrap()
                    .into_iter()
                    .map(|h| (h.chunk.id, h.score))
                    .collect()
            })
            .collect();

        assert_eq!(before, after);
        assert_eq!(loaded.provider_id, "hash-fallback");
        assert_eq!(loaded.commit, "c0ffee");
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = IndexSnapshot::load(dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_handle_swaps_atomically() {
        let handle = SnapshotHandle::new(snapshot());
        let held = handle.current();
        assert_eq!(held.len(), 3);

        let mut rebuilt = IndexSnapshot::new("repo", "beef", "hash-fallback", 2, DistanceMetric::Cosine);
        rebuilt.upsert(chunk("only", "core", "solo"), vec![1.0, 0.0]).unwrap();
        handle.swap(rebuilt);

        // The old reader still sees its snapshot; new readers see the swap
        assert_eq!(held.len(), 3);
        assert_eq!(handle.current().len(), 1);
        assert_eq!(handle.current().commit, "beef");
    }
}
