use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scoring function for nearest-neighbor queries. Higher is closer for
/// every variant (euclidean scores are negated distances).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Dot,
    Euclidean,
}

impl DistanceMetric {
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::Dot => dot(a, b),
            Self::Euclidean => {
                let dist: f32 = a
                    .iter()
                    .zip(b.iter())
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum::<f32>()
                    .sqrt();
                -dist
            }
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

/// Exhaustive-scan vector index keyed by chunk ID.
///
/// Ties in score break on chunk ID, so a fixed query over fixed content
/// always returns the same ranking — including after a save/load cycle,
/// since the backing map is ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    dimension: usize,
    metric: DistanceMetric,
    vectors: BTreeMap<String, Vec<f32>>,
}

impl VectorIndex {
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            dimension,
            metric,
            vectors: BTreeMap::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Insert or replace the vector for a chunk ID
    pub fn upsert(&mut self, id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(StoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.insert(id.into(), vector);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.vectors.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vectors.contains_key(id)
    }

    /// Top-k nearest chunks as (id, score), best first
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        self.top_k_filtered(query, k, |_| true)
    }

    /// Top-k restricted to IDs accepted by `admit`
    pub fn top_k_filtered(
        &self,
        query: &[f32],
        k: usize,
        admit: impl Fn(&str) -> bool,
    ) -> Result<Vec<(String, f32)>> {
        if query.len() != self.dimension {
            return Err(StoreError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(String, f32)> = self
            .vectors
            .iter()
            .filter(|(id, _)| admit(id))
            .map(|(id, vector)| (id.clone(), self.metric.score(query, vector)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.vectors.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_upsert_and_top_k() {
        let mut index = VectorIndex::new(3, DistanceMetric::Cosine);
        index.upsert("a", vec![1.0, 0.0, 0.0]).unwrap();
        index.upsert("b", vec![0.9, 0.1, 0.0]).unwrap();
        index.upsert("c", vec![0.0, 1.0, 0.0]).unwrap();

        let results = index.top_k(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "a");
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(results[1].0, "b");
    }

    #[test]
    fn test_upsert_replaces() {
        let mut index = VectorIndex::new(2, DistanceMetric::Cosine);
        index.upsert("a", vec![1.0, 0.0]).unwrap();
        index.upsert("a", vec![0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 1);

        let results = index.top_k(&[0.0, 1.0], 1).unwrap();
        assert!((results[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = VectorIndex::new(3, DistanceMetric::Cosine);
        assert!(index.upsert("a", vec![1.0]).is_err());
        index.upsert("a", vec![1.0, 0.0, 0.0]).unwrap();
        assert!(index.top_k(&[1.0], 1).is_err());
    }

    #[test]
    fn test_tie_breaks_on_id() {
        let mut index = VectorIndex::new(2, DistanceMetric::Cosine);
        index.upsert("b", vec![1.0, 0.0]).unwrap();
        index.upsert("a", vec![1.0, 0.0]).unwrap();
        let results = index.top_k(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].0, "a");
        assert_eq!(results[1].0, "b");
    }

    #[test]
    fn test_filtered_query() {
        let mut index = VectorIndex::new(2, DistanceMetric::Cosine);
        index.upsert("keep", vec![1.0, 0.0]).unwrap();
        index.upsert("skip", vec![1.0, 0.0]).unwrap();
        let results = index
            .top_k_filtered(&[1.0, 0.0], 5, |id| id == "keep")
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "keep");
    }

    #[test]
    fn test_euclidean_metric_orders_by_distance() {
        let mut index = VectorIndex::new(2, DistanceMetric::Euclidean);
        index.upsert("near", vec![0.1, 0.0]).unwrap();
        index.upsert("far", vec![5.0, 5.0]).unwrap();
        let results = index.top_k(&[0.0, 0.0], 2).unwrap();
        assert_eq!(results[0].0, "near");
    }
}
