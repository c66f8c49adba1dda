use repolens_chunker::ChunkConfig;
use repolens_cluster::ClusterConfig;
use repolens_vector_store::DistanceMetric;
use serde::{Deserialize, Serialize};

/// Settings for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub cluster: ClusterConfig,
    pub chunks: ChunkConfig,
    pub metric: DistanceMetric,

    /// parsed / eligible files must exceed this for a healthy run;
    /// falling below is reported, not fatal
    pub coverage_threshold: f64,

    /// Chunk texts sent to the embedding provider per batch
    pub embed_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            chunks: ChunkConfig::default(),
            metric: DistanceMetric::Cosine,
            coverage_threshold: 0.95,
            embed_batch_size: 32,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.cluster.validate()?;
        self.chunks.validate()?;
        if !(0.0..=1.0).contains(&self.coverage_threshold) {
            return Err(format!(
                "coverage_threshold must be within [0, 1], got {}",
                self.coverage_threshold
            ));
        }
        if self.embed_batch_size == 0 {
            return Err("embed_batch_size must be > 0".to_string());
        }
        Ok(())
    }
}

/// Settings for retrieval and answer assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Hits scoring below this never become evidence
    pub relevance_floor: f32,

    /// Evidence chunks when the caller does not say
    pub default_max_evidence: usize,

    /// Retries after the first failed provider attempt
    pub max_retries: u32,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            relevance_floor: 0.10,
            default_max_evidence: 8,
            max_retries: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_coverage_threshold_bounds() {
        let mut config = PipelineConfig::default();
        config.coverage_threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
