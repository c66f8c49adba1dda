use serde::{Deserialize, Serialize};

/// Budgets for chunk construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Hard token cap per chunk; oversized units split at declaration or
    /// line boundaries, never mid-token
    pub max_chunk_tokens: usize,

    /// Chunks below this are dropped as noise
    pub min_chunk_tokens: usize,

    /// Symbols listed per file in a module summary chunk
    pub module_summary_symbols: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: 512,
            min_chunk_tokens: 4,
            module_summary_symbols: 12,
        }
    }
}

impl ChunkConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_tokens == 0 {
            return Err("max_chunk_tokens must be > 0".to_string());
        }
        if self.min_chunk_tokens > self.max_chunk_tokens {
            return Err(format!(
                "min_chunk_tokens ({}) cannot exceed max_chunk_tokens ({})",
                self.min_chunk_tokens, self.max_chunk_tokens
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert!(ChunkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_bounds() {
        let mut config = ChunkConfig::default();
        config.max_chunk_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = ChunkConfig::default();
        config.min_chunk_tokens = config.max_chunk_tokens + 1;
        assert!(config.validate().is_err());
    }
}
