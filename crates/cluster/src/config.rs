use serde::{Deserialize, Serialize};

/// Tunables for the clustering pass.
///
/// The defaults are starting points, not calibrated truth: changing them
/// changes the shape of the tree, never its determinism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Directory depth at which seed candidates stop splitting
    pub max_depth: usize,

    /// Directories with fewer files merge into their parent seed
    pub min_files_per_dir: usize,

    /// A merge is skipped when the combined file count would exceed this
    pub max_module_size: usize,

    /// Sibling pairs merge while their dependency density exceeds this
    pub merge_density_threshold: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_files_per_dir: 2,
            max_module_size: 40,
            merge_density_threshold: 0.02,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be > 0".to_string());
        }
        if self.max_module_size == 0 {
            return Err("max_module_size must be > 0".to_string());
        }
        if !self.merge_density_threshold.is_finite() || self.merge_density_threshold < 0.0 {
            return Err(format!(
                "merge_density_threshold must be finite and non-negative, got {}",
                self.merge_density_threshold
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ClusterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClusterConfig::default();
        config.max_depth = 0;
        assert!(config.validate().is_err());

        let mut config = ClusterConfig::default();
        config.merge_density_threshold = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ClusterConfig::default();
        config.max_module_size = 0;
        assert!(config.validate().is_err());
    }
}
