use repolens_graph::UnresolvedReference;
use serde::{Deserialize, Serialize};

/// One file the extractor gave up on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub path: String,
    pub reason: String,
}

/// Per-run report of recoverable problems. Parse failures and unresolved
/// references accumulate here instead of aborting the pipeline; the run
/// completes and the caller decides what the numbers mean.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Files handed to the pipeline
    pub total_files: usize,

    /// Files in a language with an extractor
    pub eligible_files: usize,

    /// Eligible files that parsed into symbols
    pub parsed_files: usize,

    /// Files whose unchanged hash let extraction be skipped
    pub reused_files: usize,

    /// Files skipped for lack of an extractor
    pub skipped_files: Vec<String>,

    pub parse_failures: Vec<ParseFailure>,

    pub unresolved_references: Vec<UnresolvedReference>,

    /// Whether the coverage ratio cleared the configured threshold
    pub coverage_ok: bool,
}

impl Diagnostics {
    /// parsed / eligible; an empty repo counts as full coverage
    pub fn coverage_ratio(&self) -> f64 {
        if self.eligible_files == 0 {
            return 1.0;
        }
        self.parsed_files as f64 / self.eligible_files as f64
    }

    pub fn record_parse_failure(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.parse_failures.push(ParseFailure {
            path: path.into(),
            reason: reason.into(),
        });
    }

    /// Evaluate the threshold and remember the verdict
    pub fn finalize(&mut self, threshold: f64) {
        self.coverage_ok = self.coverage_ratio() > threshold || self.eligible_files == 0;
        if !self.coverage_ok {
            log::warn!(
                "parse coverage {:.3} below threshold {:.2} ({} failures)",
                self.coverage_ratio(),
                threshold,
                self.parse_failures.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_ratio() {
        let mut d = Diagnostics::default();
        assert_eq!(d.coverage_ratio(), 1.0);

        d.eligible_files = 20;
        d.parsed_files = 19;
        assert!((d.coverage_ratio() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_finalize_flags_low_coverage() {
        let mut d = Diagnostics {
            eligible_files: 10,
            parsed_files: 9,
            ..Default::default()
        };
        d.finalize(0.95);
        assert!(!d.coverage_ok);

        let mut d = Diagnostics {
            eligible_files: 100,
            parsed_files: 99,
            ..Default::default()
        };
        d.finalize(0.95);
        assert!(d.coverage_ok);
    }
}
