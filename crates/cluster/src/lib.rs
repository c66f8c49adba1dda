//! # Repolens Cluster
//!
//! Deterministic module clustering over (files, dependency edges).
//!
//! The partition starts from directory structure and is refined by
//! dependency density:
//!
//! 1. **Seed** — one candidate per directory down to a configured depth;
//!    directories below a minimum file count fold into their parent.
//! 2. **Score** — pairwise sibling density = cross-edges / (|a| × |b|),
//!    evaluated in path order.
//! 3. **Merge** — the densest pair under the size cap merges bottom-up
//!    until no pair exceeds the threshold; merged groups become parents.
//! 4. **Attach** — surviving roots hang off their nearest prefix ancestor.
//!
//! For a fixed input the output is byte-for-byte identical across runs,
//! and every input file lands in exactly one module.

mod config;
mod engine;
mod error;
mod types;

pub use config::ClusterConfig;
pub use engine::ClusterEngine;
pub use error::{ClusterError, Result};
pub use types::{Module, ModuleNode, ModuleStats, ModuleTree};
