//! # Repolens Graph
//!
//! Dependency-graph construction over extraction output.
//!
//! Two passes, both failure-tolerant:
//!
//! 1. **File-level** — import statements resolve to files in the analyzed
//!    set via language-specific path probing; third-party imports are
//!    recorded as unresolved, not materialized.
//! 2. **Symbol-level** — call/inherit/use references resolve against the
//!    symbol table's candidate index with a deterministic tie-break
//!    (same file, then same directory, then lexicographically first ID).
//!    Cross-file symbol edges are additionally lifted to file edges.
//!
//! The graph is petgraph-backed with side indexes for file and symbol
//! lookup; `view()` yields a deterministically ordered projection.

mod builder;
mod error;
mod graph;
mod resolve;
mod types;

pub use builder::{GraphBuildOutput, GraphBuilder};
pub use error::{GraphError, Result};
pub use graph::{DependencyGraph, EdgeData};
pub use resolve::resolve_import;
pub use types::{
    DependencyEdge, EdgeEndpoint, EdgeType, GraphNode, GraphView, NodeKind, UnresolvedReference,
};
