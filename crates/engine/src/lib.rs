//! # Repolens Engine
//!
//! The analysis pipeline and the query surface over its output.
//!
//! ## Pipeline
//!
//! ```text
//! IngestedFile[] ──> extract (bounded fan-out, per-file cancellation)
//!                      │  re-sorted by path before aggregation
//!                      ├──> SymbolTable          (deterministic)
//!                      ├──> DependencyGraph      (deterministic)
//!                      ├──> ModuleTree           (deterministic, 100% coverage enforced)
//!                      └──> chunks ──> embed (batched, cached) ──> IndexSnapshot
//! ```
//!
//! Recoverable problems (parse failures, unresolved references) land in
//! the per-run [`Diagnostics`] report; structural invariant violations
//! abort before indexing.
//!
//! ## Query surface
//!
//! [`AnalysisSnapshot`] answers the structural queries (summary, modules,
//! dependency graph); [`QueryEngine`] adds semantic search and the
//! citation-constrained answer endpoint, which fails with typed
//! `NoEvidence` / `ProviderUnavailable` errors rather than guessing.

mod config;
mod diagnostics;
mod error;
mod generation;
mod pipeline;
mod query;
mod snapshot;

pub use config::{AnswerConfig, PipelineConfig};
pub use diagnostics::{Diagnostics, ParseFailure};
pub use error::{EngineError, Result};
pub use generation::{GenerationProvider, HttpGenerationProvider, ModelConfig};
pub use pipeline::{
    AnalysisCaches, AnalysisInput, AnalysisPipeline, ExtractionCache, IngestedFile,
};
pub use query::{AnswerEvent, AnswerStream, QueryEngine};
pub use snapshot::{
    AnalysisSnapshot, AnalysisState, Answer, ModuleDetail, RepoSummary, SearchResult,
};

// Re-export the capability traits and shared types callers wire together
pub use repolens_chunker::{Chunk, ChunkConfig, Citation, Granularity};
pub use repolens_cluster::{ClusterConfig, Module, ModuleNode, ModuleTree};
pub use repolens_extractor::{Language, Repository, SourceFile, Symbol, SymbolKind};
pub use repolens_graph::{DependencyEdge, EdgeEndpoint, EdgeType, GraphView};
pub use repolens_vector_store::{
    DistanceMetric, EmbeddingProvider, HashEmbedder, IndexSnapshot, RemoteEmbedder,
    RemoteEmbedderConfig, SnapshotHandle,
};
