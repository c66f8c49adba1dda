//! # Repolens Chunker
//!
//! Turns analysis state into bounded retrieval units at three
//! granularities:
//!
//! - **Symbol** — one chunk per class/function/method, sliced by the
//!   symbol's declaration line range.
//! - **File** — the whole file, split at top-level declaration boundaries
//!   when it exceeds the token budget.
//! - **Module** — a deterministic summary of a module's files and key
//!   symbols.
//!
//! Every chunk carries enough metadata (module, path, symbol, line range)
//! to rebuild a [`Citation`] without touching the analysis again. Splits
//! happen at declaration or line boundaries, never mid-token.

mod builder;
mod config;
mod error;
mod types;

pub use builder::{ChunkBuilder, FileContent};
pub use config::ChunkConfig;
pub use error::{ChunkerError, Result};
pub use types::{estimate_tokens, Chunk, Citation, Granularity};
