//! # Repolens Vector Store
//!
//! Embedding providers, the nearest-neighbor index, and snapshot
//! persistence.
//!
//! ## Architecture
//!
//! ```text
//! Chunk[]
//!     │
//!     ├──> EmbeddingProvider (remote OpenAI-compatible, or the
//!     │    deterministic hash fallback)
//!     │      └─> Vec<f32>, cached by (provider, text hash)
//!     │
//!     ├──> VectorIndex
//!     │      └─> top-k with configurable metric, ID tie-breaks
//!     │
//!     └──> IndexSnapshot (per repo + commit)
//!            └─> JSON on disk, temp-file + rename, Arc-swapped handle
//! ```
//!
//! Reloading a persisted snapshot answers a fixed query set identically
//! to the snapshot that was saved.

mod cache;
mod error;
mod index;
mod provider;
mod snapshot;

pub use cache::EmbeddingCache;
pub use error::{Result, StoreError};
pub use index::{cosine_similarity, DistanceMetric, VectorIndex};
pub use provider::{EmbeddingProvider, HashEmbedder, RemoteEmbedder, RemoteEmbedderConfig};
pub use snapshot::{IndexSnapshot, SearchHit, SnapshotHandle};
