use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Retrieval produced nothing above the relevance floor; the caller
    /// gets a typed "insufficient information" instead of a guess
    #[error("No evidence found for the query")]
    NoEvidence,

    /// The generation or embedding provider could not be reached within
    /// its budget. Retryable by the caller; never silently degraded.
    #[error("Provider unavailable: {detail}")]
    ProviderUnavailable { detail: String },

    /// Run-level cancellation was observed at a checkpoint
    #[error("Analysis canceled")]
    Canceled,

    /// A structural invariant broke (e.g. a file left without a module);
    /// fatal before indexing, since downstream guarantees would silently
    /// not hold
    #[error("Coverage invariant violated: {0}")]
    Coverage(String),

    #[error(transparent)]
    Cluster(#[from] repolens_cluster::ClusterError),

    #[error(transparent)]
    Chunker(#[from] repolens_chunker::ChunkerError),

    #[error(transparent)]
    Store(#[from] repolens_vector_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn provider_unavailable(detail: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            detail: detail.into(),
        }
    }

    pub fn coverage(msg: impl Into<String>) -> Self {
        Self::Coverage(msg.into())
    }
}
