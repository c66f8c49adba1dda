use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusterError>;

#[derive(Error, Debug)]
pub enum ClusterError {
    /// Malformed input makes a deterministic tree impossible; this is the
    /// one fatal clustering failure.
    #[error("Invalid clustering input: {0}")]
    InvalidInput(String),
}

impl ClusterError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
