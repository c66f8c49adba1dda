use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors from chunk construction
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Rejected chunk budgets (bounds out of order, zero token cap)
    #[error("Invalid chunk configuration: {0}")]
    InvalidConfig(String),
}
