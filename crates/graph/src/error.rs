use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    /// An edge endpoint does not resolve to an entity of this run
    #[error("Dangling edge endpoint: {0}")]
    DanglingEndpoint(String),
}
