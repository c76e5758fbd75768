use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum GripError {
    #[error("force source error: {0}")]
    Source(String),
    #[error("force source closed: {0}")]
    SourceClosed(String),
    #[error("force source timeout")]
    Timeout,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("assessment {0} not found")]
    NotFound(uuid::Uuid),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

impl GripError {
    /// True when the force source will never produce another reading.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GripError::SourceClosed(_))
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
