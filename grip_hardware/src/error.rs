use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("force source timeout")]
    Timeout,
    #[error("force source exhausted")]
    Exhausted,
    #[error("force source closed: {0}")]
    Closed(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
