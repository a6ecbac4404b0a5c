use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Length mismatch in {what}: expected {expected}, found {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid fixed-point amount: {0}")]
    InvalidAmount(String),

    #[error("Node index out of range: {index} (total {total})")]
    NodeOutOfRange { index: usize, total: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CredGraphError>;
