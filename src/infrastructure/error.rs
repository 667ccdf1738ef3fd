use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid schedule time: {0}")]
    InvalidTime(String),
    #[error("Mode gateway error: {0}")]
    Gateway(String),
}
