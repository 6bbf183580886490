use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid date '{value}': {reason}")]
    Date { value: String, reason: String },

    #[error("Token store error: {message}")]
    TokenStore { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
