use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend answered but refused, or sent something unusable
    #[error("API error: {message}")]
    Api { message: String },
}

pub type Result<T> = std::result::Result<T, RegistrarError>;
