use thiserror::Error;

#[derive(Error, Debug)]
pub enum SublingoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported language code: {0}")]
    UnsupportedLanguage(String),

    #[error("Rewrite error: {0}")]
    Rewrite(String),

    #[error("Malformed rewrite response: {0}")]
    MalformedResponse(String),

    #[error("Rewrite timed out after {0} seconds")]
    Timeout(u64),

    #[error("Subtitle error: {0}")]
    Subtitle(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, SublingoError>;
