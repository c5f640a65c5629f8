#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
