use thiserror::Error;

/// Everything that can go wrong while crawling. Browser driver errors arrive
/// as `anyhow::Error` and pass through transparently.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Browser(#[from] anyhow::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("expected content did not materialize: {0}")]
    MissingContent(String),
}
