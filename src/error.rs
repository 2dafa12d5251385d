use thiserror::Error;

/// Failure reported by a data source. Only the message reaches the screen.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http {status}: {body}")]
    Status { status: u16, body: String },

    #[error("api error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not configured: {0}")]
    Config(String),

    #[error("{0}")]
    Unavailable(String),
}

impl FetchError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
