use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream error ({status}): {body}")]
    Upstream {
        status: reqwest::StatusCode,
        body: String,
        request_id: Option<String>,
    },
    #[error("invalid upstream response: {body}")]
    InvalidUpstreamResponse { body: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
