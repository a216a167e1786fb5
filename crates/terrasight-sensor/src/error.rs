use thiserror::Error;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token response carried no access_token")]
    MissingToken,
}
