use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnchorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ledger returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("ledger RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("ledger response carried no transaction id")]
    MissingResult,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}
