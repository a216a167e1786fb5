use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("ruleset file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("io error reading ruleset: {0}")]
    Io(#[from] std::io::Error),

    #[error("ruleset is not a valid feature collection: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("zone {name}: {reason}")]
    InvalidZone { name: String, reason: String },
}
