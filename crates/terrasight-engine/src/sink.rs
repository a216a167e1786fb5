//! Persistence seam for verdict records.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use terrasight_core::DetectionRecord;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record rejected: {0}")]
    Rejected(String),
}

/// Receives the flattened record of each verified verdict. Called from a
/// spawned task; failures are logged by the pipeline and never surface.
#[async_trait]
pub trait VerdictSink: Send + Sync {
    async fn persist(&self, record: DetectionRecord) -> Result<(), SinkError>;
}

/// Appends one JSON object per line to a file.
pub struct JsonLinesSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VerdictSink for JsonLinesSink {
    async fn persist(&self, record: DetectionRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
