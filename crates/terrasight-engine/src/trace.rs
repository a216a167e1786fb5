//! Human-readable cycle trace, separate from `tracing` logs.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Collecting,
    Classifying,
    Resolving,
    Anchoring,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collecting => "COLLECTING",
            Self::Classifying => "CLASSIFYING",
            Self::Resolving => "RESOLVING",
            Self::Anchoring => "ANCHORING",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives one line per state transition and per significant decision.
pub trait TraceSink: Send + Sync {
    fn line(&self, stage: Stage, message: &str);
}

impl<F> TraceSink for F
where
    F: Fn(Stage, &str) + Send + Sync,
{
    fn line(&self, stage: Stage, message: &str) {
        self(stage, message)
    }
}

/// Discards the trace.
pub struct NoTrace;

impl TraceSink for NoTrace {
    fn line(&self, _stage: Stage, _message: &str) {}
}
