//! Orchestrator: one point in, one [`Verdict`](terrasight_core::Verdict) out.
//!
//! A cycle walks COLLECTING → CLASSIFYING → RESOLVING → ANCHORING → DONE
//! exactly once. Detector priority is deforestation, then mining, then
//! generic change resolved against the rule engine.

pub mod pipeline;
pub mod sink;
pub mod trace;

pub use pipeline::Pipeline;
pub use sink::{JsonLinesSink, SinkError, VerdictSink};
pub use trace::{NoTrace, Stage, TraceSink};
