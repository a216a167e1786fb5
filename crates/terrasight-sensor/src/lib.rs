//! Sensor layer: where OPTICAL and SAR readings come from.
//!
//! Every source is infallible from the caller's side. Upstream failures are
//! logged and replaced by safe defaults or simulated values, so a scene can
//! always be assembled.

mod error;
pub use error::SensorError;

pub mod sentinel;
pub mod simulated;
pub mod source;

pub use sentinel::{SentinelClient, SentinelConfig};
pub use simulated::{SimulatedProfile, SimulatedSource};
pub use source::{BASELINE_DAYS, SensorSource, collect_scene};
