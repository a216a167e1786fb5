//! Evidence anchoring.
//!
//! Every confirmed violation is serialised, hashed, and, when a ledger is
//! configured, committed as a self-addressed zero-value transaction. The
//! local digest is always produced, so anchoring cannot fail a cycle.

mod error;
pub use error::AnchorError;

pub mod ledger;
pub mod service;

pub use ledger::{DEFAULT_RPC_METHOD, LedgerClient, LedgerConfig};
pub use service::{Evidence, EvidenceAnchor, seal};
