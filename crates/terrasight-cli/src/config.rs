//! Command-line and environment configuration for the library crates.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use terrasight_anchor::{DEFAULT_RPC_METHOD, EvidenceAnchor, LedgerConfig};
use terrasight_governance::RuleBook;
use terrasight_sensor::sentinel::DEFAULT_BASE_URL;
use terrasight_sensor::{SensorSource, SentinelClient, SentinelConfig, SimulatedSource};
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SentinelArgs {
    #[arg(long, env = "SENTINEL_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,
    #[arg(long, env = "SENTINEL_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
    #[arg(long, env = "SENTINEL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub sentinel_url: String,
    /// Sentinel Hub request timeout in seconds.
    #[arg(long, default_value_t = 20)]
    pub sentinel_timeout: u64,
}

impl SentinelArgs {
    pub fn config(&self) -> SentinelConfig {
        SentinelConfig {
            base_url: self.sentinel_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            timeout: Duration::from_secs(self.sentinel_timeout),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    #[arg(long, env = "LEDGER_RPC_URL")]
    pub ledger_url: Option<String>,
    /// Hex-encoded 32-byte Ed25519 seed.
    #[arg(long, env = "LEDGER_SIGNING_KEY", hide_env_values = true)]
    pub signing_key: Option<String>,
    #[arg(long, env = "LEDGER_RPC_METHOD", default_value = DEFAULT_RPC_METHOD)]
    pub ledger_method: String,
    /// Ledger request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub ledger_timeout: u64,
}

impl LedgerArgs {
    /// `None` unless both the URL and the signing key are set.
    pub fn config(&self) -> Option<LedgerConfig> {
        let (url, key) = (self.ledger_url.as_ref()?, self.signing_key.as_ref()?);
        let mut config = LedgerConfig::new(url.clone(), key.clone());
        config.method = self.ledger_method.clone();
        config.timeout = Duration::from_secs(self.ledger_timeout);
        Some(config)
    }

    pub fn anchor(&self) -> anyhow::Result<EvidenceAnchor> {
        EvidenceAnchor::from_config(self.config()).context("configuring ledger client")
    }
}

/// Built-in zones unless a GeoJSON file is given.
pub fn load_rules(path: Option<&PathBuf>) -> anyhow::Result<RuleBook> {
    match path {
        Some(path) => RuleBook::load(path)
            .with_context(|| format!("loading protected-zone ruleset from {}", path.display())),
        None => RuleBook::builtin().context("parsing built-in protected-zone ruleset"),
    }
}

pub fn sensor_source(simulate: bool, seed: Option<u64>, sentinel: &SentinelArgs) -> anyhow::Result<Arc<dyn SensorSource>> {
    if simulate {
        let seed = seed.unwrap_or_else(|| chrono::Utc::now().timestamp_millis() as u64);
        info!(seed, "using demo simulation source");
        return Ok(Arc::new(SimulatedSource::demo(seed)));
    }
    let client = SentinelClient::new(sentinel.config()).context("building Sentinel Hub client")?;
    Ok(Arc::new(client))
}
