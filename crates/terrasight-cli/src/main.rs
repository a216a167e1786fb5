mod config;
mod display;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use terrasight_anchor::Evidence;
use terrasight_core::GeoPoint;
use terrasight_engine::{JsonLinesSink, Pipeline, Stage};
use terrasight_governance::legal_notice;
use tracing_subscriber::EnvFilter;

use crate::config::{LedgerArgs, SentinelArgs, load_rules, sensor_source};

#[derive(Parser, Debug)]
#[command(name = "terrasight", version, about = "Satellite change detection and environmental-law resolution")]
struct Cli {
    /// Default log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Protected-zone GeoJSON; the built-in dataset when omitted.
    #[arg(long, global = true, env = "TERRASIGHT_RULESET")]
    ruleset: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one detection cycle for a point and print the verdict.
    Evaluate {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Jurisdiction code, e.g. DELHI or UP.
        #[arg(long)]
        jurisdiction: Option<String>,
        /// Use the randomised demo source instead of Sentinel Hub.
        #[arg(long)]
        simulate: bool,
        /// Seed for --simulate.
        #[arg(long, requires = "simulate")]
        seed: Option<u64>,
        /// Append verified records to this JSON-lines file.
        #[arg(long, env = "TERRASIGHT_RECORDS")]
        record: Option<PathBuf>,
        /// Print a card instead of JSON.
        #[arg(long)]
        card: bool,
        #[command(flatten)]
        sentinel: SentinelArgs,
        #[command(flatten)]
        ledger: LedgerArgs,
    },
    /// Resolve a point against the rule engine only.
    Check {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long)]
        jurisdiction: Option<String>,
        #[arg(long)]
        card: bool,
    },
    /// List the loaded protected zones.
    Zones,
    /// Fingerprint ad-hoc evidence and anchor it.
    Anchor {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long)]
        violation: String,
        #[arg(long)]
        confidence: f64,
        #[arg(long, default_value = "MANUAL")]
        source: String,
        #[command(flatten)]
        ledger: LedgerArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("terrasight v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Evaluate {
            lat,
            lng,
            jurisdiction,
            simulate,
            seed,
            record,
            card,
            sentinel,
            ledger,
        } => {
            let rules = load_rules(cli.ruleset.as_ref())?;
            let source = sensor_source(simulate, seed, &sentinel)?;
            let anchor = ledger.anchor()?;
            let mut pipeline = Pipeline::new(source, Arc::new(rules), Arc::new(anchor));
            if let Some(path) = record {
                pipeline = pipeline.with_sink(Arc::new(JsonLinesSink::new(path)));
            }

            let trace = |stage: Stage, msg: &str| eprintln!("[{stage}] {msg}");
            let verdict = pipeline
                .evaluate_traced(lat, lng, jurisdiction.as_deref(), &trace)
                .await;
            pipeline.flush().await;

            if card {
                print!("{}", display::verdict_card(&verdict));
            } else {
                println!("{}", serde_json::to_string_pretty(&verdict)?);
            }
        }
        Command::Check {
            lat,
            lng,
            jurisdiction,
            card,
        } => {
            let point = GeoPoint::checked(lat, lng).context("invalid point")?;
            let rules = load_rules(cli.ruleset.as_ref())?;
            let verdict = rules.resolve(point, jurisdiction.as_deref());
            if card {
                print!("{}", display::legal_card(&verdict));
                if let Some(notice) = legal_notice(&verdict, point, chrono::Utc::now()) {
                    println!("\n{notice}");
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&verdict)?);
            }
        }
        Command::Zones => {
            let rules = load_rules(cli.ruleset.as_ref())?;
            print!("{}", display::zones_table(&rules));
        }
        Command::Anchor {
            lat,
            lng,
            violation,
            confidence,
            source,
            ledger,
        } => {
            let point = GeoPoint::checked(lat, lng).context("invalid point")?;
            let anchor = ledger.anchor()?;
            let record = anchor
                .anchor(&Evidence::new(point, source, violation, confidence))
                .await;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_evaluate_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "terrasight", "evaluate", "--lat", "-33.86", "--lng", "151.2", "--simulate", "--seed", "7",
        ])
        .unwrap();
        match cli.command {
            Command::Evaluate {
                lat, simulate, seed, ..
            } => {
                assert_eq!(lat, -33.86);
                assert!(simulate);
                assert_eq!(seed, Some(7));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn seed_requires_simulate() {
        let result = Cli::try_parse_from(["terrasight", "evaluate", "--lat", "1", "--lng", "2", "--seed", "7"]);
        assert!(result.is_err());
    }

    #[test]
    fn anchor_requires_violation() {
        let result = Cli::try_parse_from(["terrasight", "anchor", "--lat", "1", "--lng", "2", "--confidence", "0.9"]);
        assert!(result.is_err());
    }
}
