//! The anchoring service.

use chrono::Utc;
use ring::digest::{SHA256, digest};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;
use terrasight_core::{AnchorMode, AnchorRecord, GeoPoint, hex_encode};
use tracing::{error, info, warn};

use crate::AnchorError;
use crate::ledger::{LedgerClient, LedgerConfig};

const NONCE_BYTES: usize = 8;

/// What gets anchored for one verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub location: GeoPoint,
    /// Provenance of the readings, e.g. `SENTINEL-2 L2A (Live Stats)`.
    pub source: String,
    /// Violation type, e.g. `DEFORESTATION - LAND_CLEARING`.
    pub violation: String,
    pub confidence: f64,
}

impl Evidence {
    pub fn new(
        location: GeoPoint,
        source: impl Into<String>,
        violation: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            location,
            source: source.into(),
            violation: violation.into(),
            confidence,
        }
    }
}

// Field order is the serialisation order; the digest depends on it.
#[derive(Serialize)]
struct Metadata<'a> {
    location: Location,
    source: &'a str,
    violation: &'a str,
    confidence: f64,
    timestamp: i64,
    nonce: &'a str,
}

#[derive(Serialize)]
struct Location {
    lat: f64,
    lng: f64,
}

/// Serialise the evidence and hash it. Returns `(metadata, digest)` where
/// `digest` is `0x` + lowercase hex SHA-256 of `metadata`.
pub fn seal(evidence: &Evidence, timestamp_ms: i64, nonce: &str) -> (String, String) {
    let metadata = Metadata {
        location: Location {
            lat: evidence.location.lat,
            lng: evidence.location.lng,
        },
        source: &evidence.source,
        violation: &evidence.violation,
        confidence: if evidence.confidence.is_finite() {
            evidence.confidence
        } else {
            0.0
        },
        timestamp: timestamp_ms,
        nonce,
    };
    let metadata = match serde_json::to_string(&metadata) {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "evidence serialisation failed; hashing debug form");
            format!("{evidence:?}|{timestamp_ms}|{nonce}")
        }
    };
    let digest = format!("0x{}", hex_encode(digest(&SHA256, metadata.as_bytes()).as_ref()));
    (metadata, digest)
}

/// Fingerprints evidence and commits it to the ledger when one is configured.
pub struct EvidenceAnchor {
    ledger: Option<LedgerClient>,
    rng: SystemRandom,
}

impl EvidenceAnchor {
    /// Local fingerprints only.
    pub fn offline() -> Self {
        Self {
            ledger: None,
            rng: SystemRandom::new(),
        }
    }

    pub fn with_ledger(ledger: LedgerClient) -> Self {
        Self {
            ledger: Some(ledger),
            rng: SystemRandom::new(),
        }
    }

    /// Build from optional configuration. `None` is the normal offline mode.
    pub fn from_config(config: Option<LedgerConfig>) -> Result<Self, AnchorError> {
        match config {
            Some(config) => Ok(Self::with_ledger(LedgerClient::new(config)?)),
            None => {
                info!("no ledger configured; evidence will be fingerprinted locally");
                Ok(Self::offline())
            }
        }
    }

    pub fn has_ledger(&self) -> bool {
        self.ledger.is_some()
    }

    /// Anchor one piece of evidence. Never fails: ledger errors are logged
    /// and the local digest becomes the fingerprint.
    pub async fn anchor(&self, evidence: &Evidence) -> AnchorRecord {
        let timestamp = Utc::now().timestamp_millis();
        let nonce = self.nonce(timestamp);
        let (metadata, digest) = seal(evidence, timestamp, &nonce);
        info!(digest = %digest, violation = %evidence.violation, "evidence sealed");

        let mode = match &self.ledger {
            Some(ledger) => match ledger.submit(&digest).await {
                Ok(transaction_id) => AnchorMode::Ledger { transaction_id },
                Err(e) => {
                    warn!(error = %e, "ledger anchoring failed; keeping local digest");
                    AnchorMode::LocalOnly
                }
            },
            None => AnchorMode::LocalOnly,
        };

        let fingerprint = match &mode {
            AnchorMode::Ledger { transaction_id } => transaction_id.clone(),
            AnchorMode::LocalOnly => digest.clone(),
        };
        AnchorRecord {
            fingerprint,
            digest,
            timestamp,
            metadata,
            mode,
        }
    }

    fn nonce(&self, timestamp: i64) -> String {
        let mut bytes = [0u8; NONCE_BYTES];
        match self.rng.fill(&mut bytes) {
            Ok(()) => hex_encode(&bytes),
            Err(_) => {
                warn!("system RNG unavailable; deriving nonce from clock");
                let nanos = Utc::now().timestamp_subsec_nanos() as i64;
                format!("{:016x}", timestamp.wrapping_mul(1_000_000_000).wrapping_add(nanos))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AnchorTransaction;
    use ring::signature::{ED25519, UnparsedPublicKey};
    use std::io::Read;
    use std::thread;
    use terrasight_core::hex_decode;
    use tiny_http::{Header, Response, Server};

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn evidence(violation: &str) -> Evidence {
        Evidence::new(GeoPoint::new(28.6, 77.2), "SENTINEL-1", violation, 0.95)
    }

    fn is_digest(s: &str) -> bool {
        s.len() == 66
            && s.starts_with("0x")
            && s[2..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    }

    fn sha256_hex(text: &str) -> String {
        format!("0x{}", hex_encode(digest(&SHA256, text.as_bytes()).as_ref()))
    }

    /// One-shot JSON-RPC server; returns the request body it saw.
    fn ledger_server(status: u16, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let url = format!("http://{}/rpc", server.server_addr());
        let handle = thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let mut seen = String::new();
            request.as_reader().read_to_string(&mut seen).unwrap();
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
            request.respond(response).unwrap();
            seen
        });
        (url, handle)
    }

    #[test]
    fn seal_field_order_is_fixed() {
        let (metadata, digest) = seal(&evidence("TEST_VIOLATION"), 1_700_000_000_000, "00ff00ff00ff00ff");
        assert_eq!(
            metadata,
            r#"{"location":{"lat":28.6,"lng":77.2},"source":"SENTINEL-1","violation":"TEST_VIOLATION","confidence":0.95,"timestamp":1700000000000,"nonce":"00ff00ff00ff00ff"}"#
        );
        assert!(is_digest(&digest));
        assert_eq!(digest, sha256_hex(&metadata));
    }

    #[test]
    fn seal_avalanche() {
        let (_, a) = seal(&evidence("VIOLATION_A"), 1, "00");
        let (_, b) = seal(&evidence("VIOLATION_B"), 1, "00");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn offline_anchor_uses_local_digest() {
        let anchor = EvidenceAnchor::offline();
        let record = anchor.anchor(&evidence("TEST_VIOLATION")).await;
        assert!(is_digest(&record.fingerprint));
        assert_eq!(record.fingerprint, record.digest);
        assert_eq!(record.mode, AnchorMode::LocalOnly);

        let meta: serde_json::Value = serde_json::from_str(&record.metadata).unwrap();
        assert_eq!(meta["location"]["lat"], 28.6);
        assert_eq!(meta["violation"], "TEST_VIOLATION");
        assert_eq!(meta["timestamp"], record.timestamp);
        assert_eq!(meta["nonce"].as_str().unwrap().len(), NONCE_BYTES * 2);
    }

    #[tokio::test]
    async fn nonce_separates_identical_evidence() {
        let anchor = EvidenceAnchor::offline();
        let a = anchor.anchor(&evidence("SAME")).await;
        let b = anchor.anchor(&evidence("SAME")).await;
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    #[tokio::test]
    async fn ledger_commit_overwrites_fingerprint() {
        let (url, handle) = ledger_server(200, r#"{"jsonrpc":"2.0","id":1,"result":"0xfeedbeef"}"#);
        let anchor = EvidenceAnchor::from_config(Some(LedgerConfig::new(url, SEED))).unwrap();
        assert!(anchor.has_ledger());

        let record = anchor.anchor(&evidence("DEFORESTATION - LAND_CLEARING")).await;
        assert_eq!(record.fingerprint, "0xfeedbeef");
        assert!(record.is_on_ledger());
        // The digest is still recoverable from the metadata.
        assert_eq!(record.digest, sha256_hex(&record.metadata));

        let request: serde_json::Value = serde_json::from_str(&handle.join().unwrap()).unwrap();
        assert_eq!(request["method"], "anchor_submitTransaction");
        let signed = &request["params"][0];
        assert_eq!(signed["transaction"]["data"], record.digest.as_str());
        assert_eq!(signed["transaction"]["value"], "0x0");
        assert_eq!(signed["transaction"]["from"], signed["transaction"]["to"]);

        let tx = &signed["transaction"];
        let payload = serde_json::to_vec(&AnchorTransaction {
            from: tx["from"].as_str().unwrap().to_string(),
            to: tx["to"].as_str().unwrap().to_string(),
            value: "0x0",
            data: tx["data"].as_str().unwrap().to_string(),
        })
        .unwrap();
        let public_key = hex_decode(signed["public_key"].as_str().unwrap()).unwrap();
        let signature = hex_decode(signed["signature"].as_str().unwrap()).unwrap();
        UnparsedPublicKey::new(&ED25519, public_key)
            .verify(&payload, &signature)
            .unwrap();
    }

    #[tokio::test]
    async fn rpc_error_falls_back_to_digest() {
        let (url, handle) = ledger_server(
            200,
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"insufficient funds"}}"#,
        );
        let anchor = EvidenceAnchor::from_config(Some(LedgerConfig::new(url, SEED))).unwrap();
        let record = anchor.anchor(&evidence("X")).await;
        assert_eq!(record.fingerprint, record.digest);
        assert_eq!(record.mode, AnchorMode::LocalOnly);
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn http_error_falls_back_to_digest() {
        let (url, handle) = ledger_server(503, "unavailable");
        let anchor = EvidenceAnchor::from_config(Some(LedgerConfig::new(url, SEED))).unwrap();
        let record = anchor.anchor(&evidence("X")).await;
        assert!(!record.is_on_ledger());
        assert!(is_digest(&record.fingerprint));
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn unreachable_ledger_falls_back_to_digest() {
        let mut config = LedgerConfig::new("http://127.0.0.1:9/rpc", SEED);
        config.timeout = std::time::Duration::from_millis(500);
        let anchor = EvidenceAnchor::from_config(Some(config)).unwrap();
        let record = anchor.anchor(&evidence("X")).await;
        assert_eq!(record.mode, AnchorMode::LocalOnly);
    }
}
