//! JSON-RPC ledger client.
//!
//! The anchor transaction is a zero-value transfer from the signer to
//! itself carrying the evidence digest as `data`. It is signed locally
//! with Ed25519 and submitted in one `method` call; the ledger answers
//! with the transaction id.

use std::fmt;
use std::time::Duration;

use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::{Deserialize, Serialize};
use terrasight_core::{hex_decode, hex_encode};
use tracing::info;

use crate::AnchorError;

pub const DEFAULT_RPC_METHOD: &str = "anchor_submitTransaction";

#[derive(Clone)]
pub struct LedgerConfig {
    pub rpc_url: String,
    /// Hex-encoded 32-byte Ed25519 seed, optionally `0x`-prefixed.
    pub signing_key: String,
    pub method: String,
    pub timeout: Duration,
}

impl LedgerConfig {
    pub fn new(rpc_url: impl Into<String>, signing_key: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            signing_key: signing_key.into(),
            method: DEFAULT_RPC_METHOD.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("signing_key", &"<redacted>")
            .field("method", &self.method)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorTransaction {
    pub from: String,
    pub to: String,
    pub value: &'static str,
    pub data: String,
}

#[derive(Serialize)]
struct SignedTransaction<'a> {
    transaction: &'a AnchorTransaction,
    public_key: &'a str,
    signature: String,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: [SignedTransaction<'a>; 1],
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct LedgerClient {
    client: reqwest::Client,
    rpc_url: String,
    method: String,
    key_pair: Ed25519KeyPair,
    address: String,
}

impl LedgerClient {
    /// Build a client. Fails on a malformed signing key.
    pub fn new(config: LedgerConfig) -> Result<Self, AnchorError> {
        let seed = hex_decode(config.signing_key.trim())
            .ok_or_else(|| AnchorError::InvalidKey("not a hex string".into()))?;
        if seed.len() != 32 {
            return Err(AnchorError::InvalidKey(format!(
                "expected a 32-byte seed, got {} bytes",
                seed.len()
            )));
        }
        let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed)
            .map_err(|e| AnchorError::InvalidKey(e.to_string()))?;
        let address = format!("0x{}", hex_encode(key_pair.public_key().as_ref()));
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            rpc_url: config.rpc_url,
            method: config.method,
            key_pair,
            address,
        })
    }

    /// The signer's address: `0x` + hex public key.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn transaction_for(&self, digest: &str) -> AnchorTransaction {
        AnchorTransaction {
            from: self.address.clone(),
            to: self.address.clone(),
            value: "0x0",
            data: digest.to_string(),
        }
    }

    /// Submit the anchor transaction for `digest`; returns the transaction id.
    pub async fn submit(&self, digest: &str) -> Result<String, AnchorError> {
        let transaction = self.transaction_for(digest);
        let payload = serde_json::to_vec(&transaction)?;
        let signature = format!("0x{}", hex_encode(self.key_pair.sign(&payload).as_ref()));

        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: &self.method,
            params: [SignedTransaction {
                transaction: &transaction,
                public_key: &self.address,
                signature,
            }],
        };

        info!(url = %self.rpc_url, method = %self.method, "submitting anchor transaction");
        let resp = self.client.post(&self.rpc_url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnchorError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let rpc: RpcResponse = serde_json::from_str(&text)?;
        if let Some(err) = rpc.error {
            return Err(AnchorError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let tx_id = rpc
            .result
            .filter(|id| !id.is_empty())
            .ok_or(AnchorError::MissingResult)?;
        info!(transaction_id = %tx_id, "anchor transaction accepted");
        Ok(tx_id)
    }
}
