//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Poll interval used by event subscriptions when none is configured.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 4_000;

/// Root configuration for the client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Show local-only networks in chain listings.
    pub local: bool,

    /// Interval between log polls for event subscriptions.
    pub poll_interval_ms: u64,

    /// Wallet connection settings.
    pub wallet: WalletConfig,

    /// Read RPC used by the contract facade.
    pub rpc: RpcConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Per-chain network table.
    pub networks: Vec<NetworkConfig>,

    /// Known paymaster deployments, keyed by type and chain.
    pub deployments: Vec<PaymasterDeployment>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            local: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            wallet: WalletConfig::default(),
            rpc: RpcConfig::default(),
            observability: ObservabilityConfig::default(),
            networks: Vec::new(),
            deployments: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Find the network entry for a chain id.
    pub fn network(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }
}

/// Wallet connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    /// JSON-RPC endpoint exposed by the wallet (e.g. Frame on port 1248).
    pub rpc_url: Option<String>,
}

/// Read RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL.
    pub url: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

/// One entry of the per-chain network table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Chain id (e.g. 5 for Goerli, 1337 for a local node).
    pub chain_id: u64,

    /// Display name.
    pub name: String,

    /// Address of the deployed CaptureTheFlag contract.
    pub contract_address: Address,

    /// Paymasters usable on this chain.
    #[serde(default)]
    pub paymasters: Vec<PaymasterConfig>,

    /// Relay servers to try, in order.
    #[serde(default)]
    pub preferred_relays: Vec<String>,

    /// How far back `recent_events` scans, in blocks.
    #[serde(default)]
    pub lookup_window_blocks: Option<u64>,

    /// Hide this chain unless running in a local context.
    #[serde(default)]
    pub local: bool,
}

/// A configured paymaster, before address resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymasterConfig {
    /// Display name.
    pub name: String,

    /// Paymaster type tag (e.g. "AcceptEverythingPaymaster").
    #[serde(rename = "type")]
    pub paymaster_type: String,

    /// Explicit on-chain address. Looked up in `deployments` when absent.
    #[serde(default)]
    pub address: Option<Address>,

    /// Dapp owner for allow-listed paymasters.
    #[serde(default)]
    pub owner: Option<Address>,

    /// Fee token for token paymasters.
    #[serde(default)]
    pub token: Option<Address>,
}

/// A known paymaster deployment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymasterDeployment {
    pub chain_id: u64,

    #[serde(rename = "type")]
    pub paymaster_type: String,

    pub address: Address,
}
