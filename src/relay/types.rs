//! Relay types and error definitions.

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::sol_types::SolValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::types::{BlockchainError, GasFees};

/// Default cap for view calls made while validating a relay request.
pub const DEFAULT_MAX_VIEWABLE_GAS_LIMIT: u64 = 12_000_000;

/// How long a signed relay request stays valid (2 days).
pub const DEFAULT_REQUEST_VALID_SECS: u64 = 172_800;

/// Addresses and version the relay client is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStatus {
    pub relay_hub: Address,
    pub forwarder: Address,
    pub paymaster: Address,
    pub paymaster_version: String,
}

/// A relay server as reported by its ping endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayInfo {
    pub url: String,
    pub relay_worker: Address,
    pub relay_manager: Address,
    pub relay_hub: Address,
    pub ready: bool,
    pub min_max_priority_fee_per_gas: u128,
    pub max_acceptance_budget: u128,
    pub version: String,
}

/// Lifecycle notifications emitted while a relayed call progresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RelayEvent {
    Init,
    RefreshRelays,
    NextRelay { url: String },
    ValidateRequest,
    SignRequest,
    SendToRelayer { url: String },
    RelayerResponse { success: bool },
}

impl RelayEvent {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayEvent::Init => "init",
            RelayEvent::RefreshRelays => "refresh_relays",
            RelayEvent::NextRelay { .. } => "next_relay",
            RelayEvent::ValidateRequest => "validate_request",
            RelayEvent::SignRequest => "sign_request",
            RelayEvent::SendToRelayer { .. } => "send_to_relayer",
            RelayEvent::RelayerResponse { .. } => "relayer_response",
        }
    }
}

/// A call to be relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedTransaction {
    pub to: Address,
    pub data: Bytes,
    pub gas_limit: u64,
    pub fees: GasFees,
}

/// Handle to a transaction accepted by a relay. It may not be mined yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle {
    pub tx_hash: TxHash,
    pub relay_url: String,
}

/// How the paymaster is asked to sponsor a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayStrategy {
    /// Paymaster that pays for every call.
    AcceptEverything,
    /// ERC-20 token paymaster charging the user in `token` via permit.
    TokenPermit { token: Address },
    /// Paymaster that only sponsors calls allow-listed by `owner`.
    Allowlisted { owner: Address },
}

impl RelayStrategy {
    /// Paymaster data attached to every relay request.
    pub fn paymaster_data(&self) -> Bytes {
        match self {
            RelayStrategy::AcceptEverything => Bytes::new(),
            RelayStrategy::TokenPermit { token } => token.abi_encode().into(),
            RelayStrategy::Allowlisted { owner } => owner.abi_encode().into(),
        }
    }
}

/// Execution environment of the target chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Ethereum,
    /// Calldata is priced by the L1 component, so it is estimated by the node.
    Arbitrum,
}

/// Everything a relay provider needs to be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayClientConfig {
    pub chain_id: u64,
    pub paymaster: Address,
    pub strategy: RelayStrategy,
    pub preferred_relays: Vec<String>,
    pub max_viewable_gas_limit: u64,
    pub environment: Environment,
    pub dry_run: bool,
    pub request_valid_secs: u64,
}

impl RelayClientConfig {
    pub fn new(chain_id: u64, paymaster: Address, strategy: RelayStrategy) -> Self {
        Self {
            chain_id,
            paymaster,
            strategy,
            preferred_relays: Vec::new(),
            max_viewable_gas_limit: DEFAULT_MAX_VIEWABLE_GAS_LIMIT,
            environment: Environment::Ethereum,
            dry_run: true,
            request_valid_secs: DEFAULT_REQUEST_VALID_SECS,
        }
    }
}

/// Errors that can occur while relaying.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No configured relay answered as ready.
    #[error("No ready relay available (tried {0})")]
    NoReadyRelay(usize),

    /// HTTP exchange with a relay failed.
    #[error("Relay {url} unreachable: {message}")]
    Http { url: String, message: String },

    /// The relay answered but refused the request.
    #[error("Relay {url} rejected request: {message}")]
    Rejected { url: String, message: String },

    /// Local validation of the call failed before relaying.
    #[error("Dry run failed: {0}")]
    DryRunFailed(String),

    /// Underlying chain access or signing failed.
    #[error(transparent)]
    Chain(#[from] BlockchainError),
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
