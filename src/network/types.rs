//! Bootstrap types and error definitions.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::types::BlockchainError;
use crate::relay::types::RelayError;

/// Paymaster contract families the client knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymasterType {
    AcceptEverything,
    PermitErc20,
    SingletonWhitelist,
}

impl PaymasterType {
    /// Parse a configuration type tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "AcceptEverythingPaymaster" => Some(Self::AcceptEverything),
            "PermitERC20UniswapV3Paymaster" => Some(Self::PermitErc20),
            "SingletonWhitelistPaymaster" => Some(Self::SingletonWhitelist),
            _ => None,
        }
    }

    /// Configuration type tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::AcceptEverything => "AcceptEverythingPaymaster",
            Self::PermitErc20 => "PermitERC20UniswapV3Paymaster",
            Self::SingletonWhitelist => "SingletonWhitelistPaymaster",
        }
    }
}

/// A configured paymaster with its on-chain address resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymasterDescriptor {
    pub name: String,
    pub address: Address,
    /// Type tag as configured; parsed only when a provider is built.
    pub paymaster_type: String,
    pub owner: Option<Address>,
    pub token: Option<Address>,
    /// True when the address came from the deployment table.
    pub address_inferred: bool,
}

/// Options for `connect`.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Paymaster to use by name; the first configured one otherwise.
    pub paymaster: Option<String>,
}

/// Errors raised while discovering the network and wiring the client.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// No wallet endpoint is configured.
    #[error("No wallet connection configured: set [wallet] rpc_url to your wallet's JSON-RPC endpoint")]
    WalletUnavailable,

    /// The wallet is on a local development chain without a network entry.
    #[error("Local chain {0} is not configured: deploy the contracts locally and add a [[networks]] entry for it")]
    LocalChainNotConfigured(u64),

    /// The read RPC serves a different chain than the wallet.
    #[error("RPC endpoint serves chain {rpc_chain_id} but the wallet is on chain {wallet_chain_id}: point [rpc] url at the wallet's network")]
    RpcChainMismatch {
        wallet_chain_id: u64,
        rpc_chain_id: u64,
    },

    /// The wallet is on a chain the configuration does not support.
    #[error("Unsupported network (chain {0}): switch your wallet to a supported network")]
    UnsupportedChain(u64),

    /// A paymaster type tag is not one of the known families.
    #[error("Unknown paymaster type '{0}'")]
    UnknownPaymasterType(String),

    /// Neither the config nor the deployment table gives an address.
    #[error("No address for paymaster '{name}' of type {paymaster_type} on chain {chain_id}")]
    PaymasterAddressUnresolved {
        name: String,
        paymaster_type: String,
        chain_id: u64,
    },

    /// The network entry lists no paymaster.
    #[error("No paymaster configured on chain {0}")]
    NoPaymasters(u64),

    /// The requested paymaster name is not configured for the chain.
    #[error("Paymaster '{name}' is not configured on chain {chain_id}")]
    PaymasterNotConfigured { name: String, chain_id: u64 },

    /// A paymaster type needs a field the entry does not carry.
    #[error("Paymaster '{name}' of type {paymaster_type} requires '{field}'")]
    MissingPaymasterField {
        name: String,
        paymaster_type: &'static str,
        field: &'static str,
    },

    /// A chain id string is not a decimal number.
    #[error("Invalid chain id '{0}'")]
    InvalidChainId(String),

    #[error(transparent)]
    Wallet(#[from] BlockchainError),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
