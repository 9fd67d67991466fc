//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Hex quantity form used by wallet RPC methods (`5` → `"0x5"`).
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// A chain id string that is not a plain decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal chain id '{0}'")]
pub struct ParseChainIdError(pub String);

impl std::str::FromStr for ChainId {
    type Err = ParseChainIdError;

    /// Parse a decimal chain id. Only ASCII digits are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseChainIdError(s.to_string()));
        }
        s.parse::<u64>()
            .map(ChainId)
            .map_err(|_| ParseChainIdError(s.to_string()))
    }
}

/// EIP-1559 fee parameters, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A return value or log could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The node does not know the requested block.
    #[error("Block {0} not found")]
    BlockNotFound(u64),

    /// Transaction was not confirmed within expected time.
    #[error("Transaction not confirmed after {0} seconds")]
    ConfirmationTimeout(u64),

    /// Transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Invalid private key format or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is mined.
    Confirmed { block_number: u64 },
    /// Transaction was mined but reverted.
    Failed(String),
}
