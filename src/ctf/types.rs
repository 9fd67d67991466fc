//! Contract facade types and error definitions.

use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::eth::Log;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::types::BlockchainError;
use crate::ctf::contract::ICaptureTheFlag::FlagCaptured;
use crate::relay::types::RelayError;

/// Events returned by `recent_events` when the caller has no preference.
pub const DEFAULT_EVENT_COUNT: usize = 5;

/// Assumed block time used to size the default lookback window.
pub const ASSUMED_BLOCK_TIME_SECS: u64 = 12;

/// Default lookback window: 30 days of blocks.
pub const DEFAULT_LOOKUP_WINDOW_BLOCKS: u64 = 30 * 24 * 3600 / ASSUMED_BLOCK_TIME_SECS;

/// Gas ceiling applied to every capture transaction.
pub const CAPTURE_GAS_LIMIT: u64 = 1_000_000;

/// A flag capture, rebuilt from a contract log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    /// Unix timestamp of the block the capture was mined in.
    pub timestamp: u64,
    pub previous_holder: Address,
    pub current_holder: Address,
    pub block_number: u64,
    pub tx_hash: Option<TxHash>,
}

/// A decoded `FlagCaptured` log still missing its block timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedCapture {
    pub previous_holder: Address,
    pub current_holder: Address,
    pub block_number: u64,
    pub tx_hash: Option<TxHash>,
}

impl DecodedCapture {
    /// Decode a log, or `None` if it is not a mined `FlagCaptured` log.
    pub fn from_log(log: &Log) -> Option<Self> {
        let block_number = log.block_number?;
        let decoded = log.log_decode::<FlagCaptured>().ok()?;
        Some(Self {
            previous_holder: decoded.inner.data.previousHolder,
            current_holder: decoded.inner.data.currentHolder,
            block_number,
            tx_hash: log.transaction_hash,
        })
    }

    pub fn with_timestamp(self, timestamp: u64) -> CaptureEvent {
        CaptureEvent {
            timestamp,
            previous_holder: self.previous_holder,
            current_holder: self.current_holder,
            block_number: self.block_number,
            tx_hash: self.tx_hash,
        }
    }
}

/// Errors surfaced by the contract facade.
#[derive(Debug, Error)]
pub enum CtfError {
    #[error(transparent)]
    Chain(#[from] BlockchainError),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Result type for facade operations.
pub type CtfResult<T> = Result<T, CtfError>;
