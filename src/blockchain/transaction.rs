//! Confirmation monitoring for submitted transactions.
//!
//! The contract facade returns as soon as a relay accepts a transaction.
//! Callers that need a mined receipt poll for it here.

use alloy::primitives::TxHash;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};

/// Default delay between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Wait for a transaction to be mined.
///
/// # Arguments
/// * `chain` - RPC used to poll for the receipt
/// * `tx_hash` - Transaction hash to monitor
/// * `timeout_secs` - Maximum time to wait
/// * `poll_interval` - Delay between receipt lookups
pub async fn wait_for_confirmation(
    chain: &dyn ChainRpc,
    tx_hash: TxHash,
    timeout_secs: u64,
    poll_interval: Duration,
) -> BlockchainResult<ConfirmationStatus> {
    let result = timeout(Duration::from_secs(timeout_secs), async {
        let mut ticker = interval(poll_interval);

        loop {
            ticker.tick().await;

            let receipt = match chain.transaction_receipt(tx_hash).await? {
                Some(r) => r,
                None => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
            };

            if !receipt.status() {
                return Ok::<_, BlockchainError>(ConfirmationStatus::Failed(
                    "Transaction reverted".to_string(),
                ));
            }

            return Ok(ConfirmationStatus::Confirmed {
                block_number: receipt.block_number.unwrap_or_default(),
            });
        }
    })
    .await;

    match result {
        Ok(status) => status,
        Err(_) => Err(BlockchainError::ConfirmationTimeout(timeout_secs)),
    }
}
