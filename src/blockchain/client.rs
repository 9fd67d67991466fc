//! Blockchain RPC client.
//!
//! # Responsibilities
//! - Define the `ChainRpc` seam the facade and relay client read through
//! - Connect to a JSON-RPC endpoint with alloy
//! - Map transport errors into `BlockchainError`
//!
//! Calls are issued once. There is no failover, retry or timeout layer.

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::eth::{BlockNumberOrTag, Filter, Log};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::network::TransactionBuilder;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;

use crate::blockchain::types::{BlockchainError, BlockchainResult, GasFees};

/// Read and query access to a chain.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Chain id reported by the node.
    async fn chain_id(&self) -> BlockchainResult<u64>;

    /// Latest block number.
    async fn block_number(&self) -> BlockchainResult<u64>;

    /// Timestamp (unix seconds) of a mined block.
    async fn block_timestamp(&self, number: u64) -> BlockchainResult<u64>;

    /// Confirmed transaction count (nonce) of an account.
    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64>;

    /// Legacy gas price in wei.
    async fn gas_price(&self) -> BlockchainResult<u128>;

    /// EIP-1559 fee estimate.
    async fn fee_estimate(&self) -> BlockchainResult<GasFees>;

    /// `eth_call` against the latest block.
    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes>;

    /// `eth_estimateGas`.
    async fn estimate_gas(&self, tx: TransactionRequest) -> BlockchainResult<u64>;

    /// `eth_getLogs`.
    async fn logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>>;

    /// Receipt of a transaction, `None` while pending.
    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>>;
}

/// Issue a view call and decode its return value.
pub async fn read_call<C: SolCall>(
    chain: &dyn ChainRpc,
    to: Address,
    call: C,
) -> BlockchainResult<C::Return> {
    let tx = TransactionRequest::default()
        .with_to(to)
        .with_input(call.abi_encode());
    let output = chain.call(tx).await?;
    C::abi_decode_returns(&output).map_err(|e| {
        BlockchainError::Decode(format!("{} returned malformed data: {}", C::SIGNATURE, e))
    })
}

/// Alloy-backed `ChainRpc` implementation.
#[derive(Clone)]
pub struct BlockchainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    rpc_url: String,
}

impl BlockchainClient {
    /// Create a client for an HTTP JSON-RPC endpoint.
    ///
    /// No request is made here; an unreachable node surfaces on first use.
    pub fn new(rpc_url: &str) -> BlockchainResult<Self> {
        let url: url::Url = rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", rpc_url, e))
        })?;
        let provider = Arc::new(ProviderBuilder::new().connect_http(url))
            as Arc<dyn Provider + Send + Sync>;

        tracing::info!(rpc_url = %rpc_url, "Blockchain client initialized");

        Ok(Self {
            provider,
            rpc_url: rpc_url.to_string(),
        })
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &(dyn Provider + Send + Sync) {
        self.provider.as_ref()
    }

    /// Get the endpoint this client talks to.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

fn rpc_err(e: impl std::fmt::Display) -> BlockchainError {
    BlockchainError::Rpc(e.to_string())
}

#[async_trait]
impl ChainRpc for BlockchainClient {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.provider.get_chain_id().await.map_err(rpc_err)
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.provider.get_block_number().await.map_err(rpc_err)
    }

    async fn block_timestamp(&self, number: u64) -> BlockchainResult<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await
            .map_err(rpc_err)?
            .ok_or(BlockchainError::BlockNotFound(number))?;
        Ok(block.header.timestamp)
    }

    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.provider
            .get_transaction_count(address)
            .await
            .map_err(rpc_err)
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.provider.get_gas_price().await.map_err(rpc_err)
    }

    async fn fee_estimate(&self) -> BlockchainResult<GasFees> {
        let estimate = self.provider.estimate_eip1559_fees().await.map_err(rpc_err)?;
        Ok(GasFees {
            max_fee_per_gas: estimate.max_fee_per_gas,
            max_priority_fee_per_gas: estimate.max_priority_fee_per_gas,
        })
    }

    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        self.provider.call(tx).await.map_err(rpc_err)
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> BlockchainResult<u64> {
        self.provider.estimate_gas(tx).await.map_err(rpc_err)
    }

    async fn logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>> {
        self.provider.get_logs(filter).await.map_err(rpc_err)
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(rpc_err)
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.rpc_url)
            .finish()
    }
}
