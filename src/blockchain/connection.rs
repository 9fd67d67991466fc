//! Wallet connection.
//!
//! The wallet is the authority on which chain the user is on. It is reached
//! through its JSON-RPC endpoint and asked for chain id, network id and
//! accounts, and to switch chains.

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Operations the client needs from a user wallet.
#[async_trait]
pub trait WalletConnection: Send + Sync {
    /// `eth_chainId`.
    async fn chain_id(&self) -> BlockchainResult<u64>;

    /// `net_version`.
    async fn network_id(&self) -> BlockchainResult<u64>;

    /// `eth_requestAccounts`, prompting the user when needed.
    async fn request_accounts(&self) -> BlockchainResult<Vec<Address>>;

    /// `wallet_switchEthereumChain` with a hex chain id (e.g. `"0x5"`).
    async fn switch_chain(&self, chain_id_hex: &str) -> BlockchainResult<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwitchChainParams<'a> {
    chain_id: &'a str,
}

/// `WalletConnection` over a wallet's JSON-RPC endpoint.
#[derive(Clone)]
pub struct RpcWallet {
    provider: Arc<dyn Provider + Send + Sync>,
}

impl RpcWallet {
    /// Connect to the wallet endpoint. No request is made here.
    pub fn connect(rpc_url: &str) -> BlockchainResult<Self> {
        let url: url::Url = rpc_url.parse().map_err(|e| {
            BlockchainError::Wallet(format!("Invalid wallet URL '{}': {}", rpc_url, e))
        })?;
        let provider = Arc::new(ProviderBuilder::new().connect_http(url))
            as Arc<dyn Provider + Send + Sync>;
        Ok(Self { provider })
    }
}

#[async_trait]
impl WalletConnection for RpcWallet {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| BlockchainError::Wallet(e.to_string()))
    }

    async fn network_id(&self) -> BlockchainResult<u64> {
        self.provider
            .get_net_version()
            .await
            .map_err(|e| BlockchainError::Wallet(e.to_string()))
    }

    async fn request_accounts(&self) -> BlockchainResult<Vec<Address>> {
        self.provider
            .client()
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await
            .map_err(|e| BlockchainError::Wallet(e.to_string()))
    }

    async fn switch_chain(&self, chain_id_hex: &str) -> BlockchainResult<()> {
        let params = (SwitchChainParams {
            chain_id: chain_id_hex,
        },);
        let params = serde_json::to_value(params)
            .map_err(|e| BlockchainError::Wallet(e.to_string()))?;
        self.provider
            .client()
            .request::<_, serde_json::Value>("wallet_switchEthereumChain", params)
            .await
            .map_err(|e| BlockchainError::Wallet(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for RpcWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcWallet").finish_non_exhaustive()
    }
}
