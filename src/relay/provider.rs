//! The relay-provider seam and the relay-aware signer.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::blockchain::types::GasFees;
use crate::blockchain::wallet::Wallet;
use crate::relay::types::{
    RelayClientConfig, RelayEvent, RelayInfo, RelayResult, RelayStatus, RelayedTransaction,
    TxHandle,
};

/// A gas-sponsoring relay transport.
#[async_trait]
pub trait RelayProvider: Send + Sync {
    /// Current fee parameters for a relayed call.
    async fn calculate_gas_fees(&self) -> RelayResult<GasFees>;

    /// Sign `tx` as `signer` and hand it to a relay. Returns once a relay
    /// accepts it, not once it is mined.
    async fn send_transaction(
        &self,
        signer: &Wallet,
        tx: RelayedTransaction,
    ) -> RelayResult<TxHandle>;

    /// Hub, forwarder and paymaster this provider is bound to.
    async fn status(&self) -> RelayResult<RelayStatus>;

    /// Paymaster deposit held by the relay hub.
    async fn paymaster_balance(&self) -> RelayResult<U256>;

    /// Re-read the relay registry.
    async fn refresh_relays(&self) -> RelayResult<Vec<RelayInfo>>;

    /// Lifecycle event stream.
    fn subscribe_events(&self) -> broadcast::Receiver<RelayEvent>;
}

/// Builds relay providers from resolved configuration.
#[async_trait]
pub trait RelayProviderFactory: Send + Sync {
    async fn create(&self, config: RelayClientConfig) -> RelayResult<Arc<dyn RelayProvider>>;
}

/// A signer whose transactions go through a relay provider.
#[derive(Clone)]
pub struct RelaySigner {
    wallet: Wallet,
    provider: Arc<dyn RelayProvider>,
}

impl RelaySigner {
    pub fn new(wallet: Wallet, provider: Arc<dyn RelayProvider>) -> Self {
        Self { wallet, provider }
    }

    /// Address relayed calls are sent from.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn provider(&self) -> &Arc<dyn RelayProvider> {
        &self.provider
    }

    pub async fn send_transaction(&self, tx: RelayedTransaction) -> RelayResult<TxHandle> {
        self.provider.send_transaction(&self.wallet, tx).await
    }
}

impl std::fmt::Debug for RelaySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySigner")
            .field("address", &self.wallet.address())
            .finish_non_exhaustive()
    }
}
