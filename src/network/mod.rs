//! Network discovery and wallet helpers.
//!
//! # Data Flow
//! ```text
//! WalletConnection (chain id, network id)
//!     → AppConfig.networks lookup
//!     → paymaster directory (explicit or deployed address)
//!     → RelayClientConfig + chain overrides
//!     → RelayProviderFactory → RelaySigner → CaptureTheFlag
//! ```

pub mod bootstrap;
pub mod paymasters;
pub mod types;

pub use bootstrap::connect;
pub use paymasters::{lookup_paymaster_address, resolve_paymasters};
pub use types::{
    BootstrapError, BootstrapOptions, BootstrapResult, PaymasterDescriptor, PaymasterType,
};

use crate::blockchain::connection::{RpcWallet, WalletConnection};
use crate::blockchain::types::ChainId;
use crate::config::AppConfig;

/// Chains a user may switch to, as `(chain id, name)` in table order.
///
/// Local development chains are listed only in a local context.
pub fn supported_networks(config: &AppConfig, local_context: bool) -> Vec<(u64, String)> {
    config
        .networks
        .iter()
        .filter(|n| local_context || !n.local)
        .map(|n| (n.chain_id, n.name.clone()))
        .collect()
}

/// Ask the wallet to switch to the chain with decimal id `chain_id`.
pub async fn switch_network(wallet: &dyn WalletConnection, chain_id: &str) -> BootstrapResult<()> {
    let id: ChainId = chain_id
        .trim()
        .parse()
        .map_err(|_| BootstrapError::InvalidChainId(chain_id.to_string()))?;

    let hex = id.to_hex();
    tracing::info!(chain_id = id.0, hex = %hex, "Requesting wallet chain switch");
    wallet.switch_chain(&hex).await?;
    Ok(())
}

/// Open the wallet endpoint named in the configuration.
pub fn open_wallet(config: &AppConfig) -> BootstrapResult<RpcWallet> {
    let url = config
        .wallet
        .rpc_url
        .as_deref()
        .ok_or(BootstrapError::WalletUnavailable)?;
    Ok(RpcWallet::connect(url)?)
}
