//! Wallet-driven client bootstrap.
//!
//! Discovers which chain the wallet is on, resolves that chain's entry and
//! paymaster, and wires a relay provider and the facade together.

use alloy::primitives::Address;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::connection::WalletConnection;
use crate::blockchain::wallet::Wallet;
use crate::config::{AppConfig, NetworkConfig};
use crate::ctf::CaptureTheFlag;
use crate::network::paymasters::resolve_paymaster;
use crate::network::types::{
    BootstrapError, BootstrapOptions, BootstrapResult, PaymasterDescriptor, PaymasterType,
};
use crate::relay::provider::{RelayProviderFactory, RelaySigner};
use crate::relay::types::{Environment, RelayClientConfig, RelayStrategy};

pub const ARBITRUM_ONE_CHAIN_ID: u64 = 42161;
pub const OPTIMISM_CHAIN_ID: u64 = 10;
pub const ARBITRUM_MAX_VIEWABLE_GAS_LIMIT: u64 = 50_000_000;

/// Substring marking a local development chain id.
const LOCAL_CHAIN_PATTERN: &str = "1337";

/// Connect to the chain the wallet is on and build the facade for it.
///
/// Configuration errors are raised before the factory is asked for a
/// provider.
pub async fn connect(
    wallet: &dyn WalletConnection,
    config: &AppConfig,
    chain: Arc<dyn ChainRpc>,
    signer: Wallet,
    factory: &dyn RelayProviderFactory,
    options: &BootstrapOptions,
) -> BootstrapResult<CaptureTheFlag> {
    let accounts = wallet.request_accounts().await?;
    tracing::debug!(accounts = accounts.len(), "Wallet connected");
    if !signer_is_wallet_account(&accounts, signer.address()) {
        tracing::warn!(
            signer = %signer.address(),
            accounts = accounts.len(),
            "Relay signer is not one of the wallet's accounts"
        );
    }

    let chain_id = wallet.chain_id().await?;
    let network_id = wallet.network_id().await?;
    if chain_id != network_id {
        tracing::warn!(chain_id, network_id, "Wallet chain id and network id differ");
    }

    let rpc_chain_id = chain.chain_id().await?;
    if rpc_chain_id != chain_id {
        return Err(BootstrapError::RpcChainMismatch {
            wallet_chain_id: chain_id,
            rpc_chain_id,
        });
    }

    let network = lookup_network(config, chain_id)?;
    let paymaster = select_paymaster(network, config, options)?;
    let relay_config = relay_client_config(network, &paymaster)?;

    tracing::info!(
        chain_id,
        network = %network.name,
        paymaster = %paymaster.name,
        paymaster_address = %paymaster.address,
        environment = ?relay_config.environment,
        dry_run = relay_config.dry_run,
        "Building relay provider"
    );

    let provider = factory.create(relay_config).await?;
    let signer = RelaySigner::new(signer, provider);

    Ok(CaptureTheFlag::new(
        chain,
        signer,
        network.clone(),
        Duration::from_millis(config.poll_interval_ms),
    ))
}

fn signer_is_wallet_account(accounts: &[Address], signer: Address) -> bool {
    accounts.contains(&signer)
}

fn lookup_network(config: &AppConfig, chain_id: u64) -> BootstrapResult<&NetworkConfig> {
    config.network(chain_id).ok_or_else(|| {
        if chain_id.to_string().contains(LOCAL_CHAIN_PATTERN) {
            BootstrapError::LocalChainNotConfigured(chain_id)
        } else {
            BootstrapError::UnsupportedChain(chain_id)
        }
    })
}

fn select_paymaster(
    network: &NetworkConfig,
    config: &AppConfig,
    options: &BootstrapOptions,
) -> BootstrapResult<PaymasterDescriptor> {
    let entry = match &options.paymaster {
        Some(name) => network
            .paymasters
            .iter()
            .find(|p| &p.name == name)
            .ok_or_else(|| BootstrapError::PaymasterNotConfigured {
                name: name.clone(),
                chain_id: network.chain_id,
            })?,
        None => network
            .paymasters
            .first()
            .ok_or(BootstrapError::NoPaymasters(network.chain_id))?,
    };
    resolve_paymaster(entry, network.chain_id, &config.deployments)
}

/// Build the relay configuration for `paymaster` on `network`,
/// including per-chain overrides.
pub fn relay_client_config(
    network: &NetworkConfig,
    paymaster: &PaymasterDescriptor,
) -> BootstrapResult<RelayClientConfig> {
    let strategy = relay_strategy(paymaster)?;
    let mut config = RelayClientConfig::new(network.chain_id, paymaster.address, strategy);
    config.preferred_relays = network.preferred_relays.clone();

    match network.chain_id {
        ARBITRUM_ONE_CHAIN_ID => {
            config.max_viewable_gas_limit = ARBITRUM_MAX_VIEWABLE_GAS_LIMIT;
            config.environment = Environment::Arbitrum;
        }
        OPTIMISM_CHAIN_ID => config.dry_run = false,
        _ => {}
    }

    Ok(config)
}

/// Map a paymaster's type tag to the relay strategy that drives it.
pub fn relay_strategy(paymaster: &PaymasterDescriptor) -> BootstrapResult<RelayStrategy> {
    let ty = PaymasterType::from_tag(&paymaster.paymaster_type)
        .ok_or_else(|| BootstrapError::UnknownPaymasterType(paymaster.paymaster_type.clone()))?;

    let missing = |field| BootstrapError::MissingPaymasterField {
        name: paymaster.name.clone(),
        paymaster_type: ty.tag(),
        field,
    };

    match ty {
        PaymasterType::AcceptEverything => Ok(RelayStrategy::AcceptEverything),
        PaymasterType::PermitErc20 => paymaster
            .token
            .map(|token| RelayStrategy::TokenPermit { token })
            .ok_or_else(|| missing("token")),
        PaymasterType::SingletonWhitelist => paymaster
            .owner
            .map(|owner| RelayStrategy::Allowlisted { owner })
            .ok_or_else(|| missing("owner")),
    }
}
