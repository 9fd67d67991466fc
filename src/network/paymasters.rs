//! Paymaster directory.
//!
//! Resolves each paymaster configured for a chain to an on-chain address,
//! from the entry itself or from the deployment table.

use alloy::primitives::Address;

use crate::config::{NetworkConfig, PaymasterConfig, PaymasterDeployment};
use crate::network::types::{BootstrapError, BootstrapResult, PaymasterDescriptor};

/// Look up a deployed paymaster by type tag and chain.
pub fn lookup_paymaster_address(
    paymaster_type: &str,
    chain_id: u64,
    deployments: &[PaymasterDeployment],
) -> Option<Address> {
    deployments
        .iter()
        .find(|d| d.chain_id == chain_id && d.paymaster_type == paymaster_type)
        .map(|d| d.address)
}

/// Resolve one configured paymaster.
pub fn resolve_paymaster(
    entry: &PaymasterConfig,
    chain_id: u64,
    deployments: &[PaymasterDeployment],
) -> BootstrapResult<PaymasterDescriptor> {
    let (address, address_inferred) = match entry.address {
        Some(address) => (address, false),
        None => {
            let address = lookup_paymaster_address(&entry.paymaster_type, chain_id, deployments)
                .ok_or_else(|| BootstrapError::PaymasterAddressUnresolved {
                    name: entry.name.clone(),
                    paymaster_type: entry.paymaster_type.clone(),
                    chain_id,
                })?;
            (address, true)
        }
    };

    tracing::debug!(
        name = %entry.name,
        paymaster_type = %entry.paymaster_type,
        address = %address,
        inferred = address_inferred,
        "Resolved paymaster"
    );

    Ok(PaymasterDescriptor {
        name: entry.name.clone(),
        address,
        paymaster_type: entry.paymaster_type.clone(),
        owner: entry.owner,
        token: entry.token,
        address_inferred,
    })
}

/// Resolve every paymaster configured for `network`, in order.
pub fn resolve_paymasters(
    network: &NetworkConfig,
    deployments: &[PaymasterDeployment],
) -> BootstrapResult<Vec<PaymasterDescriptor>> {
    network
        .paymasters
        .iter()
        .map(|entry| resolve_paymaster(entry, network.chain_id, deployments))
        .collect()
}
