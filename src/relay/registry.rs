//! Relay registry helpers: URL validation and ping responses.

use alloy::primitives::Address;
use serde::Deserialize;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

use crate::relay::types::RelayInfo;

/// Whether a relay URL is usable from a public client.
///
/// Accepts absolute http(s) URLs whose host is a dotted public domain or a
/// public IP. Rejects malformed URLs, localhost, loopback, private,
/// link-local and unspecified addresses.
pub fn is_valid_relay_url(raw: &str) -> bool {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return false,
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.to_ascii_lowercase();
            domain.contains('.') && domain != "localhost" && !domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => is_public_v4(ip),
        Some(Host::Ipv6(ip)) => is_public_v6(ip),
        None => false,
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast())
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = first & 0xfe00 == 0xfc00;
    let link_local = first & 0xffc0 == 0xfe80;
    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local)
}

/// Body of a relay's `/getaddr` response. Numeric fields are decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub relay_worker_address: Address,
    pub relay_manager_address: Address,
    pub relay_hub_address: Address,
    #[serde(default)]
    pub min_max_priority_fee_per_gas: Option<String>,
    #[serde(default)]
    pub max_acceptance_budget: Option<String>,
    #[serde(default)]
    pub chain_id: Option<String>,
    pub ready: bool,
    #[serde(default)]
    pub version: String,
}

impl PingResponse {
    /// Convert into a `RelayInfo`, rejecting relays for a different chain.
    pub fn into_relay_info(self, url: &str, expected_chain_id: u64) -> Result<RelayInfo, String> {
        if let Some(chain_id) = &self.chain_id {
            let chain_id: u64 = chain_id
                .parse()
                .map_err(|_| format!("invalid chainId '{}'", chain_id))?;
            if chain_id != expected_chain_id {
                return Err(format!(
                    "relay serves chain {}, expected {}",
                    chain_id, expected_chain_id
                ));
            }
        }

        Ok(RelayInfo {
            url: url.to_string(),
            relay_worker: self.relay_worker_address,
            relay_manager: self.relay_manager_address,
            relay_hub: self.relay_hub_address,
            ready: self.ready,
            min_max_priority_fee_per_gas: parse_quantity(
                self.min_max_priority_fee_per_gas.as_deref(),
                "minMaxPriorityFeePerGas",
            )?,
            max_acceptance_budget: parse_quantity(
                self.max_acceptance_budget.as_deref(),
                "maxAcceptanceBudget",
            )?,
            version: self.version,
        })
    }
}

fn parse_quantity(raw: Option<&str>, field: &str) -> Result<u128, String> {
    match raw {
        None => Ok(0),
        Some(s) => s
            .parse()
            .map_err(|_| format!("invalid {} '{}'", field, s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_public_urls() {
        assert!(is_valid_relay_url("https://relay.example.org/gsn1"));
        assert!(is_valid_relay_url("http://8.8.8.8:8090"));
        assert!(is_valid_relay_url("https://[2001:4860::8888]/"));
    }

    #[test]
    fn test_rejects_malformed_and_private_urls() {
        assert!(!is_valid_relay_url("not a url"));
        assert!(!is_valid_relay_url("ftp://relay.example.org"));
        assert!(!is_valid_relay_url("http://localhost:8090"));
        assert!(!is_valid_relay_url("http://relay.localhost"));
        assert!(!is_valid_relay_url("http://relayhost"));
        assert!(!is_valid_relay_url("http://127.0.0.1:8090"));
        assert!(!is_valid_relay_url("http://192.168.1.10"));
        assert!(!is_valid_relay_url("http://10.0.0.1"));
        assert!(!is_valid_relay_url("http://169.254.0.1"));
        assert!(!is_valid_relay_url("http://0.0.0.0"));
        assert!(!is_valid_relay_url("http://[::1]:8090"));
        assert!(!is_valid_relay_url("http://[fd00::1]"));
        assert!(!is_valid_relay_url("http://[fe80::1]"));
    }

    fn ping_json(chain_id: &str) -> serde_json::Value {
        serde_json::json!({
            "relayWorkerAddress": "0x00000000000000000000000000000000000000a1",
            "relayManagerAddress": "0x00000000000000000000000000000000000000a2",
            "relayHubAddress": "0x00000000000000000000000000000000000000a3",
            "ownerAddress": "0x00000000000000000000000000000000000000a4",
            "minMaxPriorityFeePerGas": "1500000000",
            "maxAcceptanceBudget": "285252",
            "chainId": chain_id,
            "networkId": chain_id,
            "ready": true,
            "version": "3.0.0-beta.3"
        })
    }

    #[test]
    fn test_ping_into_relay_info() {
        let ping: PingResponse = serde_json::from_value(ping_json("5")).unwrap();
        let info = ping.into_relay_info("https://relay.example.org", 5).unwrap();
        assert!(info.ready);
        assert_eq!(info.min_max_priority_fee_per_gas, 1_500_000_000);
        assert_eq!(info.max_acceptance_budget, 285_252);
        assert_eq!(info.relay_hub, Address::with_last_byte(0xa3));
    }

    #[test]
    fn test_ping_wrong_chain() {
        let ping: PingResponse = serde_json::from_value(ping_json("1")).unwrap();
        let err = ping.into_relay_info("https://relay.example.org", 5).unwrap_err();
        assert!(err.contains("expected 5"));
    }
}
