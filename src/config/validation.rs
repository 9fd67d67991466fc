//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the network table for duplicates and empty entries
//! - Validate value ranges (poll interval > 0, lookup windows > 0)
//! - Check relay URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::AppConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateChainId(u64),
    EmptyNetworkName(u64),
    NoPaymasters(u64),
    DuplicatePaymasterName { chain_id: u64, name: String },
    ZeroLookupWindow(u64),
    ZeroPollInterval,
    InvalidRelayUrl { chain_id: u64, url: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateChainId(id) => {
                write!(f, "chain {} is configured more than once", id)
            }
            ValidationError::EmptyNetworkName(id) => write!(f, "chain {} has an empty name", id),
            ValidationError::NoPaymasters(id) => write!(f, "chain {} has no paymasters", id),
            ValidationError::DuplicatePaymasterName { chain_id, name } => {
                write!(f, "chain {} lists paymaster '{}' twice", chain_id, name)
            }
            ValidationError::ZeroLookupWindow(id) => {
                write!(f, "chain {} has a zero event lookup window", id)
            }
            ValidationError::ZeroPollInterval => write!(f, "poll_interval_ms must be > 0"),
            ValidationError::InvalidRelayUrl { chain_id, url } => {
                write!(f, "chain {} has an invalid relay URL '{}'", chain_id, url)
            }
        }
    }
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    let mut seen_chains = HashSet::new();
    for network in &config.networks {
        let id = network.chain_id;
        if !seen_chains.insert(id) {
            errors.push(ValidationError::DuplicateChainId(id));
        }
        if network.name.trim().is_empty() {
            errors.push(ValidationError::EmptyNetworkName(id));
        }
        if network.paymasters.is_empty() {
            errors.push(ValidationError::NoPaymasters(id));
        }
        if network.lookup_window_blocks == Some(0) {
            errors.push(ValidationError::ZeroLookupWindow(id));
        }

        let mut seen_names = HashSet::new();
        for paymaster in &network.paymasters {
            if !seen_names.insert(paymaster.name.as_str()) {
                errors.push(ValidationError::DuplicatePaymasterName {
                    chain_id: id,
                    name: paymaster.name.clone(),
                });
            }
        }

        for relay in &network.preferred_relays {
            if url::Url::parse(relay).is_err() {
                errors.push(ValidationError::InvalidRelayUrl {
                    chain_id: id,
                    url: relay.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
