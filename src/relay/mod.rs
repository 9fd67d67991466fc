//! Gas-sponsoring relay subsystem.
//!
//! # Data Flow
//! ```text
//! RelayClientConfig (resolved by network bootstrap)
//!     → RelayProviderFactory::create
//!     → RelayProvider (gsn.rs: HTTP relays + paymaster contracts)
//!     → RelaySigner (signing wallet + provider), handed to the facade
//!
//! RelayProvider::subscribe_events → RelayEvent stream → facade progress callback
//! ```
//!
//! # Design Decisions
//! - The facade only sees the `RelayProvider` trait; status is a query on it
//! - Relay URLs are validated by one predicate shared by status reporting

pub mod abi;
pub mod gsn;
pub mod provider;
pub mod registry;
pub mod types;

pub use gsn::{GsnRelayFactory, GsnRelayProvider};
pub use provider::{RelayProvider, RelayProviderFactory, RelaySigner};
pub use registry::is_valid_relay_url;
pub use types::{
    Environment, RelayClientConfig, RelayError, RelayEvent, RelayInfo, RelayResult,
    RelayStatus, RelayStrategy, RelayedTransaction, TxHandle,
};
