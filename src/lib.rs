//! Capture The Flag relay client library.
//!
//! Reads and streams the state of a deployed CaptureTheFlag contract and
//! submits gas-sponsored captures through a meta-transaction relay.

// Chain access
pub mod blockchain;
pub mod config;

// Relaying
pub mod network;
pub mod relay;

// Contract facade
pub mod ctf;

// Cross-cutting concerns
pub mod observability;

pub use config::AppConfig;
pub use ctf::CaptureTheFlag;
pub use network::{connect, supported_networks, switch_network, BootstrapError, BootstrapOptions};
