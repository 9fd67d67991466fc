//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (signer private key)
//!     → wallet.rs (key loading, EIP-712 hash signing)
//! Wallet JSON-RPC endpoint
//!     → connection.rs (chain id, network id, accounts, chain switch)
//! Node JSON-RPC endpoint
//!     → client.rs (ChainRpc: blocks, logs, calls, fee estimation)
//!     → transaction.rs (confirmation polling)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data

pub mod client;
pub mod connection;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{read_call, BlockchainClient, ChainRpc};
pub use connection::{RpcWallet, WalletConnection};
pub use transaction::{wait_for_confirmation, DEFAULT_POLL_INTERVAL};
pub use types::{
    BlockchainError, BlockchainResult, ChainId, ConfirmationStatus, GasFees, ParseChainIdError,
};
pub use wallet::Wallet;
