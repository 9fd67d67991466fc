//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → network table handed to bootstrap, one NetworkConfig to the facade
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The active network is passed explicitly, never stored globally

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AppConfig;
pub use schema::NetworkConfig;
pub use schema::ObservabilityConfig;
pub use schema::PaymasterConfig;
pub use schema::PaymasterDeployment;
