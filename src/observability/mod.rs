//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → metrics.rs (counters, gauges)
//!
//! The binary installs:
//!     → logging.rs (EnvFilter + fmt layer, plain or JSON)
//! ```

pub mod logging;
pub mod metrics;
