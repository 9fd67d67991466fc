//! CaptureTheFlag contract subsystem.
//!
//! # Data Flow
//! ```text
//! ChainRpc ──reads──▶ facade.rs ◀──sends── RelaySigner (relay provider)
//!                        │
//!                        ├─ cache.rs (block number → timestamp, never evicted)
//!                        └─ subscription.rs (log poller + relay event forwarder)
//! ```

pub mod cache;
pub mod contract;
pub mod facade;
pub mod subscription;
pub mod types;

pub use cache::BlockTimestampCache;
pub use facade::CaptureTheFlag;
pub use subscription::{ProgressCallback, SubscriptionHandle};
pub use types::{
    CaptureEvent, CtfError, CtfResult, CAPTURE_GAS_LIMIT, DEFAULT_EVENT_COUNT,
    DEFAULT_LOOKUP_WINDOW_BLOCKS,
};
