//! Capture event subscriptions.
//!
//! A subscription is two spawned tasks: a log poller for `FlagCaptured`
//! and a forwarder for relay lifecycle events. The registry keeps their
//! abort handles until the matching handle is passed to unsubscribe.

use alloy::primitives::Address;
use alloy::rpc::types::eth::Filter;
use alloy::sol_types::SolEvent;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::blockchain::client::ChainRpc;
use crate::ctf::cache::BlockTimestampCache;
use crate::ctf::contract::ICaptureTheFlag::FlagCaptured;
use crate::ctf::types::{CaptureEvent, DecodedCapture};
use crate::relay::types::RelayEvent;

/// Callback receiving capture events.
pub type EventCallback = Box<dyn Fn(CaptureEvent) + Send + Sync>;

/// Callback receiving relay lifecycle events.
pub type ProgressCallback = Box<dyn Fn(RelayEvent) + Send + Sync>;

/// Identity of one subscription. Only the facade that issued it can cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    owner: u64,
    id: u64,
}

/// Active subscriptions of one facade.
pub(crate) struct SubscriptionRegistry {
    owner: u64,
    next_id: AtomicU64,
    active: DashMap<u64, Vec<AbortHandle>>,
}

impl SubscriptionRegistry {
    /// Empty registry whose handles carry `owner`.
    pub fn new(owner: u64) -> Self {
        Self {
            owner,
            next_id: AtomicU64::new(1),
            active: DashMap::new(),
        }
    }

    /// Track `tasks` under a fresh handle.
    pub fn register(&self, tasks: Vec<AbortHandle>) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.active.insert(id, tasks);
        SubscriptionHandle {
            owner: self.owner,
            id,
        }
    }

    /// Abort the tasks behind `handle`. Unknown or foreign handles do nothing.
    pub fn cancel(&self, handle: &SubscriptionHandle) -> bool {
        if handle.owner != self.owner {
            return false;
        }
        match self.active.remove(&handle.id) {
            Some((_, tasks)) => {
                for task in tasks {
                    task.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.active.len()
    }
}

/// Everything the log poller needs, owned by the task.
pub(crate) struct CaptureWatcher {
    pub chain: Arc<dyn ChainRpc>,
    pub timestamps: BlockTimestampCache,
    pub contract: Address,
    pub poll_interval: Duration,
}

impl CaptureWatcher {
    /// Poll for new captures from the current head onward.
    pub async fn run(self, on_event: EventCallback) {
        let mut last_block: Option<u64> = None;
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let head = match self.chain.block_number().await {
                Ok(head) => head,
                Err(e) => {
                    tracing::warn!(error = %e, "Capture watcher failed to read head block");
                    continue;
                }
            };

            let from = match last_block {
                // First tick only anchors the watcher at the head.
                None => {
                    tracing::debug!(block = head, contract = %self.contract, "Capture watcher started");
                    last_block = Some(head);
                    continue;
                }
                Some(last) if head <= last => continue,
                Some(last) => last + 1,
            };

            match self.deliver(from, head, &on_event).await {
                Ok(()) => last_block = Some(head),
                Err(e) => tracing::warn!(error = %e, from, to = head, "Capture poll failed"),
            }
        }
    }

    /// Deliver the captures mined in `from..=to`.
    ///
    /// The batch is decoded and timestamped before the first callback. A
    /// batch that fails delivers nothing.
    async fn deliver(
        &self,
        from: u64,
        to: u64,
        on_event: &EventCallback,
    ) -> Result<(), crate::blockchain::types::BlockchainError> {
        let filter = Filter::new()
            .address(self.contract)
            .event(FlagCaptured::SIGNATURE)
            .from_block(from)
            .to_block(to);

        let logs = self.chain.logs(&filter).await?;
        let mut batch = Vec::with_capacity(logs.len());
        for log in &logs {
            let Some(capture) = DecodedCapture::from_log(log) else {
                tracing::warn!(tx_hash = ?log.transaction_hash, "Ignoring undecodable capture log");
                continue;
            };
            let timestamp = self
                .timestamps
                .get_or_fetch(self.chain.as_ref(), capture.block_number)
                .await?;
            batch.push(capture.with_timestamp(timestamp));
        }

        for event in batch {
            on_event(event);
        }
        Ok(())
    }
}

/// Forward relay lifecycle events until the stream closes.
pub(crate) async fn forward_relay_events(
    mut events: broadcast::Receiver<RelayEvent>,
    on_progress: ProgressCallback,
) {
    loop {
        match events.recv().await {
            Ok(event) => on_progress(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Relay event listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
