//! The CaptureTheFlag contract facade.
//!
//! # Responsibilities
//! - Read the current flag holder
//! - List and stream `FlagCaptured` events with block timestamps
//! - Submit sponsored captures through the relay signer
//! - Surface relay status
//!
//! Remote failures propagate unchanged, except in `recent_events`, which
//! degrades to an empty list. No call is retried.

use alloy::primitives::{Address, U256};
use alloy::rpc::types::eth::Filter;
use alloy::sol_types::{SolCall, SolEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::client::{read_call, ChainRpc};
use crate::blockchain::types::GasFees;
use crate::config::NetworkConfig;
use crate::ctf::cache::BlockTimestampCache;
use crate::ctf::contract::ICaptureTheFlag;
use crate::ctf::contract::ICaptureTheFlag::FlagCaptured;
use crate::ctf::subscription::{
    forward_relay_events, CaptureWatcher, EventCallback, ProgressCallback, SubscriptionHandle,
    SubscriptionRegistry,
};
use crate::ctf::types::{
    CaptureEvent, CtfResult, DecodedCapture, CAPTURE_GAS_LIMIT, DEFAULT_LOOKUP_WINDOW_BLOCKS,
};
use crate::observability::metrics;
use crate::relay::abi::IPaymaster;
use crate::relay::provider::RelaySigner;
use crate::relay::registry::is_valid_relay_url;
use crate::relay::types::{RelayStatus, RelayedTransaction, TxHandle};

static NEXT_FACADE_ID: AtomicU64 = AtomicU64::new(1);

/// Client for one deployed CaptureTheFlag contract.
pub struct CaptureTheFlag {
    chain: Arc<dyn ChainRpc>,
    signer: RelaySigner,
    network: NetworkConfig,
    timestamps: BlockTimestampCache,
    subscriptions: SubscriptionRegistry,
    poll_interval: Duration,
}

impl CaptureTheFlag {
    /// Create a facade for the contract of `network`.
    pub fn new(
        chain: Arc<dyn ChainRpc>,
        signer: RelaySigner,
        network: NetworkConfig,
        poll_interval: Duration,
    ) -> Self {
        tracing::info!(
            chain_id = network.chain_id,
            network = %network.name,
            contract = %network.contract_address,
            signer = %signer.address(),
            "CaptureTheFlag facade ready"
        );

        Self {
            chain,
            signer,
            network,
            timestamps: BlockTimestampCache::new(),
            subscriptions: SubscriptionRegistry::new(NEXT_FACADE_ID.fetch_add(1, Ordering::Relaxed)),
            poll_interval,
        }
    }

    /// Network this facade is bound to.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.network.contract_address
    }

    /// Account relayed captures are sent from.
    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    /// Current flag holder, read from contract storage.
    pub async fn current_holder(&self) -> CtfResult<Address> {
        let holder = read_call(
            self.chain.as_ref(),
            self.address(),
            ICaptureTheFlag::currentHolderCall {},
        )
        .await?;
        Ok(holder)
    }

    /// Stream future captures to `on_event`, and relay lifecycle events to
    /// `on_progress` when given.
    ///
    /// Listeners run until the returned handle is passed to `unsubscribe`.
    pub fn subscribe<F>(
        &self,
        on_event: F,
        on_progress: Option<ProgressCallback>,
    ) -> SubscriptionHandle
    where
        F: Fn(CaptureEvent) + Send + Sync + 'static,
    {
        let watcher = CaptureWatcher {
            chain: self.chain.clone(),
            timestamps: self.timestamps.clone(),
            contract: self.address(),
            poll_interval: self.poll_interval,
        };
        let on_event: EventCallback = Box::new(on_event);
        let mut tasks = vec![tokio::spawn(watcher.run(on_event)).abort_handle()];

        if let Some(on_progress) = on_progress {
            // Subscribe before spawning so no event emitted from here on is lost.
            let events = self.signer.provider().subscribe_events();
            tasks.push(tokio::spawn(forward_relay_events(events, on_progress)).abort_handle());
        }

        let handle = self.subscriptions.register(tasks);
        tracing::debug!(?handle, "Subscribed to capture events");
        handle
    }

    /// Stop the listeners behind `handle`.
    ///
    /// Returns `false` and does nothing when the handle is not an active
    /// subscription of this facade.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let removed = self.subscriptions.cancel(handle);
        if !removed {
            tracing::debug!(?handle, "Unsubscribe ignored for unknown handle");
        }
        removed
    }

    /// The last `count` captures inside the lookback window, oldest first.
    ///
    /// A failed scan yields an empty list.
    pub async fn recent_events(&self, count: usize) -> Vec<CaptureEvent> {
        match self.scan_events(count).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "Event scan failed, returning no events");
                metrics::record_event_scan_failure();
                Vec::new()
            }
        }
    }

    async fn scan_events(&self, count: usize) -> CtfResult<Vec<CaptureEvent>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let head = self.chain.block_number().await?;
        let window = self
            .network
            .lookup_window_blocks
            .unwrap_or(DEFAULT_LOOKUP_WINDOW_BLOCKS);
        let from = head.saturating_sub(window).max(1);

        let filter = Filter::new()
            .address(self.address())
            .event(FlagCaptured::SIGNATURE)
            .from_block(from)
            .to_block(head);
        let logs = self.chain.logs(&filter).await?;

        let captures: Vec<DecodedCapture> = logs.iter().filter_map(DecodedCapture::from_log).collect();
        let start = captures.len().saturating_sub(count);

        let mut events = Vec::with_capacity(captures.len() - start);
        for capture in captures.into_iter().skip(start) {
            let timestamp = self.block_timestamp(capture.block_number).await?;
            events.push(capture.with_timestamp(timestamp));
        }

        tracing::debug!(
            from,
            to = head,
            found = logs.len(),
            returned = events.len(),
            "Scanned capture events"
        );
        Ok(events)
    }

    /// Timestamp of a block, memoized for the facade's lifetime.
    pub async fn block_timestamp(&self, block_number: u64) -> CtfResult<u64> {
        Ok(self
            .timestamps
            .get_or_fetch(self.chain.as_ref(), block_number)
            .await?)
    }

    /// Submit a sponsored `captureTheFlag()` call.
    ///
    /// Returns once a relay accepts the transaction. Waiting for it to be
    /// mined is up to the caller.
    pub async fn capture_flag(&self) -> CtfResult<TxHandle> {
        let gas_price = self.chain.gas_price().await?;
        tracing::debug!(gas_price, "Network gas price");

        let fees = self.signer.provider().calculate_gas_fees().await?;
        // Always bid the full fee cap as tip.
        let fees = GasFees {
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_fee_per_gas,
        };

        let tx = RelayedTransaction {
            to: self.address(),
            data: ICaptureTheFlag::captureTheFlagCall {}.abi_encode().into(),
            gas_limit: CAPTURE_GAS_LIMIT,
            fees,
        };
        let handle = self.signer.send_transaction(tx).await?;

        metrics::record_transaction_submitted();
        tracing::info!(
            tx_hash = %handle.tx_hash,
            relay = %handle.relay_url,
            max_fee_per_gas = fees.max_fee_per_gas,
            "Capture submitted"
        );
        Ok(handle)
    }

    /// Hub, forwarder and paymaster the relay is bound to.
    pub async fn relay_status(&self) -> CtfResult<RelayStatus> {
        Ok(self.signer.provider().status().await?)
    }

    /// Paymaster deposit on the relay hub.
    pub async fn paymaster_balance(&self) -> CtfResult<U256> {
        Ok(self.signer.provider().paymaster_balance().await?)
    }

    /// Refresh the relay registry and count relays with usable URLs.
    pub async fn active_relay_count(&self) -> CtfResult<usize> {
        let relays = self.signer.provider().refresh_relays().await?;
        Ok(relays
            .iter()
            .filter(|relay| is_valid_relay_url(&relay.url))
            .count())
    }

    /// Version string of the paymaster at `address`.
    pub async fn paymaster_version(&self, address: Address) -> CtfResult<String> {
        let version = read_call(
            self.chain.as_ref(),
            address,
            IPaymaster::versionPaymasterCall {},
        )
        .await?;
        Ok(version)
    }
}

impl std::fmt::Debug for CaptureTheFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureTheFlag")
            .field("chain_id", &self.network.chain_id)
            .field("contract", &self.network.contract_address)
            .field("signer", &self.signer)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
