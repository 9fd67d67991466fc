//! GSN-style HTTP relay client.
//!
//! # Responsibilities
//! - Bind to a paymaster and read its hub, forwarder and version once
//! - Ping preferred relays and keep only those serving our chain
//! - Build, validate, sign and post relay requests
//! - Emit lifecycle events for every step
//!
//! # Flow of `send_transaction`
//! ```text
//! refresh relays → pick first ready relay → forwarder nonce
//!     → calldata gas → dry run (optional) → EIP-712 sign → POST /relay
//!     → hash of signed worker transaction
//! ```

use alloy::network::TransactionBuilder;
use alloy::primitives::{keccak256, Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::{SolStruct, SolValue};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;

use crate::blockchain::client::{read_call, ChainRpc};
use crate::blockchain::types::GasFees;
use crate::blockchain::wallet::Wallet;
use crate::observability::metrics;
use crate::relay::abi::{
    relay_domain, IForwarder, IPaymaster, IRelayHub, RelayData, RelayRequest,
    DOMAIN_SEPARATOR_NAME,
};
use crate::relay::provider::{RelayProvider, RelayProviderFactory};
use crate::relay::registry::PingResponse;
use crate::relay::types::{
    Environment, RelayClientConfig, RelayError, RelayEvent, RelayInfo, RelayResult,
    RelayStatus, RelayedTransaction, TxHandle,
};

/// Client id stamped on relay data.
const CLIENT_ID: u64 = 1;

/// How far past the worker's current nonce the relay may go.
const MAX_RELAY_NONCE_GAP: u64 = 3;

const BASE_TX_GAS: u64 = 21_000;
const SIGNATURE_LEN: usize = 65;

/// Relay provider talking to GSN relay servers over HTTP.
pub struct GsnRelayProvider {
    chain: Arc<dyn ChainRpc>,
    http: reqwest::Client,
    config: RelayClientConfig,
    status: RelayStatus,
    events: broadcast::Sender<RelayEvent>,
}

impl GsnRelayProvider {
    /// Bind to the configured paymaster.
    ///
    /// Reads hub, forwarder and version from the paymaster contract.
    pub async fn init(chain: Arc<dyn ChainRpc>, config: RelayClientConfig) -> RelayResult<Self> {
        let paymaster = config.paymaster;
        let relay_hub = read_call(chain.as_ref(), paymaster, IPaymaster::getRelayHubCall {}).await?;
        let forwarder =
            read_call(chain.as_ref(), paymaster, IPaymaster::getTrustedForwarderCall {}).await?;
        let paymaster_version =
            read_call(chain.as_ref(), paymaster, IPaymaster::versionPaymasterCall {}).await?;

        let (events, _) = broadcast::channel(64);
        let provider = Self {
            chain,
            http: reqwest::Client::new(),
            status: RelayStatus {
                relay_hub,
                forwarder,
                paymaster,
                paymaster_version,
            },
            config,
            events,
        };

        tracing::info!(
            chain_id = provider.config.chain_id,
            paymaster = %paymaster,
            relay_hub = %relay_hub,
            forwarder = %forwarder,
            version = %provider.status.paymaster_version,
            "Relay provider initialized"
        );
        provider.emit(RelayEvent::Init);

        Ok(provider)
    }

    pub fn config(&self) -> &RelayClientConfig {
        &self.config
    }

    fn emit(&self, event: RelayEvent) {
        metrics::record_relay_event(event.kind());
        // No receivers is fine; events are advisory.
        let _ = self.events.send(event);
    }

    async fn ping(&self, url: &str) -> RelayResult<RelayInfo> {
        let endpoint = format!("{}/getaddr", url.trim_end_matches('/'));
        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| http_err(url, e))?;
        if !response.status().is_success() {
            return Err(RelayError::Http {
                url: url.to_string(),
                message: format!("status {}", response.status()),
            });
        }
        let ping: PingResponse = response.json().await.map_err(|e| http_err(url, e))?;
        ping.into_relay_info(url, self.config.chain_id)
            .map_err(|message| RelayError::Http {
                url: url.to_string(),
                message,
            })
    }

    /// Gas the relay worker pays for the relay call's calldata.
    async fn calldata_gas(&self, encoded: &[u8], worker: Address) -> RelayResult<u64> {
        match self.config.environment {
            Environment::Ethereum => Ok(static_calldata_gas(encoded)),
            Environment::Arbitrum => {
                let probe = TransactionRequest::default()
                    .with_from(worker)
                    .with_to(worker)
                    .with_input(Bytes::copy_from_slice(encoded));
                let estimate = self.chain.estimate_gas(probe).await?;
                Ok(estimate.saturating_sub(BASE_TX_GAS))
            }
        }
    }

    /// Execute the call as the forwarder would, with the sender appended
    /// to the calldata per ERC-2771.
    async fn dry_run(&self, from: Address, tx: &RelayedTransaction) -> RelayResult<()> {
        let mut input = tx.data.to_vec();
        input.extend_from_slice(from.as_slice());
        let call = TransactionRequest::default()
            .with_from(self.status.forwarder)
            .with_to(tx.to)
            .with_input(input)
            .with_gas_limit(self.config.max_viewable_gas_limit);
        self.chain
            .call(call)
            .await
            .map(|_| ())
            .map_err(|e| RelayError::DryRunFailed(e.to_string()))
    }

    async fn post_relay(&self, url: &str, body: &RelayHttpRequest) -> RelayResult<Bytes> {
        let endpoint = format!("{}/relay", url.trim_end_matches('/'));
        let response = self
            .http
            .post(&endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| http_err(url, e))?;
        let status = response.status();
        let reply: RelayHttpResponse = response.json().await.map_err(|e| http_err(url, e))?;

        match (reply.signed_tx, reply.error) {
            (_, Some(message)) => Err(RelayError::Rejected {
                url: url.to_string(),
                message,
            }),
            (Some(signed_tx), None) if status.is_success() => Ok(signed_tx),
            _ => Err(RelayError::Rejected {
                url: url.to_string(),
                message: format!("status {} without signed transaction", status),
            }),
        }
    }
}

fn http_err(url: &str, e: impl std::fmt::Display) -> RelayError {
    RelayError::Http {
        url: url.to_string(),
        message: e.to_string(),
    }
}

/// EIP-2028 calldata cost plus the signature the hub call carries.
pub fn static_calldata_gas(encoded: &[u8]) -> u64 {
    let data: u64 = encoded
        .iter()
        .map(|b| if *b == 0 { 4 } else { 16 })
        .sum();
    data + SIGNATURE_LEN as u64 * 16
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[async_trait]
impl RelayProvider for GsnRelayProvider {
    async fn calculate_gas_fees(&self) -> RelayResult<GasFees> {
        Ok(self.chain.fee_estimate().await?)
    }

    async fn send_transaction(
        &self,
        signer: &Wallet,
        tx: RelayedTransaction,
    ) -> RelayResult<TxHandle> {
        let relays = self.refresh_relays().await?;
        let tried = relays.len();
        let relay = relays
            .into_iter()
            .find(|r| r.ready && r.relay_hub == self.status.relay_hub)
            .ok_or(RelayError::NoReadyRelay(tried))?;
        self.emit(RelayEvent::NextRelay {
            url: relay.url.clone(),
        });

        let from = signer.address();
        let forwarder = self.status.forwarder;
        let nonce = read_call(
            self.chain.as_ref(),
            forwarder,
            IForwarder::getNonceCall { from },
        )
        .await?;

        // Relays refuse tips below their advertised floor.
        let max_priority = tx
            .fees
            .max_priority_fee_per_gas
            .max(relay.min_max_priority_fee_per_gas);
        let max_fee = tx.fees.max_fee_per_gas.max(max_priority);

        let mut request = RelayRequest {
            from,
            to: tx.to,
            value: U256::ZERO,
            gas: U256::from(tx.gas_limit),
            nonce,
            data: tx.data.clone(),
            validUntilTime: U256::from(unix_now() + self.config.request_valid_secs),
            relayData: RelayData {
                maxFeePerGas: U256::from(max_fee),
                maxPriorityFeePerGas: U256::from(max_priority),
                transactionCalldataGasUsed: U256::ZERO,
                relayWorker: relay.relay_worker,
                paymaster: self.status.paymaster,
                forwarder,
                paymasterData: self.config.strategy.paymaster_data(),
                clientId: U256::from(CLIENT_ID),
            },
        };
        let calldata_gas = self
            .calldata_gas(&request.abi_encode(), relay.relay_worker)
            .await?;
        request.relayData.transactionCalldataGasUsed = U256::from(calldata_gas);

        if self.config.dry_run {
            self.emit(RelayEvent::ValidateRequest);
            self.dry_run(from, &tx).await?;
        }

        let hash = request.eip712_signing_hash(&relay_domain(self.config.chain_id, forwarder));
        let signature = signer.sign_hash(hash).await?;
        self.emit(RelayEvent::SignRequest);

        let last_nonce = self.chain.transaction_count(relay.relay_worker).await?;
        let body = RelayHttpRequest {
            relay_request: WireRelayRequest::from(&request),
            metadata: RelayMetadata {
                max_acceptance_budget: relay.max_acceptance_budget.to_string(),
                relay_hub_address: self.status.relay_hub,
                signature: Bytes::copy_from_slice(&signature.as_bytes()),
                approval_data: Bytes::new(),
                relay_max_nonce: last_nonce + MAX_RELAY_NONCE_GAP,
                relay_last_known_nonce: last_nonce,
                domain_separator_name: DOMAIN_SEPARATOR_NAME.to_string(),
            },
        };

        self.emit(RelayEvent::SendToRelayer {
            url: relay.url.clone(),
        });
        let result = self.post_relay(&relay.url, &body).await;
        self.emit(RelayEvent::RelayerResponse {
            success: result.is_ok(),
        });
        let signed_tx = result?;

        let tx_hash = keccak256(&signed_tx);
        tracing::info!(
            relay = %relay.url,
            tx_hash = %tx_hash,
            from = %from,
            to = %tx.to,
            "Relay accepted transaction"
        );

        Ok(TxHandle {
            tx_hash,
            relay_url: relay.url,
        })
    }

    async fn status(&self) -> RelayResult<RelayStatus> {
        Ok(self.status.clone())
    }

    async fn paymaster_balance(&self) -> RelayResult<U256> {
        let balance = read_call(
            self.chain.as_ref(),
            self.status.relay_hub,
            IRelayHub::balanceOfCall {
                target: self.status.paymaster,
            },
        )
        .await?;
        Ok(balance)
    }

    async fn refresh_relays(&self) -> RelayResult<Vec<RelayInfo>> {
        self.emit(RelayEvent::RefreshRelays);

        let mut relays = Vec::with_capacity(self.config.preferred_relays.len());
        for url in &self.config.preferred_relays {
            match self.ping(url).await {
                Ok(info) => relays.push(info),
                Err(e) => tracing::warn!(relay = %url, error = %e, "Skipping relay"),
            }
        }

        tracing::debug!(
            configured = self.config.preferred_relays.len(),
            reachable = relays.len(),
            "Relays refreshed"
        );
        Ok(relays)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<RelayEvent> {
        self.events.subscribe()
    }
}

/// Builds `GsnRelayProvider`s over a shared chain client.
#[derive(Clone)]
pub struct GsnRelayFactory {
    chain: Arc<dyn ChainRpc>,
}

impl GsnRelayFactory {
    pub fn new(chain: Arc<dyn ChainRpc>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl RelayProviderFactory for GsnRelayFactory {
    async fn create(&self, config: RelayClientConfig) -> RelayResult<Arc<dyn RelayProvider>> {
        let provider = GsnRelayProvider::init(self.chain.clone(), config).await?;
        Ok(Arc::new(provider))
    }
}

// Wire format of `POST /relay`. Quantities travel as decimal strings.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayHttpRequest {
    relay_request: WireRelayRequest,
    metadata: RelayMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRelayRequest {
    request: WireForwardRequest,
    relay_data: WireRelayData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireForwardRequest {
    from: Address,
    to: Address,
    value: String,
    gas: String,
    nonce: String,
    data: Bytes,
    valid_until_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRelayData {
    max_fee_per_gas: String,
    max_priority_fee_per_gas: String,
    transaction_calldata_gas_used: String,
    relay_worker: Address,
    paymaster: Address,
    forwarder: Address,
    paymaster_data: Bytes,
    client_id: String,
}

impl From<&RelayRequest> for WireRelayRequest {
    fn from(r: &RelayRequest) -> Self {
        let d = &r.relayData;
        Self {
            request: WireForwardRequest {
                from: r.from,
                to: r.to,
                value: r.value.to_string(),
                gas: r.gas.to_string(),
                nonce: r.nonce.to_string(),
                data: r.data.clone(),
                valid_until_time: r.validUntilTime.to_string(),
            },
            relay_data: WireRelayData {
                max_fee_per_gas: d.maxFeePerGas.to_string(),
                max_priority_fee_per_gas: d.maxPriorityFeePerGas.to_string(),
                transaction_calldata_gas_used: d.transactionCalldataGasUsed.to_string(),
                relay_worker: d.relayWorker,
                paymaster: d.paymaster,
                forwarder: d.forwarder,
                paymaster_data: d.paymasterData.clone(),
                client_id: d.clientId.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayMetadata {
    max_acceptance_budget: String,
    relay_hub_address: Address,
    signature: Bytes,
    approval_data: Bytes,
    relay_max_nonce: u64,
    relay_last_known_nonce: u64,
    domain_separator_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayHttpResponse {
    #[serde(default)]
    signed_tx: Option<Bytes>,
    #[serde(default)]
    error: Option<String>,
}
