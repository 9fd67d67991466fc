//! Shared mocks for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, Log as PrimitiveLog, TxHash, B256, U256};
use alloy::rpc::types::eth::{Filter, Log};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use ctf_relay::blockchain::{BlockchainError, BlockchainResult, ChainRpc, GasFees, Wallet, WalletConnection};
use ctf_relay::config::{NetworkConfig, PaymasterConfig};
use ctf_relay::ctf::contract::ICaptureTheFlag::FlagCaptured;
use ctf_relay::ctf::CaptureTheFlag;
use ctf_relay::relay::{
    RelayClientConfig, RelayEvent, RelayInfo, RelayProvider, RelayProviderFactory, RelayResult,
    RelaySigner, RelayStatus, RelayedTransaction, TxHandle,
};

/// Anvil's first development key.
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const CONTRACT: Address = Address::repeat_byte(0xcf);
pub const BASE_TIMESTAMP: u64 = 1_700_000_000;

pub fn test_wallet() -> Wallet {
    Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap()
}

/// Block timestamp the mock chain reports for `number`.
pub fn timestamp_of(number: u64) -> u64 {
    BASE_TIMESTAMP + number * 12
}

/// In-memory chain with call counters and failure switches.
pub struct MockChain {
    pub chain_id: u64,
    head: AtomicU64,
    logs: Mutex<Vec<Log>>,
    responses: Mutex<HashMap<[u8; 4], Bytes>>,
    pub calls: Mutex<Vec<TransactionRequest>>,
    pub fees: GasFees,
    pub timestamp_queries: AtomicUsize,
    pub gas_price_queries: AtomicUsize,
    pub fail_logs: AtomicBool,
    pub fail_timestamps: AtomicBool,
    receipts: Mutex<HashMap<TxHash, (usize, TransactionReceipt)>>,
    pub receipt_queries: AtomicUsize,
}

impl MockChain {
    pub fn new(chain_id: u64, head: u64) -> Self {
        Self {
            chain_id,
            head: AtomicU64::new(head),
            logs: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fees: GasFees {
                max_fee_per_gas: 40_000_000_000,
                max_priority_fee_per_gas: 1_500_000_000,
            },
            timestamp_queries: AtomicUsize::new(0),
            gas_price_queries: AtomicUsize::new(0),
            fail_logs: AtomicBool::new(false),
            fail_timestamps: AtomicBool::new(false),
            receipts: Mutex::new(HashMap::new()),
            receipt_queries: AtomicUsize::new(0),
        }
    }

    pub fn set_head(&self, head: u64) {
        self.head.store(head, Ordering::SeqCst);
    }

    /// Record a `FlagCaptured` log in `block`.
    pub fn push_capture(&self, block: u64, previous: Address, current: Address) {
        let event = FlagCaptured {
            previousHolder: previous,
            currentHolder: current,
        };
        let log = Log {
            inner: PrimitiveLog {
                address: CONTRACT,
                data: event.encode_log_data(),
            },
            block_number: Some(block),
            transaction_hash: Some(B256::with_last_byte(block as u8)),
            ..Default::default()
        };
        self.logs.lock().unwrap().push(log);
    }

    /// Mine `tx_hash` in `block`. Lookups report it pending `pending_polls` times first.
    pub fn mine(&self, tx_hash: TxHash, block: u64, success: bool, pending_polls: usize) {
        let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "blockHash": B256::with_last_byte(block as u8),
            "blockNumber": format!("{block:#x}"),
            "from": test_wallet().address(),
            "to": CONTRACT,
            "cumulativeGasUsed": "0x61a8",
            "gasUsed": "0x61a8",
            "contractAddress": null,
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "type": "0x2",
            "status": if success { "0x1" } else { "0x0" },
            "effectiveGasPrice": "0x4a817c800"
        }))
        .unwrap();
        self.receipts
            .lock()
            .unwrap()
            .insert(tx_hash, (pending_polls, receipt));
    }

    /// Answer calls to `C` with ABI-encoded `output`.
    pub fn respond<C: SolCall>(&self, output: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .insert(C::SELECTOR, Bytes::from(output));
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn block_timestamp(&self, number: u64) -> BlockchainResult<u64> {
        self.timestamp_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_timestamps.load(Ordering::SeqCst) {
            return Err(BlockchainError::BlockNotFound(number));
        }
        Ok(timestamp_of(number))
    }

    async fn transaction_count(&self, _address: Address) -> BlockchainResult<u64> {
        Ok(9)
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.gas_price_queries.fetch_add(1, Ordering::SeqCst);
        Ok(20_000_000_000)
    }

    async fn fee_estimate(&self) -> BlockchainResult<GasFees> {
        Ok(self.fees)
    }

    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        let selector: Option<[u8; 4]> = tx
            .input
            .input()
            .and_then(|data| data.get(..4))
            .and_then(|s| s.try_into().ok());
        self.calls.lock().unwrap().push(tx);

        selector
            .and_then(|s| self.responses.lock().unwrap().get(&s).cloned())
            .ok_or_else(|| BlockchainError::Rpc("execution reverted".into()))
    }

    async fn estimate_gas(&self, _tx: TransactionRequest) -> BlockchainResult<u64> {
        Ok(25_000)
    }

    async fn logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>> {
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(BlockchainError::Rpc("query returned more than 10000 results".into()));
        }
        let from = filter.get_from_block().unwrap_or(0);
        let to = filter.get_to_block().unwrap_or(u64::MAX);
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.block_number.is_some_and(|n| n >= from && n <= to))
            .cloned()
            .collect())
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        self.receipt_queries.fetch_add(1, Ordering::SeqCst);
        let mut receipts = self.receipts.lock().unwrap();
        match receipts.get_mut(&tx_hash) {
            Some((0, receipt)) => Ok(Some(receipt.clone())),
            Some((pending, _)) => {
                *pending -= 1;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Relay provider that records what it is asked to send.
pub struct MockRelay {
    pub fees: GasFees,
    pub relays: Vec<RelayInfo>,
    pub sent: Mutex<Vec<RelayedTransaction>>,
    pub status: RelayStatus,
    events: broadcast::Sender<RelayEvent>,
}

impl MockRelay {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            fees: GasFees {
                max_fee_per_gas: 50_000_000_000,
                max_priority_fee_per_gas: 2_000_000_000,
            },
            relays: Vec::new(),
            sent: Mutex::new(Vec::new()),
            status: RelayStatus {
                relay_hub: Address::repeat_byte(0x0b),
                forwarder: Address::repeat_byte(0x0f),
                paymaster: Address::repeat_byte(0x0a),
                paymaster_version: "3.0.0-beta.3+opengsn.accepteverything.ipaymaster".into(),
            },
            events,
        }
    }

    pub fn with_relays(urls: &[&str]) -> Self {
        let mut relay = Self::new();
        relay.relays = urls.iter().map(|url| relay_info(url)).collect();
        relay
    }

    pub fn emit(&self, event: RelayEvent) {
        let _ = self.events.send(event);
    }
}

pub fn relay_info(url: &str) -> RelayInfo {
    RelayInfo {
        url: url.to_string(),
        relay_worker: Address::repeat_byte(0x31),
        relay_manager: Address::repeat_byte(0x32),
        relay_hub: Address::repeat_byte(0x0b),
        ready: true,
        min_max_priority_fee_per_gas: 0,
        max_acceptance_budget: 285_252,
        version: "3.0.0".into(),
    }
}

#[async_trait]
impl RelayProvider for MockRelay {
    async fn calculate_gas_fees(&self) -> RelayResult<GasFees> {
        Ok(self.fees)
    }

    async fn send_transaction(
        &self,
        _signer: &Wallet,
        tx: RelayedTransaction,
    ) -> RelayResult<TxHandle> {
        self.sent.lock().unwrap().push(tx);
        self.emit(RelayEvent::SendToRelayer {
            url: "https://relay.example.org".into(),
        });
        self.emit(RelayEvent::RelayerResponse { success: true });
        Ok(TxHandle {
            tx_hash: B256::repeat_byte(0xab),
            relay_url: "https://relay.example.org".into(),
        })
    }

    async fn status(&self) -> RelayResult<RelayStatus> {
        Ok(self.status.clone())
    }

    async fn paymaster_balance(&self) -> RelayResult<U256> {
        Ok(U256::from(5_000_000_000_000_000_000u128))
    }

    async fn refresh_relays(&self) -> RelayResult<Vec<RelayInfo>> {
        Ok(self.relays.clone())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<RelayEvent> {
        self.events.subscribe()
    }
}

/// Factory that counts constructions and hands out one shared mock.
pub struct CountingFactory {
    pub relay: Arc<MockRelay>,
    pub created: AtomicUsize,
    pub last_config: Mutex<Option<RelayClientConfig>>,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self {
            relay: Arc::new(MockRelay::new()),
            created: AtomicUsize::new(0),
            last_config: Mutex::new(None),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayProviderFactory for CountingFactory {
    async fn create(&self, config: RelayClientConfig) -> RelayResult<Arc<dyn RelayProvider>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.last_config.lock().unwrap() = Some(config);
        Ok(self.relay.clone())
    }
}

/// Wallet endpoint reporting fixed ids and recording switch requests.
pub struct MockWallet {
    pub chain_id: u64,
    pub network_id: u64,
    pub accounts: Vec<Address>,
    pub switched: Mutex<Vec<String>>,
}

impl MockWallet {
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            chain_id,
            network_id: chain_id,
            accounts: vec![test_wallet().address()],
            switched: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WalletConnection for MockWallet {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        Ok(self.chain_id)
    }

    async fn network_id(&self) -> BlockchainResult<u64> {
        Ok(self.network_id)
    }

    async fn request_accounts(&self) -> BlockchainResult<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn switch_chain(&self, chain_id_hex: &str) -> BlockchainResult<()> {
        self.switched.lock().unwrap().push(chain_id_hex.to_string());
        Ok(())
    }
}

pub fn accept_everything(name: &str) -> PaymasterConfig {
    PaymasterConfig {
        name: name.into(),
        paymaster_type: "AcceptEverythingPaymaster".into(),
        address: Some(Address::repeat_byte(0x0a)),
        owner: None,
        token: None,
    }
}

pub fn network_config(chain_id: u64) -> NetworkConfig {
    NetworkConfig {
        chain_id,
        name: format!("test-{chain_id}"),
        contract_address: CONTRACT,
        paymasters: vec![accept_everything("default")],
        preferred_relays: vec!["https://relay.example.org".into()],
        lookup_window_blocks: None,
        local: false,
    }
}

/// Facade over `chain` and `relay` with a short poll interval.
pub fn facade(chain: Arc<MockChain>, relay: Arc<MockRelay>) -> CaptureTheFlag {
    CaptureTheFlag::new(
        chain,
        RelaySigner::new(test_wallet(), relay),
        network_config(5),
        Duration::from_millis(50),
    )
}

/// Start a mock relay server answering `/getaddr` and `/relay`.
///
/// Returns its base URL and the raw requests it received.
pub async fn start_mock_relay(
    ping_body: String,
    relay_body: String,
) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let ping_body = ping_body.clone();
                    let relay_body = relay_body.clone();
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        let request = read_request(&mut socket).await;
                        let body = if request.starts_with("GET /getaddr") {
                            ping_body
                        } else {
                            relay_body
                        };
                        seen.lock().unwrap().push(request);

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (format!("http://{}", addr), requests)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Start a JSON-RPC endpoint answering the wallet methods as `wallet` would.
///
/// Returns its URL and the `(method, params)` pairs it received.
pub async fn start_mock_wallet_rpc(
    wallet: MockWallet,
) -> (String, Arc<Mutex<Vec<(String, serde_json::Value)>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let raw = read_request(&mut socket).await;
            let body = raw.split("\r\n\r\n").nth(1).unwrap_or_default();
            let request: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
            let method = request["method"].as_str().unwrap_or_default().to_string();
            seen.lock()
                .unwrap()
                .push((method.clone(), request["params"].clone()));

            let result = match method.as_str() {
                "eth_chainId" => serde_json::json!(format!("{:#x}", wallet.chain_id)),
                "net_version" => serde_json::json!(wallet.network_id.to_string()),
                "eth_requestAccounts" => serde_json::json!(wallet.accounts),
                _ => serde_json::Value::Null,
            };
            let response = serde_json::json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "result": result,
            })
            .to_string();
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                response.len(),
                response
            );
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), requests)
}
