//! CaptureTheFlag relay client CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   ctf.toml ──▶ config ──▶ network::connect ◀── wallet JSON-RPC (chain id)
//!                                 │
//!                                 ▼
//!                 RelayProviderFactory ──▶ RelaySigner
//!                                 │
//!                                 ▼
//!   chain JSON-RPC ◀──────── CaptureTheFlag ──▶ relay servers (/getaddr, /relay)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use ctf_relay::blockchain::transaction::{wait_for_confirmation, DEFAULT_POLL_INTERVAL};
use ctf_relay::blockchain::types::ConfirmationStatus;
use ctf_relay::blockchain::{BlockchainClient, ChainRpc, Wallet};
use ctf_relay::config::loader::load_config;
use ctf_relay::ctf::{ProgressCallback, DEFAULT_EVENT_COUNT};
use ctf_relay::network::{self, BootstrapOptions};
use ctf_relay::observability::logging;
use ctf_relay::relay::{GsnRelayFactory, RelayEvent};
use ctf_relay::{AppConfig, CaptureTheFlag};

/// Seconds to wait for a relayed capture to be mined.
const CONFIRMATION_TIMEOUT_SECS: u64 = 300;

#[derive(Parser)]
#[command(name = "ctf-relay")]
#[command(about = "Capture the flag through a gas-sponsoring relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "ctf.toml")]
    config: PathBuf,

    /// List local development chains too
    #[arg(long)]
    local: bool,

    /// Paymaster to use, by configured name
    #[arg(short, long)]
    paymaster: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List networks the wallet can switch to
    Networks,
    /// Ask the wallet to switch chain
    Switch {
        /// Decimal chain id
        chain_id: String,
    },
    /// Show the current flag holder
    Holder,
    /// Capture the flag
    Capture {
        /// Wait until the transaction is mined
        #[arg(long)]
        wait: bool,
    },
    /// Show the most recent captures
    Events {
        #[arg(short = 'n', long, default_value_t = DEFAULT_EVENT_COUNT)]
        count: usize,
    },
    /// Show relay and paymaster status
    Status,
    /// Stream captures and relay progress until interrupted
    Watch,
}

#[derive(Serialize)]
struct StatusReport {
    network: String,
    chain_id: u64,
    contract: String,
    relay_hub: String,
    forwarder: String,
    paymaster: String,
    paymaster_version: String,
    paymaster_balance: String,
    active_relays: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    config.local |= cli.local;
    logging::init(&config.observability);

    tracing::info!(
        config = %cli.config.display(),
        networks = config.networks.len(),
        "ctf-relay v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    match cli.command {
        Commands::Networks => {
            let networks: Vec<_> = network::supported_networks(&config, config.local)
                .into_iter()
                .map(|(chain_id, name)| serde_json::json!({ "chain_id": chain_id, "name": name }))
                .collect();
            print_json(&networks)?;
        }
        Commands::Switch { chain_id } => {
            let wallet = network::open_wallet(&config)?;
            network::switch_network(&wallet, &chain_id).await?;
            print_json(&serde_json::json!({ "switched_to": chain_id }))?;
        }
        command => {
            let options = BootstrapOptions {
                paymaster: cli.paymaster,
            };
            let (ctf, chain) = bootstrap(&config, &options).await?;
            run(command, &ctf, chain.as_ref()).await?;
        }
    }

    Ok(())
}

async fn bootstrap(
    config: &AppConfig,
    options: &BootstrapOptions,
) -> Result<(CaptureTheFlag, Arc<dyn ChainRpc>), Box<dyn std::error::Error>> {
    let wallet = network::open_wallet(config)?;
    let chain: Arc<dyn ChainRpc> = Arc::new(BlockchainClient::new(&config.rpc.url)?);
    let signer = Wallet::from_env()?;
    let factory = GsnRelayFactory::new(chain.clone());

    let ctf = network::connect(&wallet, config, chain.clone(), signer, &factory, options).await?;
    Ok((ctf, chain))
}

async fn run(
    command: Commands,
    ctf: &CaptureTheFlag,
    chain: &dyn ChainRpc,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Holder => {
            let holder = ctf.current_holder().await?;
            print_json(&serde_json::json!({ "holder": holder }))?;
        }
        Commands::Capture { wait } => {
            let handle = ctf.capture_flag().await?;
            print_json(&handle)?;

            if wait {
                let status = wait_for_confirmation(
                    chain,
                    handle.tx_hash,
                    CONFIRMATION_TIMEOUT_SECS,
                    DEFAULT_POLL_INTERVAL,
                )
                .await?;
                let report = match status {
                    ConfirmationStatus::Confirmed { block_number } => {
                        serde_json::json!({ "status": "confirmed", "block_number": block_number })
                    }
                    ConfirmationStatus::Failed(reason) => {
                        serde_json::json!({ "status": "failed", "reason": reason })
                    }
                };
                print_json(&report)?;
            }
        }
        Commands::Events { count } => {
            let events = ctf.recent_events(count).await;
            print_json(&events)?;
        }
        Commands::Status => {
            let status = ctf.relay_status().await?;
            let report = StatusReport {
                network: ctf.network().name.clone(),
                chain_id: ctf.network().chain_id,
                contract: ctf.address().to_string(),
                relay_hub: status.relay_hub.to_string(),
                forwarder: status.forwarder.to_string(),
                paymaster: status.paymaster.to_string(),
                paymaster_version: status.paymaster_version,
                paymaster_balance: ctf.paymaster_balance().await?.to_string(),
                active_relays: ctf.active_relay_count().await?,
            };
            print_json(&report)?;
        }
        Commands::Watch => {
            let on_progress: ProgressCallback = Box::new(|event: RelayEvent| print_line(&event));
            let handle = ctf.subscribe(|event| print_line(&event), Some(on_progress));
            tracing::info!("Watching for captures, press Ctrl+C to stop");

            tokio::signal::ctrl_c().await?;
            ctf.unsubscribe(&handle);
            tracing::info!("Stopped watching");
        }
        Commands::Networks | Commands::Switch { .. } => {}
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_line<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::error!(error = %e, "Failed to encode event"),
    }
}
