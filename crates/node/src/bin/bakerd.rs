// Path: crates/node/src/bin/bakerd.rs
#![forbid(unsafe_code)]

use anyhow::{anyhow, Context, Result};
use baker_api::notify::Notifier;
use baker_api::storage::{DelegateStore, EndpointRegistry, RightsCache, WatermarkStore};
use baker_client::{HeadMonitor, HttpChainClient, RemoteSigner, WebhookNotifier};
use baker_storage::RedbBakerStore;
use baker_telemetry::init::{default_directive, init_tracing, LogFormat};
use baker_types::config::{BakerConfig, Network};
use baker_types::{OperationKind, SignerType};
use baker_validator::common::NotifierFactory;
use baker_validator::{
    BakerServices, BakerSettings, BlockEventLoop, NotificationService, SignerRouter,
};
use clap::{Parser, Subcommand};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const HEAD_CHANNEL_CAPACITY: usize = 16;

#[derive(Parser, Debug)]
#[clap(name = "bakerd", version, about = "Proof-of-stake baking daemon")]
struct Opts {
    #[clap(long, help = "Network to bake on (mainnet, granadanet, hangzhounet).")]
    network: Option<Network>,
    #[clap(long, help = "Enable debug logging.")]
    debug: bool,
    #[clap(long, help = "Enable trace logging.")]
    trace: bool,
    #[clap(long = "dry-run-endorse", help = "Sign endorsements but never inject them.")]
    dry_run_endorse: bool,
    #[clap(long = "dry-run-bake", help = "Sign blocks but never inject them.")]
    dry_run_bake: bool,
    #[clap(long, help = "Bind address of the status and metrics server.")]
    webuiaddr: Option<String>,
    #[clap(long, help = "Bind port of the status and metrics server.")]
    webuiport: Option<u16>,
    #[clap(long, help = "Directory holding the database.")]
    datadir: Option<PathBuf>,
    #[clap(long, help = "Path to a bakerd.toml file with configuration overrides.")]
    config: Option<PathBuf>,
    #[clap(long = "log-json", help = "Emit logs as JSON lines.")]
    log_json: bool,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the daemon (default).
    Run,
    /// Store the delegate and its signer backend.
    SetDelegate {
        pkh: String,
        #[clap(long, default_value = "")]
        secret_key_ref: String,
        #[clap(long, default_value = "remote")]
        signer: SignerType,
    },
    /// Store a hardware-wallet delegate and its derivation path.
    SetLedger { pkh: String, bip_path: String },
    /// Stop producing blocks and endorsements until resumed.
    Pause,
    /// Undo a previous pause.
    Resume,
    /// Manage chain RPC endpoints.
    Endpoints {
        #[clap(subcommand)]
        action: EndpointAction,
    },
    /// Manage notifiers.
    Notifiers {
        #[clap(subcommand)]
        action: NotifierAction,
    },
    /// Remove a submission intent left behind by an interrupted submission.
    ClearIntent { kind: OperationKind, level: u64 },
    /// Print the persisted state as JSON.
    Status,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum EndpointAction {
    Add { url: String },
    List,
    Remove { id: u64 },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum NotifierAction {
    /// Print the stored notifier configuration.
    Show,
    /// Replace the configuration of a notifier with a JSON document.
    Set { name: String, config: String },
    /// Deliver a test message through a notifier.
    Test { name: String },
}

/// Reads the optional TOML file and layers the command line flags on top.
fn load_config(opts: &Opts) -> Result<BakerConfig> {
    let mut cfg: BakerConfig = match &opts.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => BakerConfig::default(),
    };
    if let Some(network) = opts.network {
        cfg.network = network;
    }
    if let Some(dir) = &opts.datadir {
        cfg.data_dir = dir.clone();
    }
    if let Some(addr) = &opts.webuiaddr {
        cfg.status_addr = addr.clone();
    }
    if let Some(port) = opts.webuiport {
        cfg.status_port = port;
    }
    cfg.dry_run_bake |= opts.dry_run_bake;
    cfg.dry_run_endorse |= opts.dry_run_endorse;
    cfg.log_debug |= opts.debug;
    cfg.log_trace |= opts.trace;
    cfg.validate().map_err(|e| anyhow!(e))?;
    Ok(cfg)
}

fn install_metrics() -> Result<()> {
    let sink = baker_telemetry::prometheus::install()?;
    baker_telemetry::sinks::SINK
        .set(sink)
        .map_err(|_| anyhow!("telemetry metrics sink already set"))?;
    baker_storage::metrics::SINK
        .set(sink)
        .map_err(|_| anyhow!("storage metrics sink already set"))?;
    baker_client::metrics::SINK
        .set(sink)
        .map_err(|_| anyhow!("client metrics sink already set"))?;
    baker_validator::metrics::SINK
        .set(sink)
        .map_err(|_| anyhow!("validator metrics sink already set"))?;
    Ok(())
}

fn open_store(cfg: &BakerConfig) -> Result<Arc<RedbBakerStore>> {
    fs::create_dir_all(&cfg.data_dir)
        .with_context(|| format!("creating {}", cfg.data_dir.display()))?;
    let store = RedbBakerStore::open(cfg.database_path())
        .with_context(|| format!("opening {}", cfg.database_path().display()))?;
    store.add_default_endpoints(cfg.network)?;
    Ok(Arc::new(store))
}

fn close_store(store: Arc<RedbBakerStore>) {
    match Arc::try_unwrap(store) {
        Ok(store) => store.close(),
        Err(_) => tracing::warn!(target: "bakerd", "store still referenced at exit"),
    }
}

fn notification_service(
    store: Arc<RedbBakerStore>,
    timeout: Duration,
) -> Result<NotificationService> {
    let webhook: NotifierFactory = Arc::new(move |raw: &[u8]| {
        Ok(Arc::new(WebhookNotifier::from_config(raw, timeout)?) as Arc<dyn Notifier>)
    });
    NotificationService::new(store).with_factory(WebhookNotifier::NAME, webhook)
}

/// Composition root: wires the store, the chain client, the signer router,
/// notifications and the status server around the block event loop.
async fn run_daemon(cfg: BakerConfig, store: Arc<RedbBakerStore>) -> Result<()> {
    let timeout = Duration::from_secs(cfg.rpc_timeout_secs);
    let endpoints: Vec<String> = store.list_endpoints()?.into_values().collect();
    let rpc = Arc::new(HttpChainClient::new(endpoints, timeout)?);

    let (_, pkh) = store.delegate()?;
    let mut signer = SignerRouter::new();
    match (&cfg.signer_url, pkh.is_empty()) {
        (Some(url), false) => {
            signer = signer.with_backend(
                SignerType::Remote,
                Arc::new(RemoteSigner::new(url.clone(), pkh.clone(), timeout)?),
            );
        }
        (Some(_), true) => {
            tracing::warn!(target: "bakerd", "signer_url is set but no delegate is configured");
        }
        (None, _) => {}
    }
    if let Some(selected) = store.signer_type()? {
        if !signer.supports(selected) {
            tracing::warn!(target: "bakerd", signer = %selected, "no backend available for the selected signer");
        }
    }

    let notifications = Arc::new(notification_service(store.clone(), timeout)?);
    let services = BakerServices {
        store: store.clone(),
        rpc: rpc.clone(),
        signer: Arc::new(signer),
        notifications: notifications.clone(),
        payouts: None,
    };
    let event_loop = BlockEventLoop::new(services, BakerSettings::from(&cfg));
    let status = event_loop.status();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (head_tx, head_rx) = mpsc::channel(HEAD_CHANNEL_CAPACITY);

    let status_addr: SocketAddr = format!("{}:{}", cfg.status_addr, cfg.status_port)
        .parse()
        .with_context(|| format!("invalid status address {}:{}", cfg.status_addr, cfg.status_port))?;
    let http = tokio::spawn(baker_telemetry::http::run_server(
        status_addr,
        status,
        shutdown_rx.clone(),
    ));
    let monitor = tokio::spawn(
        HeadMonitor::new(rpc.clone(), Duration::from_millis(cfg.poll_interval_ms))
            .run(head_tx, shutdown_rx.clone()),
    );
    let mut event_loop = tokio::spawn(event_loop.run(head_rx, shutdown_rx));

    tracing::info!(
        target: "bakerd",
        event = "startup",
        network = %cfg.network,
        endpoint = rpc.active_endpoint(),
        delegate = %pkh,
        dry_run_bake = cfg.dry_run_bake,
        dry_run_endorse = cfg.dry_run_endorse
    );
    notifications.send("bakerd started").await;

    let loop_finished = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("listening for ctrl-c")?;
            tracing::info!(target: "bakerd", event = "shutdown", reason = "ctrl-c");
            false
        }
        _ = &mut event_loop => {
            tracing::warn!(target: "bakerd", event = "shutdown", reason = "event loop exited");
            true
        }
    };
    shutdown_tx.send(true).ok();

    if !loop_finished {
        event_loop.await.context("event loop task")?;
    }
    monitor.await.context("head monitor task")?;
    http.await.context("status server task")?;

    drop(notifications);
    close_store(store);
    tracing::info!(target: "bakerd", event = "shutdown", reason = "complete");
    Ok(())
}

/// Handles every operator command that only touches the store.
async fn run_command(command: Command, cfg: &BakerConfig, store: &Arc<RedbBakerStore>) -> Result<()> {
    match command {
        Command::Run => return Err(anyhow!("`run` starts the daemon, not an operator command")),
        Command::SetDelegate {
            pkh,
            secret_key_ref,
            signer,
        } => {
            store.set_delegate(&secret_key_ref, &pkh)?;
            store.set_signer_type(signer)?;
            println!("delegate set to {pkh} ({signer} signer)");
        }
        Command::SetLedger { pkh, bip_path } => {
            store.save_ledger_config(&pkh, &bip_path)?;
            store.set_delegate("", &pkh)?;
            println!("ledger delegate set to {pkh} ({bip_path})");
        }
        Command::Pause => {
            store.set_paused(true)?;
            println!("paused");
        }
        Command::Resume => {
            store.set_paused(false)?;
            println!("resumed");
        }
        Command::Endpoints { action } => match action {
            EndpointAction::Add { url } => match store.add_endpoint(&url)? {
                Some(id) => println!("added endpoint {id}: {url}"),
                None => println!("{url} is already registered"),
            },
            EndpointAction::List => {
                for (id, url) in store.list_endpoints()? {
                    println!("{id}\t{url}");
                }
            }
            EndpointAction::Remove { id } => {
                store.delete_endpoint(id)?;
                println!("removed endpoint {id}");
            }
        },
        Command::Notifiers { action } => {
            let service =
                notification_service(store.clone(), Duration::from_secs(cfg.rpc_timeout_secs))?;
            match action {
                NotifierAction::Show => {
                    println!("{}", serde_json::to_string_pretty(&service.config()?)?);
                }
                NotifierAction::Set { name, config } => {
                    serde_json::from_str::<serde_json::Value>(&config)
                        .context("notifier configuration must be JSON")?;
                    service.configure(&name, config.as_bytes(), true).await?;
                    println!("notifier {name} configured");
                }
                NotifierAction::Test { name } => {
                    service.test_send(&name).await?;
                    println!("test message sent through {name}");
                }
            }
        }
        Command::ClearIntent { kind, level } => {
            store.clear_intent(kind, level)?;
            println!("cleared {kind} intent at level {level}");
        }
        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&offline_status(cfg, store)?)?);
        }
    }
    Ok(())
}

fn offline_status(cfg: &BakerConfig, store: &RedbBakerStore) -> Result<serde_json::Value> {
    let identity = store.identity()?;
    let mut kinds = serde_json::Map::new();
    for kind in OperationKind::ALL {
        kinds.insert(
            kind.to_string(),
            serde_json::json!({
                "watermark": store.watermark(kind)?,
                "last_seal": store.most_recent_seal(kind)?,
                "pending_intents": store.pending_intents(kind)?,
                "rights_fetched_through_cycle": store.highest_cycle_fetched(kind)?,
            }),
        );
    }
    Ok(serde_json::json!({
        "network": cfg.network,
        "database": cfg.database_path(),
        "delegate": identity,
        "paused": store.is_paused()?,
        "endpoints": store.list_endpoints()?,
        "operations": kinds,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();
    let cfg = load_config(&opts)?;

    let format = if opts.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(default_directive(cfg.log_debug, cfg.log_trace), format)?;

    let store = open_store(&cfg)?;
    match opts.command {
        None | Some(Command::Run) => {
            install_metrics()?;
            run_daemon(cfg, store).await
        }
        Some(command) => {
            let result = run_command(command, &cfg, &store).await;
            close_store(store);
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bakerd.toml");
        fs::write(&path, "network = \"mainnet\"\nstatus_port = 9000\n").unwrap();

        let opts = Opts::parse_from([
            "bakerd",
            "--config",
            path.to_str().unwrap(),
            "--webuiport",
            "9100",
            "--dry-run-bake",
            "--debug",
        ]);
        let cfg = load_config(&opts).unwrap();
        assert_eq!(cfg.network, Network::Mainnet);
        assert_eq!(cfg.status_port, 9100);
        assert!(cfg.dry_run_bake);
        assert!(!cfg.dry_run_endorse);
        assert!(cfg.log_debug);
        assert_eq!(opts.command, None);
    }

    #[test]
    fn subcommands_parse() {
        let opts = Opts::parse_from(["bakerd", "--network", "granadanet", "endpoints", "remove", "3"]);
        assert_eq!(opts.network, Some(Network::Granadanet));
        assert_eq!(
            opts.command,
            Some(Command::Endpoints {
                action: EndpointAction::Remove { id: 3 }
            })
        );

        let opts = Opts::parse_from(["bakerd", "clear-intent", "bake", "50"]);
        assert_eq!(
            opts.command,
            Some(Command::ClearIntent {
                kind: OperationKind::Bake,
                level: 50
            })
        );

        let opts = Opts::parse_from(["bakerd", "set-delegate", "tz1abc", "--signer", "ledger"]);
        assert!(matches!(
            opts.command,
            Some(Command::SetDelegate { signer: SignerType::Ledger, .. })
        ));
    }

    #[tokio::test]
    async fn operator_commands_update_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BakerConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let store = open_store(&cfg).unwrap();
        let seeded = store.list_endpoints().unwrap().len();
        assert!(seeded > 0);

        run_command(
            Command::SetDelegate {
                pkh: "tz1abc".into(),
                secret_key_ref: String::new(),
                signer: SignerType::Remote,
            },
            &cfg,
            &store,
        )
        .await
        .unwrap();
        run_command(Command::Pause, &cfg, &store).await.unwrap();
        run_command(
            Command::Endpoints {
                action: EndpointAction::Add {
                    url: "http://127.0.0.1:8732".into(),
                },
            },
            &cfg,
            &store,
        )
        .await
        .unwrap();

        let status = offline_status(&cfg, &store).unwrap();
        assert_eq!(status["delegate"]["pkh"], "tz1abc");
        assert_eq!(status["paused"], true);
        assert_eq!(status["endpoints"].as_object().unwrap().len(), seeded + 1);
        assert_eq!(status["operations"]["bake"]["watermark"], 0);

        store.record_intent(OperationKind::Bake, 50).unwrap();
        run_command(
            Command::ClearIntent {
                kind: OperationKind::Bake,
                level: 50,
            },
            &cfg,
            &store,
        )
        .await
        .unwrap();
        assert!(store.pending_intents(OperationKind::Bake).unwrap().is_empty());
    }
}
