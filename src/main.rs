//! Framemesh - cross-context coordination hub.
//!
//! Main entry point for the framemesh CLI.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use framemesh_agent::{AgentConfig, ContextAgent, OnceTracker};
use framemesh_config::{
    AgentSettings, ConfigLoader, ConfigValidator, FramemeshConfig, HubSettings, LogSettings,
    SingletonSettings, StoreBackend, StoreSettings,
};
use framemesh_hub::{Hub, HubConfig};
use framemesh_protocols::{ContextId, RequestFrame, RequestHandler, ResponseEnvelope, Role};
use framemesh_store::{
    AdoptionConfig, FileStore, LeaseLock, MemoryStore, SharedStore, SingletonSlot,
};

/// Framemesh CLI.
#[derive(Parser)]
#[command(name = "framemesh")]
#[command(about = "Cross-context coordination: role registry, routing, singleton adoption")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to ~/.framemesh/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the hub with the demo contexts until interrupted (default)
    Run,

    /// Run the scripted coordination walkthrough once and exit
    Demo,

    /// Print the effective configuration and validation findings
    ShowConfig,
}

/// Get the .framemesh directory path.
fn framemesh_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".framemesh"))
        .unwrap_or_else(|| PathBuf::from(".framemesh"))
}

/// Initialize tracing with console and file output.
///
/// Log files are written to the configured directory (default
/// ~/.framemesh/logs) with daily rotation.
fn init_tracing(log: &LogSettings) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = match &log.dir {
        Some(dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
        None => framemesh_dir().join("logs"),
    };
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("framemesh")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Keep the worker guard alive for the program duration.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(_guard);

    // RUST_LOG wins; the configured level is the fallback.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    tracing_subscriber::registry()
        .with(env_filter)
        // Console layer (human-readable text format with colors)
        .with(fmt::layer().with_target(true).with_ansi(true))
        // File layer (text format without colors)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(ConfigLoader::default_config_path);
    let config = match &config_path {
        Some(path) => ConfigLoader::load_or_default(path)?,
        None => FramemeshConfig::default(),
    };

    init_tracing(&config.log)?;

    match cli.command {
        None | Some(Commands::Run) => run(config, false).await,
        Some(Commands::Demo) => run(config, true).await,
        Some(Commands::ShowConfig) => show_config(&config),
    }
}

/// Print the effective configuration plus anything the validator flags.
fn show_config(config: &FramemeshConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(config)?);

    let validation = ConfigValidator::validate(config)?;
    for warning in &validation.warnings {
        eprintln!("warning: {}: {}", warning.path, warning.message);
    }
    for err in &validation.errors {
        eprintln!("error: {}: {}", err.path, err.message);
    }
    Ok(())
}

fn hub_config(settings: &HubSettings) -> HubConfig {
    HubConfig {
        roles: settings.roles.clone(),
        sweep_interval_secs: settings.sweep_interval_secs,
        idle_eviction_threshold_secs: settings.idle_eviction_threshold_secs,
        command_buffer: settings.command_buffer,
    }
}

fn agent_config(settings: &AgentSettings) -> AgentConfig {
    AgentConfig {
        announce_interval_secs: settings.announce_interval_secs,
        ping_interval_secs: settings.ping_interval_secs,
        route_timeout_secs: settings.route_timeout_secs,
        delivery_buffer: settings.delivery_buffer,
    }
}

fn adoption_config(settings: &SingletonSettings) -> AdoptionConfig {
    AdoptionConfig {
        probe_timeout_ms: settings.probe_timeout_ms,
        probe_tick_ms: settings.probe_tick_ms,
        contention_poll_ms: settings.contention_poll_ms,
        contention_deadline_ms: settings.contention_deadline_ms,
        boot_ttl_ms: settings.boot_ttl_ms,
    }
}

async fn build_store(
    settings: &StoreSettings,
) -> Result<Arc<dyn SharedStore>, Box<dyn std::error::Error>> {
    match settings.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::File => {
            let dir = settings
                .dir
                .as_deref()
                .map(|d| PathBuf::from(ConfigLoader::expand_path(d)))
                .unwrap_or_else(|| framemesh_dir().join("store"));
            info!("Using file store at {}", dir.display());
            Ok(Arc::new(FileStore::new(dir).await?))
        }
    }
}

/// Demo sorting backend: a fixed barcode-to-chute table standing in for a
/// real picking system. Built exactly once via the singleton slot.
struct SortingEngine {
    chutes: HashMap<String, u32>,
}

impl SortingEngine {
    fn with_demo_chutes() -> Self {
        let mut chutes = HashMap::new();
        chutes.insert("4006381333931".to_string(), 12);
        chutes.insert("7350053850019".to_string(), 3);
        chutes.insert("0012345678905".to_string(), 27);
        Self { chutes }
    }

    fn chute_for(&self, barcode: &str) -> Option<u32> {
        self.chutes.get(barcode).copied()
    }
}

/// Serves the "sorting" role: answers barcode lookups against the engine.
struct SortingHandler {
    engine: Arc<SortingEngine>,
}

#[async_trait]
impl RequestHandler for SortingHandler {
    async fn handle(&self, frame: RequestFrame) -> ResponseEnvelope {
        match frame.kind.as_str() {
            "barcode-request" => {
                let barcode = frame.payload["product_barcode"].as_str().unwrap_or_default();
                match self.engine.chute_for(barcode) {
                    Some(chute) => ResponseEnvelope::ok(json!({
                        "product_barcode": barcode,
                        "chute": chute,
                    })),
                    None => ResponseEnvelope::fail("barcode not found"),
                }
            }
            _ => ResponseEnvelope::fail("unsupported request kind"),
        }
    }
}

/// Serves the "trigger" role, which only ever originates requests.
struct AckHandler;

#[async_trait]
impl RequestHandler for AckHandler {
    async fn handle(&self, _frame: RequestFrame) -> ResponseEnvelope {
        ResponseEnvelope::ok_empty()
    }
}

/// Bring up the full stack: shared store, hub, singleton-built sorting
/// engine, and one agent per demo role. With `oneshot` set, shut down after
/// the walkthrough instead of waiting for Ctrl-C.
async fn run(config: FramemeshConfig, oneshot: bool) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting framemesh v{}", env!("CARGO_PKG_VERSION"));

    let validation = ConfigValidator::validate(&config)?;
    for warning in &validation.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    if !validation.is_valid() {
        for err in &validation.errors {
            error!(path = %err.path, "{}", err.message);
        }
        return Err("configuration is invalid".into());
    }

    let store = build_store(&config.store).await?;
    let (shutdown_tx, _) = broadcast::channel(1);

    // Hold the coordinator lease for the life of the process. The guard's
    // renewal task keeps re-stamping it on the heartbeat cadence.
    let coordinator = LeaseLock::new(store.clone(), "coordinator", config.lease.ttl());
    let coordinator_guard = match coordinator.acquire(config.lease.heartbeat()).await? {
        Some(guard) => {
            info!(owner = %guard.owner(), "coordinator lease acquired");
            Some(guard)
        }
        None => {
            warn!("coordinator lease held elsewhere, running as secondary");
            None
        }
    };

    let (hub, hub_task) = Hub::spawn(hub_config(&config.hub), shutdown_tx.subscribe());

    // Log shared-store mutations as they happen.
    let mut store_events = store.subscribe();
    let mut events_shutdown = shutdown_tx.subscribe();
    let events_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = events_shutdown.recv() => break,
                event = store_events.recv() => match event {
                    Ok(event) => debug!(key = %event.key, op = ?event.op, "store mutation"),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "store event subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });

    // The sorting engine must exist exactly once no matter how many
    // initializers race for it; both of these go through the adoption
    // protocol and one construction serves both.
    let adoption = adoption_config(&config.singleton);
    let boot_lock = LeaseLock::new(store.clone(), "sorting-engine", adoption.boot_ttl());
    let slot: Arc<SingletonSlot<Arc<SortingEngine>>> = Arc::new(SingletonSlot::new());

    let mut initializers = Vec::new();
    for worker in 0..2u32 {
        let slot = slot.clone();
        let lock = boot_lock.clone();
        let adoption = adoption.clone();
        initializers.push(tokio::spawn(async move {
            slot.get_or_init(&lock, &adoption, move || async move {
                info!(worker, "constructing sorting engine");
                Arc::new(SortingEngine::with_demo_chutes())
            })
            .await
        }));
    }
    for initializer in initializers {
        initializer.await??;
    }
    let engine = slot
        .current()
        .ok_or("sorting engine missing after adoption")?;
    info!(
        fallback_builds = slot.fallback_builds(),
        "sorting engine ready"
    );

    let agent_cfg = agent_config(&config.agent);

    // Nobody serves "sorting" yet; this shows the uniform routing failure.
    let unrouted = hub
        .route(
            ContextId::new("local", "bootstrap"),
            Role::new("sorting"),
            RequestFrame::new("barcode-request", json!({ "product_barcode": "4006381333931" })),
            agent_cfg.route_timeout(),
        )
        .await?;
    info!(
        ok = unrouted.ok,
        reason = ?unrouted.reason,
        "route before any sorting context exists"
    );

    let sorting_agent = ContextAgent::new(
        ContextId::new("local", "sorting-1"),
        Role::new("sorting"),
        hub.clone(),
        agent_cfg.clone(),
        Arc::new(SortingHandler {
            engine: engine.clone(),
        }),
    )
    .spawn(shutdown_tx.subscribe())
    .await?;

    let trigger_agent = ContextAgent::new(
        ContextId::new("local", "trigger-1"),
        Role::new("trigger"),
        hub.clone(),
        agent_cfg,
        Arc::new(AckHandler),
    )
    .spawn(shutdown_tx.subscribe())
    .await?;

    // First-sighting work runs once per context even when asked twice.
    let seeder = OnceTracker::new();
    for attempt in 0..2 {
        let ran = seeder
            .run_once(sorting_agent.context(), || async {
                info!("seeding sorting context");
            })
            .await;
        debug!(attempt, ran, "seed attempt");
    }

    let lookup = trigger_agent
        .route(
            Role::new("sorting"),
            "barcode-request",
            json!({ "product_barcode": "4006381333931", "picking_code": "PK-19283" }),
        )
        .await?;
    info!(ok = lookup.ok, data = ?lookup.data, "barcode lookup");

    // Business failures come back as-is, distinct from routing failures.
    let missing = trigger_agent
        .route(
            Role::new("sorting"),
            "barcode-request",
            json!({ "product_barcode": "0000000000000" }),
        )
        .await?;
    info!(ok = missing.ok, reason = ?missing.reason, "unknown barcode lookup");

    let snapshot = hub.snapshot().await?;
    info!(total_contexts = snapshot.total_contexts, "registry snapshot");
    for (role, members) in &snapshot.roles {
        info!(%role, count = members.len(), "role members");
    }

    if oneshot {
        info!("walkthrough complete, shutting down");
    } else {
        info!("framemesh running; press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
        info!("Ctrl-C received, shutting down");
    }

    let _ = shutdown_tx.send(());
    trigger_agent.join().await;
    sorting_agent.join().await;
    let _ = hub_task.await;
    let _ = events_task.await;
    if let Some(guard) = coordinator_guard {
        guard.stop().await;
    }

    Ok(())
}
