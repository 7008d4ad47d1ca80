// # topoviewd - Topology Viewer Daemon
//
// The topoviewd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Loading the network model from a snapshot file
// 3. Starting the topology view engine
// 4. Bridging the engine to stdio: client requests in, viewer messages out
//
// This is a thin integration layer. Message shaping, aggregation and
// dispatch all live in topoview-core.
//
// ## Wire
//
// - stdin: one client request per line, e.g.
//   `{"event":"requestDetails","sid":1,"payload":{"id":"of:0000000000000001","class":"device"}}`
// - stdout: one viewer message per line
// - stderr: logs
//
// The daemon exits once stdin is closed and pending replies are written,
// or on SIGTERM/SIGINT.
//
// ## Configuration
//
// - `TOPOVIEW_SNAPSHOT`: Path to the topology snapshot file (required)
// - `TOPOVIEW_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `TOPOVIEW_CHANNEL_CAPACITY`: Outbound message buffer (default: 1000)
// - `TOPOVIEW_LINK_WIDTH`: Link stroke width sent to clients (default: 2)
// - `TOPOVIEW_INITIAL_SNAPSHOT`: Send the whole topology on start (default: true)
//
// ## Example
//
// ```bash
// export TOPOVIEW_SNAPSHOT=/var/lib/topoview/topology.json
// export TOPOVIEW_LOG_LEVEL=debug
//
// topoviewd < requests.jsonl > messages.jsonl
// ```

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use topoview_core::{
    ClientRequest, MemoryMetaUiStore, MemoryTopology, OutboundMessage, ServiceDirectory,
    TopologyViewEngine, TopologyViewMessages, ViewConfig,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum TopoviewExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<TopoviewExitCode> for ExitCode {
    fn from(code: TopoviewExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// How long runtime shutdown waits for the blocked stdin reader
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Application configuration
struct Config {
    snapshot_path: PathBuf,
    log_level: String,
    channel_capacity: Option<usize>,
    link_width: Option<u32>,
    initial_snapshot: Option<bool>,
}

/// Parse an optional environment variable
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", name, value, e)),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            snapshot_path: env::var("TOPOVIEW_SNAPSHOT")
                .map(PathBuf::from)
                .context("TOPOVIEW_SNAPSHOT is required")?,
            log_level: env::var("TOPOVIEW_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            channel_capacity: parse_var("TOPOVIEW_CHANNEL_CAPACITY")?,
            link_width: parse_var("TOPOVIEW_LINK_WIDTH")?,
            initial_snapshot: parse_var("TOPOVIEW_INITIAL_SNAPSHOT")?,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.snapshot_path.is_file() {
            anyhow::bail!(
                "TOPOVIEW_SNAPSHOT does not point to a file: {}",
                self.snapshot_path.display()
            );
        }

        if let Some(capacity) = self.channel_capacity
            && !(1..=1_000_000).contains(&capacity)
        {
            anyhow::bail!(
                "TOPOVIEW_CHANNEL_CAPACITY must be between 1 and 1000000. Got: {}",
                capacity
            );
        }

        if let Some(width) = self.link_width
            && !(1..=20).contains(&width)
        {
            anyhow::bail!("TOPOVIEW_LINK_WIDTH must be between 1 and 20. Got: {}", width);
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "TOPOVIEW_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Library configuration with overrides applied
    fn view_config(&self) -> ViewConfig {
        let mut view = ViewConfig::new();
        // stdin is the only client; nothing to serve once it is gone
        view.engine.stop_on_request_end = true;
        if let Some(capacity) = self.channel_capacity {
            view.engine.outbound_channel_capacity = capacity;
        }
        if let Some(initial) = self.initial_snapshot {
            view.engine.send_initial_snapshot = initial;
        }
        if let Some(width) = self.link_width {
            view.display.link_width = width;
        }
        view
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return TopoviewExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return TopoviewExitCode::ConfigError.into();
    }

    // Initialize tracing; stdout belongs to the client
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return TopoviewExitCode::ConfigError.into();
    }

    info!("Starting topoviewd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return TopoviewExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let topology = match MemoryTopology::load(&config.snapshot_path).await {
            Ok(topology) => topology,
            Err(e) => {
                error!("Failed to load snapshot: {}", e);
                return TopoviewExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(&config, topology).await {
            error!("Daemon error: {:#}", e);
            TopoviewExitCode::RuntimeError
        } else {
            TopoviewExitCode::CleanShutdown
        }
    });

    // The stdin reader may still be parked on a blocking read
    rt.shutdown_timeout(SHUTDOWN_GRACE);

    result.into()
}

/// Run the daemon
async fn run_daemon(config: &Config, topology: MemoryTopology) -> Result<()> {
    let view_config = config.view_config();
    let events = Box::new(topology.clone());
    let messages = TopologyViewMessages::new(
        ServiceDirectory::from_model(Arc::new(topology)),
        Arc::new(MemoryMetaUiStore::new()),
    );

    let (engine, outbound) = TopologyViewEngine::new(messages, events, &view_config)?;

    let writer = tokio::spawn(write_messages(outbound));

    let (request_tx, request_rx) = mpsc::unbounded_channel();
    tokio::spawn(read_requests(request_tx));
    let requests = Box::pin(UnboundedReceiverStream::new(request_rx));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown signal error: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    info!("Serving topology view on stdio");
    engine.run_with_shutdown(requests, Some(shutdown_rx)).await?;

    // Closing the outbound channel lets the writer drain and finish
    drop(engine);
    writer.await.context("Message writer failed")??;

    info!("Shutting down daemon");
    Ok(())
}

/// Parse client requests from stdin, one per line
async fn read_requests(tx: mpsc::UnboundedSender<ClientRequest>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match ClientRequest::parse(&line) {
                    Ok(request) => {
                        if tx.send(request).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring client request: {}", e),
                }
            }
            Ok(None) => {
                debug!("stdin closed");
                break;
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
}

/// Write viewer messages to stdout as JSON lines
async fn write_messages(mut rx: mpsc::Receiver<OutboundMessage>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        stdout.write_all(&line).await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
