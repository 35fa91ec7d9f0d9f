// # fake_node - demo node host
//
// Thin host process around `dds-core`:
// 1. Read configuration from environment variables
// 2. Initialise logging (stderr, so stdout carries only computed values)
// 3. Build the funny node and the stdout sink
// 4. Run the sample loop until SIGINT/SIGTERM
//
// ## Configuration
//
// Every variable is optional; the defaults reproduce the demo exactly.
//
// - `FAKE_NODE_SEED`: seed for the funny node (default 42)
// - `FAKE_NODE_INTERVAL_MS`: time between iterations (default 1000)
// - `FAKE_NODE_START`: first counter value (default 0)
// - `FAKE_NODE_MAX_ITERATIONS`: stop after this many iterations (default: never)
// - `FAKE_NODE_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// FAKE_NODE_INTERVAL_MS=250 FAKE_NODE_MAX_ITERATIONS=3 fake_node
// # Computed funny value: 92
// # Computed funny value: 93
// # Computed funny value: 94
// ```

use anyhow::{Context, Result};
use dds_core::{FakeNodeConfig, LoopConfig, LoopEvent, NodeConfig, SampleLoop, StdoutSink};
use std::env;
use std::future::Future;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum NodeExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<NodeExitCode> for ExitCode {
    fn from(code: NodeExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Host settings read from the environment
struct Settings {
    config: FakeNodeConfig,
    log_level: Level,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Load settings through `lookup`, which behaves like [`env::var`]
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let mut sample_loop = LoopConfig::default();

        let seed = parse_var(&lookup, "FAKE_NODE_SEED")?.unwrap_or(42);
        if let Some(interval_ms) = parse_var(&lookup, "FAKE_NODE_INTERVAL_MS")? {
            sample_loop.interval_ms = interval_ms;
        }
        if let Some(start) = parse_var(&lookup, "FAKE_NODE_START")? {
            sample_loop.start_counter = start;
        }
        sample_loop.max_iterations = parse_var(&lookup, "FAKE_NODE_MAX_ITERATIONS")?;

        let log_level = match lookup("FAKE_NODE_LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            other => anyhow::bail!(
                "FAKE_NODE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        };

        let config = FakeNodeConfig {
            node: NodeConfig::Funny { seed },
            sample_loop,
        };
        config.validate()?;

        Ok(Self { config, log_level })
    }
}

/// Parse an optional environment variable
fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: '{}'", name, raw)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("{} could not be read", name)),
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return NodeExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NodeExitCode::ConfigError.into();
    }

    info!("Starting fake_node");

    // One task drives the loop; a current-thread runtime is all it needs
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NodeExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_node(settings.config).await {
            error!("Node error: {:#}", e);
            NodeExitCode::RuntimeError
        } else {
            NodeExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Build the node and run the sample loop until a shutdown signal arrives
async fn run_node(config: FakeNodeConfig) -> Result<()> {
    let node = config.node.build();
    info!(
        "Node: {} (type {})",
        node.base(),
        config.node.type_name()
    );

    let (mut sample_loop, event_rx) =
        SampleLoop::new(node, Box::new(StdoutSink::new()), config.sample_loop)?;
    let events = spawn_event_logger(event_rx);

    let result = drive(&mut sample_loop, wait_for_shutdown()).await;

    // Dropping the loop closes the event channel so the logger can finish
    drop(sample_loop);
    match events.await {
        Ok(seen) => debug!("Event logger saw {} event(s)", seen),
        Err(e) => error!("Event logger task failed: {}", e),
    }

    result?;
    info!("fake_node stopped");
    Ok(())
}

/// Run the loop until it finishes on its own or `shutdown_signal` resolves
///
/// A received signal stops the loop cleanly. A failure to listen for signals
/// is returned as an error so the process does not report a clean exit.
async fn drive<S>(sample_loop: &mut SampleLoop, shutdown_signal: S) -> Result<()>
where
    S: Future<Output = Result<&'static str>>,
{
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let run = sample_loop.run_with_shutdown(Some(shutdown_rx));
    tokio::pin!(run);
    tokio::pin!(shutdown_signal);

    tokio::select! {
        result = &mut run => {
            result?;
            return Ok(());
        }
        received = &mut shutdown_signal => {
            let name = received.context("Signal handling failed")?;
            info!("Received shutdown signal: {}", name);
        }
    }

    let _ = shutdown_tx.send(());
    run.await?;
    Ok(())
}

/// Drain loop events into the debug log
///
/// Resolves to the number of events seen once the loop is dropped.
fn spawn_event_logger(mut event_rx: mpsc::Receiver<LoopEvent>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut seen = 0;
        while let Some(event) = event_rx.recv().await {
            debug!("Loop event: {:?}", event);
            seen += 1;
        }
        seen
    })
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(received)
}

/// Wait for Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
