//! sysloggerd - The SysLogger daemon
//!
//! Runs the daemon in the foreground and wires together:
//! - Configuration loading
//! - The single-instance pid file
//! - Signal handling (SIGTERM/SIGINT request termination)
//! - The core scanner and shutdown sequence
//!
//! Also carries two small helpers: `stop` signals a running daemon and
//! `send` emits one line as a producer.

mod pidfile;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pidfile::{request_stop, PidFile, StopOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use syslogger_client::{Producer, ProducerConfig};
use syslogger_config::{load_config_or_default, DaemonSettings};
use syslogger_core::{Daemon, Termination};
use syslogger_util::default_config_path;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// sysloggerd - Shared log for local processes, fed through named pipes
#[derive(Parser, Debug)]
#[command(name = "sysloggerd")]
#[command(about = "Shared log for local processes, fed through named pipes", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/syslogger/config.toml)
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the daemon in the foreground (the default)
    Run,
    /// Ask a running daemon to stop
    Stop,
    /// Send one message to the running daemon
    Send {
        /// Message words, joined with spaces
        #[arg(required = true)]
        message: Vec<String>,
    },
}

fn load_settings(args: &Args) -> Result<DaemonSettings> {
    let settings = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    info!(
        config_path = %args.config.display(),
        pipe_dir = %settings.pipe_dir.display(),
        log_file = %settings.log_file.display(),
        "Configuration loaded"
    );
    Ok(settings)
}

async fn run(settings: DaemonSettings) -> Result<ExitCode> {
    let pid_file = PidFile::acquire(&settings.pid_file)
        .with_context(|| format!("Failed to acquire pid file {:?}", settings.pid_file))?;

    let termination = Termination::new();
    spawn_signal_listener(termination.clone())?;

    let daemon = Daemon::new(settings, termination, Box::new(pid_file))
        .context("Failed to start daemon")?;

    info!("Service running");
    let report = daemon.run().await;

    if !report.workers_finished {
        warn!("Some workers were still running at exit");
    }
    Ok(ExitCode::from(report.exit_code()))
}

/// Signals only set the termination flag; the scanner does the rest.
fn spawn_signal_listener(termination: Termination) -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
        }
        termination.request();
    });
    Ok(())
}

fn stop(settings: &DaemonSettings) -> Result<ExitCode> {
    let outcome = request_stop(&settings.pid_file)
        .with_context(|| format!("Failed to stop daemon via {:?}", settings.pid_file))?;

    match outcome {
        StopOutcome::Signalled(pid) => {
            println!("Sent SIGTERM to SysLogger (pid {pid})");
            Ok(ExitCode::SUCCESS)
        }
        StopOutcome::NotRunning => {
            println!("SysLogger isn't running at the moment");
            Ok(ExitCode::SUCCESS)
        }
        StopOutcome::Stale(pid) => {
            println!("SysLogger isn't running (stale pid {pid})");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn send(settings: &DaemonSettings, message: &[String]) -> ExitCode {
    let config = ProducerConfig {
        pipe_dir: settings.pipe_dir.clone(),
        pipe_prefix: settings.pipe_prefix.clone(),
        ..Default::default()
    };
    let producer = Producer::new(config);

    match producer.try_emit(&message.join(" ")) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("SysLogger failed: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "sysloggerd starting");

    let settings = load_settings(&args)?;

    match &args.command {
        None | Some(Command::Run) => run(settings).await,
        Some(Command::Stop) => stop(&settings),
        Some(Command::Send { message }) => Ok(send(&settings, message)),
    }
}
