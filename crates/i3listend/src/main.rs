//! i3listend
//!
//! Listens to i3/sway events and runs the built-in handlers until
//! interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use i3listen_ipc::DEFAULT_CHANNEL_BUFFER;
use i3listend::config::DEFAULT_CONNECT_RETRIES;
use i3listend::{builtin, Daemon, DaemonConfig, I3Connection, StopReason};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "i3listend")]
#[command(about = "Event listener daemon for i3 and sway")]
struct Args {
    /// Path to the IPC socket (defaults to $I3SOCK, $SWAYSOCK, then i3 --get-socketpath)
    #[arg(short, long)]
    socket: Option<String>,

    /// Retries for the initial connection
    #[arg(long, default_value_t = DEFAULT_CONNECT_RETRIES)]
    connect_retries: u32,

    /// Number of events buffered ahead of the handlers
    #[arg(long, default_value_t = DEFAULT_CHANNEL_BUFFER)]
    event_buffer: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is reserved for handler output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = DaemonConfig {
        connect_retries: args.connect_retries,
        event_buffer: args.event_buffer,
        ..DaemonConfig::default()
    }
    .with_socket(args.socket.as_deref());

    let mut interrupt =
        signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    let mut daemon = Daemon::new();
    daemon
        .connect(|| I3Connection::connect(&config))
        .await
        .context("Failed to connect to the window manager")?;
    daemon
        .initial_sync()
        .await
        .context("Failed to read the initial layout tree")?;

    for (kind, handler) in builtin::defaults() {
        let id = handler.id().clone();
        if let Err(e) = daemon.register_event_handler(kind, handler).await {
            warn!(kind = %kind, handler = %id, "Failed to register handler: {}", e);
        }
    }

    info!("i3listend started");

    let shutdown = async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    };

    match daemon.run(shutdown).await.context("Event stream failed")? {
        StopReason::Cancelled { dropped_events } => {
            eprintln!("got interrupt, stopping daemon");
            info!(dropped_events, "Shutting down...");
        }
        StopReason::StreamEnded => {
            info!("Window manager closed the event stream, exiting");
        }
    }

    Ok(())
}
