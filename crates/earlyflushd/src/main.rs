//! earlyflushd — the earlyflush demo server.
//!
//! Serves the landing page plus the streamed and buffered variants of the
//! quest page.
//!
//! # Usage
//!
//! ```text
//! earlyflushd serve --port 8080 --dungeon-delay-ms 2000 --armor-download-ms 800
//! earlyflushd serve --config quest.toml
//! ```
//!
//! # Shutdown
//!
//! On Ctrl-C the listener stops accepting and in-flight responses get
//! `--shutdown-grace-ms` to finish, measured from the signal. That one
//! deadline covers both draining connections and stream tasks still on the
//! tracker. Streams that outlive it are abandoned; their remaining chunks
//! are lost.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use earlyflush_core::{QuestConfig, QuestOverrides, whole_millis};

#[derive(Parser)]
#[command(name = "earlyflushd", about = "earlyflush demo server")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the demo over HTTP.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,

        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// TOML file with `dungeon_delay_ms` / `armor_download_ms`.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Simulated backend latency, overrides the config file.
        #[arg(long)]
        dungeon_delay_ms: Option<u64>,

        /// Advisory asset download time shown on the page.
        #[arg(long)]
        armor_download_ms: Option<u64>,

        /// How long to wait for in-flight streams on shutdown.
        #[arg(long, default_value = "5000")]
        shutdown_grace_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Serve {
            bind,
            port,
            config,
            dungeon_delay_ms,
            armor_download_ms,
            shutdown_grace_ms,
        } => {
            let overrides = QuestOverrides {
                dungeon_delay_ms,
                armor_download_ms,
            };
            let quest = load_quest_config(config.as_deref(), &overrides)?;
            info!(
                dungeon_delay_ms = quest.dungeon_delay_ms,
                armor_download_ms = quest.armor_download_ms,
                "earlyflushd starting"
            );

            let addr = SocketAddr::new(bind, port);
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            info!(%addr, "listening");

            let grace = Duration::from_millis(shutdown_grace_ms);
            serve(listener, quest, grace, ctrl_c()).await?;
            info!("earlyflushd stopped");
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,earlyflushd=debug,earlyflush=debug")
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Defaults, then the optional file, then CLI flags.
fn load_quest_config(
    path: Option<&std::path::Path>,
    overrides: &QuestOverrides,
) -> anyhow::Result<QuestConfig> {
    let base = match path {
        Some(path) => QuestConfig::from_file(path)
            .with_context(|| format!("loading quest config from {}", path.display()))?,
        None => QuestConfig::default(),
    };
    Ok(base.with_overrides(overrides))
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Serve until `shutdown` resolves, then give in-flight work `grace` to
/// finish before returning.
async fn serve<S>(
    listener: TcpListener,
    quest: QuestConfig,
    grace: Duration,
    shutdown: S,
) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let tracker = TaskTracker::new();
    let router = earlyflush_web::build_router(quest, tracker.clone());

    let signalled = Arc::new(Notify::new());
    let notify = Arc::clone(&signalled);
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("shutdown signal received");
            notify.notify_one();
        })
        .into_future();
    let deadline = async {
        signalled.notified().await;
        tokio::time::sleep(grace).await;
    };
    tokio::pin!(server, deadline);

    let drained = tokio::select! {
        result = &mut server => {
            result.context("serving HTTP")?;
            true
        }
        () = &mut deadline => false,
    };

    tracker.close();
    let finished = drained
        && tokio::select! {
            () = tracker.wait() => true,
            () = &mut deadline => false,
        };

    if !finished {
        warn!(
            remaining = tracker.len(),
            grace_ms = whole_millis(grace),
            "grace period elapsed, abandoning in-flight streams"
        );
    }
    Ok(())
}
