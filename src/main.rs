//! galaxy-lists binary entrypoint kept minimal. The list core lives in the library.

use std::fmt;
use std::sync::OnceLock;

use clap::Parser;
use galaxy_lists::{app, args, settings};

/// Log timestamp formatter using local time.
struct GalaxyTimer;

impl tracing_subscriber::fmt::time::FormatTime for GalaxyTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now().format("%Y-%m-%d-T %H:%M:%S");
        write!(w, "{ts}")
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Build the filter from `RUST_LOG`, falling back to the command-line level.
fn env_filter(level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
}

#[tokio::main]
async fn main() {
    let args = args::Args::parse();
    let level = args::determine_log_level(&args);

    // Initialize tracing logger writing to <state dir>/logs/galaxy-lists.log
    {
        let mut log_path = settings::logs_dir();
        log_path.push("galaxy-lists.log");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter(&level))
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .with_timer(GalaxyTimer)
                    .init();
                let _ = LOG_GUARD.set(guard);
                tracing::info!(path = %log_path.display(), "logging initialized");
            }
            Err(e) => {
                // Fallback: stderr logger so a read-only state dir never blocks startup
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter(&level))
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr)
                    .with_timer(GalaxyTimer)
                    .init();
                tracing::warn!(error = %e, "failed to open log file; using stderr");
            }
        }
    }

    let settings = settings::settings();
    if let Err(err) = app::run(&args, settings).await {
        tracing::error!(error = %err, "Command failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    tracing::info!("galaxy-lists exited");
}
