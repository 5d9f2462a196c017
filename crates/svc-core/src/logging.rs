use std::fs;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use svc_platform::logger::LogTarget;

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the process-wide subscriber. `RUST_LOG` overrides `level`.
pub fn init(target: &LogTarget, level: &str, file_prefix: &str) -> Result<()> {
    let filter = build_filter(level);

    match target {
        LogTarget::Stderr => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .context("failed to install stderr subscriber")?;
        }
        LogTarget::Directory(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log dir {}", dir.display()))?;

            let appender = tracing_appender::rolling::daily(dir, log_file_name(file_prefix));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);

            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_target(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .context("failed to install file subscriber")?;
        }
    }

    Ok(())
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn log_file_name(prefix: &str) -> String {
    format!("{}.log", prefix)
}
