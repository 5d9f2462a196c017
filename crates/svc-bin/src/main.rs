use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use svc_core::config::ServiceConfig;
use svc_core::dispatcher::{self, CommandDispatcher};
use svc_core::error::ServiceError;
use svc_core::logging;
use svc_core::router::ControlEventRouter;
use svc_platform::control::AcceptedControls;
use svc_platform::descriptor::{ServiceDescriptor, ServiceOptions};
use svc_platform::service::ServiceBackend;

mod heartbeat;

use heartbeat::HeartbeatWork;

#[derive(Parser, Debug)]
#[command(name = "svc-example")]
#[command(about = "Example background service managed by the OS service manager")]
#[command(version)]
struct Cli {
    /// One of install, uninstall, start, stop, restart, status; omit to run the service
    action: Option<String>,

    /// Path to config file
    #[arg(long, env = "SVC_CONFIG_PATH")]
    config_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SVC_LOG_LEVEL")]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // no logger exists yet for these
            if err.is_pre_logger() {
                eprintln!("ERROR: {}", err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ServiceError> {
    let config_path = cli
        .config_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(ServiceConfig::default_path);

    let config = ServiceConfig::load_or_default(&config_path).map_err(ServiceError::Config)?;

    // The router exists before the logger so its callback can go into the descriptor
    let router = ControlEventRouter::new();
    let options = ServiceOptions {
        extra_accepted_controls: AcceptedControls::SESSION_CHANGE,
        control_callback: Some(router.callback()),
        ..ServiceOptions::default()
    };
    let descriptor = Arc::new(config.to_descriptor(options));
    descriptor.validate()?;

    let backend = create_backend(descriptor.clone()).map_err(ServiceError::Registration)?;

    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    let target = dispatcher::log_target_for(cli.action.as_deref(), backend.as_ref());
    logging::init(&target, &level, descriptor.name())
        .map_err(ServiceError::LoggerInit)?;
    let logger = backend.logger().map_err(ServiceError::LoggerInit)?;
    router.attach(logger.clone());

    debug!(
        "svc-example v{} (os={}, arch={}, platform={})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
        backend.platform(),
    );

    let work = Arc::new(HeartbeatWork::new(config.heartbeat_interval()));
    let commands = CommandDispatcher::new(backend, work, logger.clone());

    let mut stdout = std::io::stdout();
    commands
        .dispatch(cli.action.as_deref(), &mut stdout)
        .inspect_err(|e| {
            // start failures are already logged by the host
            if !matches!(e, ServiceError::StartFailure(_)) {
                logger.error(&e.to_string());
            }
        })
}

#[cfg(target_os = "linux")]
fn create_backend(descriptor: Arc<ServiceDescriptor>) -> Result<Arc<dyn ServiceBackend>> {
    Ok(Arc::new(svc_linux::service::SystemdService::new(descriptor)?))
}

#[cfg(target_os = "windows")]
fn create_backend(descriptor: Arc<ServiceDescriptor>) -> Result<Arc<dyn ServiceBackend>> {
    Ok(Arc::new(svc_windows::service::WindowsService::new(descriptor)?))
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn create_backend(descriptor: Arc<ServiceDescriptor>) -> Result<Arc<dyn ServiceBackend>> {
    let _ = descriptor;
    anyhow::bail!("service management not supported on this platform")
}
