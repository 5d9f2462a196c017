use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::descriptor::ServiceDescriptor;
use crate::logger::{LogTarget, SharedLogger, TracingLogger};
use crate::work::ServiceHandler;

/// Run state as reported by the OS manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Running,
    Stopped,
    Unknown,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Unknown => "Unknown",
        })
    }
}

/// One-shot administrative operation selected by the first CLI argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagementAction {
    Run,
    Install,
    Uninstall,
    Start,
    Stop,
    Restart,
    Status,
}

impl ManagementAction {
    /// Case-insensitive match against the known action names.
    pub fn parse(arg: &str) -> Option<Self> {
        match arg.to_lowercase().as_str() {
            "run" => Some(Self::Run),
            "install" => Some(Self::Install),
            "uninstall" => Some(Self::Uninstall),
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "restart" => Some(Self::Restart),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Install => "install",
            Self::Uninstall => "uninstall",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Status => "status",
        }
    }
}

/// Actions accepted by [`control`].
pub const CONTROL_ACTIONS: [&str; 5] = ["start", "stop", "restart", "install", "uninstall"];

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("unknown action {action:?}; valid actions: {}", CONTROL_ACTIONS.join(", "))]
    UnknownAction { action: String },

    #[error("failed to {action} service: {source:#}")]
    Failed {
        action: &'static str,
        source: anyhow::Error,
    },
}

pub trait ServiceManager: Send + Sync {
    /// Register the service with the OS manager
    fn install(&self) -> Result<()>;

    /// Remove the service registration
    fn uninstall(&self) -> Result<()>;

    /// Start the service
    fn start(&self) -> Result<()>;

    /// Stop the service
    fn stop(&self) -> Result<()>;

    /// Stop then start the service
    fn restart(&self) -> Result<()> {
        self.stop()?;
        std::thread::sleep(self.descriptor().service_options().restart_delay);
        self.start()
    }

    /// Query the current run state
    fn status(&self) -> Result<ServiceStatus>;

    fn descriptor(&self) -> &ServiceDescriptor;
}

/// A platform adapter that can also host the running service.
pub trait ServiceBackend: ServiceManager {
    /// Short identifier of the platform mechanism, e.g. "linux-systemd"
    fn platform(&self) -> &'static str;

    /// Block for the lifetime of the service, delivering start, stop and
    /// control events to `handler`.
    fn run(&self, handler: Arc<dyn ServiceHandler>) -> Result<()>;

    fn log_target(&self) -> LogTarget {
        LogTarget::Stderr
    }

    fn logger(&self) -> Result<SharedLogger> {
        Ok(TracingLogger::shared(self.descriptor().name()))
    }
}

/// Apply a named management action to `manager`.
pub fn control<M>(manager: &M, action: &str) -> Result<(), ControlError>
where
    M: ServiceManager + ?Sized,
{
    let (name, result) = match action {
        "start" => ("start", manager.start()),
        "stop" => ("stop", manager.stop()),
        "restart" => ("restart", manager.restart()),
        "install" => ("install", manager.install()),
        "uninstall" => ("uninstall", manager.uninstall()),
        other => {
            return Err(ControlError::UnknownAction {
                action: other.to_string(),
            })
        }
    };
    result.map_err(|source| ControlError::Failed {
        action: name,
        source,
    })
}
