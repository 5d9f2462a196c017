use thiserror::Error;

use svc_platform::descriptor::DescriptorError;
use svc_platform::service::ControlError;

/// Failures surfaced by the lifecycle orchestrator.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid service descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("failed to load configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("failed to register service: {0:#}")]
    Registration(anyhow::Error),

    #[error("failed to initialise logger: {0:#}")]
    LoggerInit(anyhow::Error),

    #[error("service failed to start: {0:#}")]
    StartFailure(anyhow::Error),

    #[error("service start already requested")]
    AlreadyStarted,

    #[error(transparent)]
    ControlAction(#[from] ControlError),

    #[error("cannot get status, error: {0:#}")]
    Status(anyhow::Error),

    #[error("service run loop failed: {0:#}")]
    Run(anyhow::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl ServiceError {
    /// True for failures that happen before a logger exists and must go to stderr.
    pub fn is_pre_logger(&self) -> bool {
        matches!(
            self,
            Self::Descriptor(_) | Self::Config(_) | Self::Registration(_) | Self::LoggerInit(_)
        )
    }
}
