use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::control::ControlEvent;
use crate::descriptor::ServiceDescriptor;
use crate::logger::SharedLogger;

/// What a work unit sees of the service it runs inside.
#[derive(Clone)]
pub struct ServiceContext {
    pub descriptor: Arc<ServiceDescriptor>,
    /// Platform identifier reported by the backend (e.g. "linux-systemd")
    pub platform: &'static str,
    pub logger: SharedLogger,
}

/// The caller-supplied background task.
pub trait WorkUnit: Send + Sync {
    /// Launch the real work asynchronously and return promptly.
    fn start(&self, ctx: &ServiceContext) -> Result<()>;

    /// Request cessation. Must return without waiting for the work to finish.
    fn stop(&self, ctx: &ServiceContext) -> Result<()>;

    /// Wait at most `grace` for the work launched by `start` to wind down.
    fn shutdown(&self, grace: Duration) -> Result<()> {
        let _ = grace;
        Ok(())
    }
}

/// Host side of the manager's run loop.
pub trait ServiceHandler: Send + Sync {
    fn on_start(&self) -> Result<()>;

    fn on_stop(&self) -> Result<()>;

    /// Called on the manager's delivery path; must not block.
    fn on_control(&self, event: ControlEvent);
}
