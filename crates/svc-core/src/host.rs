//! Owns the start/stop contract of the work unit while the OS manager drives
//! the process.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use tracing::debug;

use svc_platform::control::ControlEvent;
use svc_platform::descriptor::ServiceDescriptor;
use svc_platform::logger::SharedLogger;
use svc_platform::service::ServiceBackend;
use svc_platform::work::{ServiceContext, ServiceHandler, WorkUnit};

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Idle,
    Starting,
    Running,
    StartFailed,
    Stopping,
    Stopped,
}

pub struct LifecycleHost {
    work: Arc<dyn WorkUnit>,
    ctx: ServiceContext,
    state: Mutex<HostState>,
}

impl LifecycleHost {
    pub fn new(
        work: Arc<dyn WorkUnit>,
        descriptor: Arc<ServiceDescriptor>,
        platform: &'static str,
        logger: SharedLogger,
    ) -> Arc<Self> {
        Arc::new(Self {
            work,
            ctx: ServiceContext {
                descriptor,
                platform,
                logger,
            },
            state: Mutex::new(HostState::Idle),
        })
    }

    pub fn state(&self) -> HostState {
        *self.lock_state()
    }

    /// Hand the host to the backend and block until the service ends.
    pub fn run(self: &Arc<Self>, backend: &dyn ServiceBackend) -> Result<(), ServiceError> {
        debug!(platform = backend.platform(), "entering service run loop");
        let handler: Arc<dyn ServiceHandler> = self.clone();
        backend.run(handler).map_err(|err| match err.downcast::<ServiceError>() {
            Ok(service_err) => service_err,
            Err(other) => ServiceError::Run(other),
        })
    }

    // A poisoned lock still holds a valid state value
    fn lock_state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, next: HostState) {
        *self.lock_state() = next;
    }
}

impl ServiceHandler for LifecycleHost {
    fn on_start(&self) -> Result<()> {
        {
            let mut state = self.lock_state();
            if *state != HostState::Idle {
                return Err(ServiceError::AlreadyStarted.into());
            }
            *state = HostState::Starting;
        }

        if let Err(err) = self.work.start(&self.ctx) {
            self.set_state(HostState::StartFailed);
            let err = ServiceError::StartFailure(err);
            self.ctx.logger.error(&err.to_string());
            return Err(err.into());
        }

        self.set_state(HostState::Running);
        self.ctx
            .logger
            .info(&format!("Program started on {} platform", self.ctx.platform));
        Ok(())
    }

    fn on_stop(&self) -> Result<()> {
        {
            let mut state = self.lock_state();
            if *state != HostState::Running {
                debug!(state = ?*state, "stop ignored, service not running");
                return Ok(());
            }
            *state = HostState::Stopping;
        }

        let result = self.work.stop(&self.ctx);
        if let Err(ref err) = result {
            self.ctx.logger.error(&format!("stop failed: {:#}", err));
        }

        let grace = self.ctx.descriptor.service_options().stop_timeout;
        if let Err(err) = self.work.shutdown(grace) {
            self.ctx
                .logger
                .warn(&format!("work did not shut down cleanly: {:#}", err));
        }

        self.set_state(HostState::Stopped);
        result
    }

    fn on_control(&self, event: ControlEvent) {
        debug!(%event, "control event");
        if let Some(callback) = &self.ctx.descriptor.service_options().control_callback {
            callback(event);
        }
    }
}
