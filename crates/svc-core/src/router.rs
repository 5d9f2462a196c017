//! Maps manager control codes to named events and logs them.
//!
//! The router is created before the logger exists so that its callback can be
//! placed in the service options; the logger is attached afterwards, exactly
//! once. Events routed before that are dropped silently.

use std::sync::{Arc, OnceLock};

use svc_platform::control::ControlEvent;
use svc_platform::descriptor::ControlCallback;
use svc_platform::logger::SharedLogger;

#[derive(Default)]
pub struct ControlEventRouter {
    logger: OnceLock<SharedLogger>,
}

impl ControlEventRouter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns false if a logger was already attached.
    pub fn attach(&self, logger: SharedLogger) -> bool {
        self.logger.set(logger).is_ok()
    }

    pub fn route(&self, raw: u32) {
        self.route_event(ControlEvent::from_raw(raw));
    }

    pub fn route_event(&self, event: ControlEvent) {
        let Some(logger) = self.logger.get() else {
            return;
        };

        match event.name() {
            Some(name) => logger.info(&format!("Received Event: {}", name)),
            None => logger.info(&format!("Received Unknown Event: {}", event)),
        }
    }

    /// Callback suitable for `ServiceOptions::control_callback`.
    pub fn callback(self: &Arc<Self>) -> ControlCallback {
        let router = Arc::clone(self);
        Arc::new(move |event| router.route_event(event))
    }
}
