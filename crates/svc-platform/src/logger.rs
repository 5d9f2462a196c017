use std::path::PathBuf;
use std::sync::Arc;

/// Best-effort log sink handed to the host, the router and the work unit.
pub trait Logger: Send + Sync {
    fn info(&self, msg: &str);

    fn error(&self, msg: &str);

    fn warn(&self, msg: &str) {
        self.info(msg);
    }
}

pub type SharedLogger = Arc<dyn Logger>;

/// Where the process-wide subscriber writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error; the init system captures it
    Stderr,
    /// Daily rolling files in the given directory
    Directory(PathBuf),
}

/// `Logger` backed by `tracing`, tagging every record with the service name.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    service: String,
}

impl TracingLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn shared(service: impl Into<String>) -> SharedLogger {
        Arc::new(Self::new(service))
    }
}

impl Logger for TracingLogger {
    fn info(&self, msg: &str) {
        tracing::info!(service = %self.service, "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(service = %self.service, "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(service = %self.service, "{}", msg);
    }
}
