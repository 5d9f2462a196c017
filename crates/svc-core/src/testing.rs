// Hand-written fakes shared by the unit tests in this crate

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use svc_platform::control::ControlEvent;
use svc_platform::descriptor::ServiceDescriptor;
use svc_platform::logger::{Logger, SharedLogger};
use svc_platform::service::{ServiceBackend, ServiceManager, ServiceStatus};
use svc_platform::work::{ServiceContext, ServiceHandler, WorkUnit};

#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Logger for RecordingLogger {
    fn info(&self, msg: &str) {
        self.lines.lock().unwrap().push(format!("INFO {msg}"));
    }

    fn error(&self, msg: &str) {
        self.lines.lock().unwrap().push(format!("ERROR {msg}"));
    }

    fn warn(&self, msg: &str) {
        self.lines.lock().unwrap().push(format!("WARN {msg}"));
    }
}

pub fn as_shared(logger: &Arc<RecordingLogger>) -> SharedLogger {
    logger.clone()
}

#[derive(Default)]
pub struct ScriptedWork {
    pub fail_start: bool,
    pub fail_stop: bool,
    pub fail_shutdown: bool,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub shutdowns: Mutex<Vec<Duration>>,
}

impl WorkUnit for ScriptedWork {
    fn start(&self, ctx: &ServiceContext) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            anyhow::bail!("cannot open socket on {}", ctx.platform);
        }
        Ok(())
    }

    fn stop(&self, _ctx: &ServiceContext) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            anyhow::bail!("stop failed");
        }
        Ok(())
    }

    fn shutdown(&self, grace: Duration) -> Result<()> {
        self.shutdowns.lock().unwrap().push(grace);
        if self.fail_shutdown {
            anyhow::bail!("worker still busy after {:?}", grace);
        }
        Ok(())
    }
}

impl ScriptedWork {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

/// Backend whose run loop replays a fixed script of control events.
pub struct FakeBackend {
    pub descriptor: ServiceDescriptor,
    pub status: Result<ServiceStatus, String>,
    pub script: Vec<ControlEvent>,
    pub fail_stop: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(descriptor: ServiceDescriptor) -> Self {
        Self {
            descriptor,
            status: Ok(ServiceStatus::Unknown),
            script: vec![ControlEvent::Stop],
            fail_stop: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) -> Result<()> {
        self.calls.lock().unwrap().push(call.to_string());
        Ok(())
    }
}

impl ServiceManager for FakeBackend {
    fn install(&self) -> Result<()> {
        self.record("install")
    }

    fn uninstall(&self) -> Result<()> {
        self.record("uninstall")
    }

    fn start(&self) -> Result<()> {
        self.record("start")
    }

    fn stop(&self) -> Result<()> {
        self.record("stop")?;
        if self.fail_stop {
            anyhow::bail!("service has not been started");
        }
        Ok(())
    }

    fn restart(&self) -> Result<()> {
        self.record("restart")
    }

    fn status(&self) -> Result<ServiceStatus> {
        self.record("status")?;
        self.status.clone().map_err(anyhow::Error::msg)
    }

    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }
}

impl ServiceBackend for FakeBackend {
    fn platform(&self) -> &'static str {
        "fake"
    }

    fn run(&self, handler: Arc<dyn ServiceHandler>) -> Result<()> {
        self.record("run")?;
        handler.on_start()?;
        for event in &self.script {
            handler.on_control(*event);
            if event.is_terminal() {
                break;
            }
        }
        handler.on_stop()
    }
}
