//! Turns the single CLI argument into either the service run loop or a
//! one-shot management action.

use std::io::Write;
use std::sync::Arc;

use tracing::debug;

use svc_platform::logger::{LogTarget, SharedLogger};
use svc_platform::service::{control, ManagementAction, ServiceBackend, ServiceStatus};
use svc_platform::work::WorkUnit;

use crate::error::ServiceError;
use crate::host::LifecycleHost;

pub struct CommandDispatcher {
    backend: Arc<dyn ServiceBackend>,
    work: Arc<dyn WorkUnit>,
    logger: SharedLogger,
}

impl CommandDispatcher {
    pub fn new(backend: Arc<dyn ServiceBackend>, work: Arc<dyn WorkUnit>, logger: SharedLogger) -> Self {
        Self {
            backend,
            work,
            logger,
        }
    }

    /// Execute exactly one path for this process. Without an argument this
    /// blocks for the lifetime of the service.
    pub fn dispatch<W: Write>(&self, arg: Option<&str>, out: &mut W) -> Result<(), ServiceError> {
        let Some(name) = arg.map(str::to_lowercase) else {
            return self.run();
        };
        match ManagementAction::parse(&name) {
            Some(ManagementAction::Run) => self.run(),
            Some(ManagementAction::Status) => self.print_status(out),
            Some(action) => {
                debug!(action = action.as_str(), "forwarding management action");
                control(self.backend.as_ref(), action.as_str())?;
                Ok(())
            }
            None => {
                control(self.backend.as_ref(), &name)?;
                Ok(())
            }
        }
    }

    fn run(&self) -> Result<(), ServiceError> {
        let descriptor = Arc::new(self.backend.descriptor().clone());
        let host = LifecycleHost::new(
            self.work.clone(),
            descriptor,
            self.backend.platform(),
            self.logger.clone(),
        );
        host.run(self.backend.as_ref())
    }

    fn print_status<W: Write>(&self, out: &mut W) -> Result<(), ServiceError> {
        let status = self.backend.status().map_err(ServiceError::Status)?;
        writeln!(out, "{}", status_line(status))?;
        Ok(())
    }
}

/// Whether `arg` selects the service run loop rather than a one-shot action.
pub fn runs_service(arg: Option<&str>) -> bool {
    arg.map_or(true, |a| ManagementAction::parse(a) == Some(ManagementAction::Run))
}

/// Management actions report to the invoking console; only the run loop
/// uses the backend's own sink.
pub fn log_target_for(arg: Option<&str>, backend: &dyn ServiceBackend) -> LogTarget {
    if runs_service(arg) {
        backend.log_target()
    } else {
        LogTarget::Stderr
    }
}

pub fn status_line(status: ServiceStatus) -> String {
    format!("Status {}", status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use svc_platform::control::ControlEvent;
    use svc_platform::descriptor::ServiceDescriptor;
    use std::path::PathBuf;

    use svc_platform::service::{ControlError, ServiceManager};

    use crate::testing::{as_shared, FakeBackend, RecordingLogger, ScriptedWork};

    struct Fixture {
        backend: Arc<FakeBackend>,
        work: Arc<ScriptedWork>,
        logger: Arc<RecordingLogger>,
    }

    impl Fixture {
        fn new(backend: FakeBackend) -> Self {
            Self {
                backend: Arc::new(backend),
                work: Arc::new(ScriptedWork::default()),
                logger: RecordingLogger::shared(),
            }
        }

        fn dispatch(&self, arg: Option<&str>) -> (Result<(), ServiceError>, String) {
            let dispatcher = CommandDispatcher::new(
                self.backend.clone(),
                self.work.clone(),
                as_shared(&self.logger),
            );
            let mut out = Vec::new();
            let result = dispatcher.dispatch(arg, &mut out);
            (result, String::from_utf8(out).unwrap())
        }
    }

    fn backend_with_status(status: Result<ServiceStatus, String>) -> FakeBackend {
        let mut backend = FakeBackend::new(ServiceDescriptor::new("X"));
        backend.status = status;
        backend
    }

    #[test]
    fn test_status_prints_single_line() {
        for (status, expected) in [
            (ServiceStatus::Running, "Status Running\n"),
            (ServiceStatus::Stopped, "Status Stopped\n"),
            (ServiceStatus::Unknown, "Status Unknown\n"),
        ] {
            let fx = Fixture::new(backend_with_status(Ok(status)));
            let (result, out) = fx.dispatch(Some("status"));
            assert!(result.is_ok());
            assert_eq!(out, expected);
            assert_eq!(fx.backend.calls(), vec!["status"]);
        }
    }

    #[test]
    fn test_status_query_failure_is_error() {
        let fx = Fixture::new(backend_with_status(Err("the service is not installed".into())));
        let (result, out) = fx.dispatch(Some("STATUS"));

        let err = result.unwrap_err();
        assert!(matches!(err, ServiceError::Status(_)));
        assert_eq!(
            err.to_string(),
            "cannot get status, error: the service is not installed"
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_actions_are_case_insensitive() {
        let upper = Fixture::new(FakeBackend::new(ServiceDescriptor::new("X")));
        let lower = Fixture::new(FakeBackend::new(ServiceDescriptor::new("X")));

        upper.dispatch(Some("STOP")).0.unwrap();
        lower.dispatch(Some("stop")).0.unwrap();

        assert_eq!(upper.backend.calls(), vec!["stop"]);
        assert_eq!(upper.backend.calls(), lower.backend.calls());
    }

    #[test]
    fn test_management_actions_reach_adapter_silently() {
        let fx = Fixture::new(FakeBackend::new(ServiceDescriptor::new("X")));
        for action in ["install", "Start", "restart", "uninstall"] {
            let (result, out) = fx.dispatch(Some(action));
            assert!(result.is_ok());
            assert!(out.is_empty());
        }
        assert_eq!(
            fx.backend.calls(),
            vec!["install", "start", "restart", "uninstall"]
        );
        assert_eq!(fx.work.starts(), 0);
    }

    #[test]
    fn test_adapter_failure_is_control_error() {
        let mut backend = FakeBackend::new(ServiceDescriptor::new("X"));
        backend.fail_stop = true;
        let fx = Fixture::new(backend);

        let err = fx.dispatch(Some("stop")).0.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::ControlAction(ControlError::Failed { action: "stop", .. })
        ));
        assert!(err.to_string().contains("service has not been started"));
    }

    #[test]
    fn test_unknown_argument_is_reported_by_adapter_layer() {
        let fx = Fixture::new(FakeBackend::new(ServiceDescriptor::new("X")));
        let err = fx.dispatch(Some("Frobnicate")).0.unwrap_err();

        match err {
            ServiceError::ControlAction(ControlError::UnknownAction { action }) => {
                assert_eq!(action, "frobnicate");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fx.backend.calls().is_empty());
    }

    struct FileLoggedBackend(FakeBackend);

    impl ServiceManager for FileLoggedBackend {
        fn install(&self) -> anyhow::Result<()> {
            self.0.install()
        }

        fn uninstall(&self) -> anyhow::Result<()> {
            self.0.uninstall()
        }

        fn start(&self) -> anyhow::Result<()> {
            self.0.start()
        }

        fn stop(&self) -> anyhow::Result<()> {
            self.0.stop()
        }

        fn restart(&self) -> anyhow::Result<()> {
            self.0.restart()
        }

        fn status(&self) -> anyhow::Result<ServiceStatus> {
            self.0.status()
        }

        fn descriptor(&self) -> &ServiceDescriptor {
            self.0.descriptor()
        }
    }

    impl ServiceBackend for FileLoggedBackend {
        fn platform(&self) -> &'static str {
            self.0.platform()
        }

        fn run(&self, handler: Arc<dyn svc_platform::work::ServiceHandler>) -> anyhow::Result<()> {
            self.0.run(handler)
        }

        fn log_target(&self) -> LogTarget {
            LogTarget::Directory(PathBuf::from("/var/log/x"))
        }
    }

    #[test]
    fn test_management_actions_log_to_console() {
        let backend = FileLoggedBackend(FakeBackend::new(ServiceDescriptor::new("X")));
        let file = LogTarget::Directory(PathBuf::from("/var/log/x"));

        assert_eq!(log_target_for(None, &backend), file);
        assert_eq!(log_target_for(Some("RUN"), &backend), file);
        for action in ["install", "Uninstall", "start", "stop", "restart", "status", "bogus"] {
            assert_eq!(log_target_for(Some(action), &backend), LogTarget::Stderr);
        }
    }

    #[test]
    fn test_no_argument_runs_the_service() {
        let mut backend = FakeBackend::new(ServiceDescriptor::new("X"));
        backend.script = vec![ControlEvent::Interrogate, ControlEvent::Shutdown];
        let fx = Fixture::new(backend);

        let (result, out) = fx.dispatch(None);
        assert!(result.is_ok());
        assert!(out.is_empty());
        assert_eq!(fx.backend.calls(), vec!["run"]);
        assert_eq!(fx.work.starts(), 1);
        assert_eq!(fx.work.stops(), 1);
        assert_eq!(
            fx.logger.lines(),
            vec!["INFO Program started on fake platform"]
        );
    }

    #[test]
    fn test_run_argument_matches_no_argument() {
        let fx = Fixture::new(FakeBackend::new(ServiceDescriptor::new("X")));
        fx.dispatch(Some("RUN")).0.unwrap();
        assert_eq!(fx.backend.calls(), vec!["run"]);
        assert_eq!(fx.work.starts(), 1);
    }

    #[test]
    fn test_status_line_format() {
        assert_eq!(status_line(ServiceStatus::Running), "Status Running");
    }
}
