//! Windows Service Control Manager (SCM) — install/uninstall/start/stop the
//! service and host it under the SCM dispatcher.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use svc_platform::descriptor::ServiceDescriptor;
use svc_platform::logger::LogTarget;
use svc_platform::service::{ServiceBackend, ServiceManager, ServiceStatus};
use svc_platform::work::ServiceHandler;

use crate::{dispatch, elevation, sc};

const PLATFORM: &str = "windows-service";

pub struct WindowsService {
    descriptor: Arc<ServiceDescriptor>,
    /// Binary the SCM launches
    executable: PathBuf,
}

impl WindowsService {
    pub fn new(descriptor: Arc<ServiceDescriptor>) -> Result<Self> {
        descriptor.validate()?;

        let executable = match descriptor.executable_path() {
            Some(path) => path.to_path_buf(),
            None => std::env::current_exe().context("failed to get current exe path")?,
        };

        Ok(Self {
            descriptor,
            executable,
        })
    }

    fn sc<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        Command::new("sc.exe")
            .args(args)
            .output()
            .context("failed to run sc.exe")
    }
}

impl ServiceManager for WindowsService {
    fn install(&self) -> Result<()> {
        elevation::ensure_elevated()?;
        let name = self.descriptor.name();
        info!("installing Windows service: {}", name);

        let output = self.sc(sc::create_args(&self.descriptor, &self.executable))?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            anyhow::bail!("sc.exe create failed: {}", stdout.trim());
        }

        if !self.descriptor.description_text().is_empty() {
            let _ = self.sc(["description", name, self.descriptor.description_text()]);
        }

        // Configure recovery: restart on failure
        let _ = self.sc(sc::failure_args(name));

        info!("service installed: {}", name);
        Ok(())
    }

    fn uninstall(&self) -> Result<()> {
        elevation::ensure_elevated()?;
        let name = self.descriptor.name();
        info!("uninstalling Windows service: {}", name);

        // Stop if running
        let _ = self.stop();

        // Wait briefly for stop to take effect
        std::thread::sleep(std::time::Duration::from_secs(2));

        let output = self.sc(["delete", name])?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            anyhow::bail!("sc.exe delete failed: {}", stdout.trim());
        }

        info!("service uninstalled: {}", name);
        Ok(())
    }

    fn start(&self) -> Result<()> {
        info!("starting service: {}", self.descriptor.name());

        let output = self.sc(["start", self.descriptor.name()])?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            anyhow::bail!("sc.exe start failed: {}", stdout.trim());
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        info!("stopping service: {}", self.descriptor.name());

        let output = self.sc(["stop", self.descriptor.name()])?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if !sc::is_not_active(&stdout) {
                anyhow::bail!("sc.exe stop failed: {}", stdout.trim());
            }
        }
        Ok(())
    }

    fn restart(&self) -> Result<()> {
        self.stop()?;
        // sc.exe stop returns while the service is still STOP_PENDING
        std::thread::sleep(self.descriptor.service_options().stop_timeout);
        self.start()
    }

    fn status(&self) -> Result<ServiceStatus> {
        let output = self.sc(["query", self.descriptor.name()])?;
        sc::parse_query(&String::from_utf8_lossy(&output.stdout))
    }

    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }
}

impl ServiceBackend for WindowsService {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    fn run(&self, handler: Arc<dyn ServiceHandler>) -> Result<()> {
        let options = self.descriptor.service_options();
        dispatch::run(
            self.descriptor.name(),
            handler,
            options.extra_accepted_controls,
            options.stop_timeout,
        )
    }

    /// Services have no console; logs go under ProgramData. A console run
    /// (the dispatcher's interactive fallback) keeps logging to stderr.
    fn log_target(&self) -> LogTarget {
        if std::io::stderr().is_terminal() {
            return LogTarget::Stderr;
        }
        let base = std::env::var_os("ProgramData")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"));
        LogTarget::Directory(base.join(self.descriptor.name()).join("logs"))
    }
}
