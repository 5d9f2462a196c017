//! Linux systemd service management — install/uninstall/start/stop the service
//! and host it under the systemd run loop.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use svc_platform::descriptor::ServiceDescriptor;
use svc_platform::service::{ServiceBackend, ServiceManager, ServiceStatus};
use svc_platform::work::ServiceHandler;

use crate::signals;

const UNIT_DIR: &str = "/etc/systemd/system";
const PLATFORM: &str = "linux-systemd";

pub struct SystemdService {
    descriptor: Arc<ServiceDescriptor>,
    /// Binary systemd launches
    executable: PathBuf,
    unit_path: PathBuf,
}

impl SystemdService {
    pub fn new(descriptor: Arc<ServiceDescriptor>) -> Result<Self> {
        descriptor.validate()?;

        let executable = match descriptor.executable_path() {
            Some(path) => path.to_path_buf(),
            None => std::env::current_exe().context("failed to get current exe path")?,
        };
        let unit_path = Path::new(UNIT_DIR).join(format!("{}.service", descriptor.name()));

        Ok(Self {
            descriptor,
            executable,
            unit_path,
        })
    }

    pub fn unit_path(&self) -> &Path {
        &self.unit_path
    }

    fn generate_unit_file(&self) -> String {
        let desc = &self.descriptor;

        let mut exec_start = quote_arg(&self.executable.to_string_lossy());
        for arg in desc.argument_list() {
            exec_start.push(' ');
            exec_start.push_str(&quote_arg(arg));
        }

        let mut ordering = String::new();
        if !desc.dependency_list().is_empty() {
            let deps = desc.dependency_list().join(" ");
            ordering = format!("After={deps}\nWants={deps}\n");
        }

        let mut extra = String::new();
        if let Some(user) = desc.run_as_user() {
            extra.push_str(&format!("User={user}\n"));
        }
        if let Some(dir) = desc.working_directory_path() {
            extra.push_str(&format!("WorkingDirectory={}\n", dir.display()));
        }

        let description = if desc.description_text().is_empty() {
            desc.effective_display_name()
        } else {
            desc.description_text()
        };

        format!(
            r#"[Unit]
Description={description}
{ordering}
[Service]
Type=simple
ExecStart={exec_start}
{extra}Restart=always
RestartSec=10

[Install]
WantedBy=multi-user.target
"#
        )
    }

    fn systemctl(&self, args: &[&str]) -> Result<()> {
        let status = Command::new("systemctl")
            .args(args)
            .status()
            .with_context(|| format!("failed to run systemctl {}", args.join(" ")))?;

        if !status.success() {
            anyhow::bail!("systemctl {} failed with exit code {:?}", args.join(" "), status.code());
        }
        Ok(())
    }

    fn ensure_installed(&self) -> Result<()> {
        if !self.unit_path.exists() {
            anyhow::bail!("the service is not installed");
        }
        Ok(())
    }
}

impl ServiceManager for SystemdService {
    fn install(&self) -> Result<()> {
        ensure_root()?;
        let name = self.descriptor.name();
        info!("installing systemd service: {}", name);

        if self.unit_path.exists() {
            anyhow::bail!("service already installed: {}", self.unit_path.display());
        }

        let unit = self.generate_unit_file();
        std::fs::write(&self.unit_path, unit)
            .with_context(|| format!("failed to write {}", self.unit_path.display()))?;

        self.systemctl(&["daemon-reload"])?;
        self.systemctl(&["enable", name])?;

        info!("service installed and enabled: {}", name);
        Ok(())
    }

    fn uninstall(&self) -> Result<()> {
        ensure_root()?;
        let name = self.descriptor.name();
        info!("uninstalling systemd service: {}", name);

        // Stop and disable are best effort; the unit may already be inactive
        let _ = self.systemctl(&["stop", name]);
        let _ = self.systemctl(&["disable", name]);

        if self.unit_path.exists() {
            std::fs::remove_file(&self.unit_path).context("failed to remove unit file")?;
        }

        let _ = self.systemctl(&["daemon-reload"]);

        info!("service uninstalled: {}", name);
        Ok(())
    }

    fn start(&self) -> Result<()> {
        info!("starting service: {}", self.descriptor.name());
        self.systemctl(&["start", self.descriptor.name()])
    }

    fn stop(&self) -> Result<()> {
        info!("stopping service: {}", self.descriptor.name());
        self.systemctl(&["stop", self.descriptor.name()])
    }

    fn status(&self) -> Result<ServiceStatus> {
        self.ensure_installed()?;

        let output = Command::new("systemctl")
            .args(["is-active", self.descriptor.name()])
            .output()
            .context("failed to check service status")?;

        Ok(parse_is_active(&String::from_utf8_lossy(&output.stdout)))
    }

    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }
}

impl ServiceBackend for SystemdService {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    fn run(&self, handler: Arc<dyn ServiceHandler>) -> Result<()> {
        signals::run_until_stopped(handler)
    }
}

fn ensure_root() -> Result<()> {
    if !nix::unistd::Uid::effective().is_root() {
        anyhow::bail!("this command must be run as root (use sudo)");
    }
    Ok(())
}

/// Map `systemctl is-active` output to a run state.
fn parse_is_active(stdout: &str) -> ServiceStatus {
    match stdout.trim() {
        "active" | "reloading" => ServiceStatus::Running,
        "inactive" | "failed" => ServiceStatus::Stopped,
        _ => ServiceStatus::Unknown,
    }
}

fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\') {
        return arg.to_string();
    }
    let escaped = arg.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(descriptor: ServiceDescriptor) -> SystemdService {
        SystemdService::new(Arc::new(descriptor.executable("/usr/local/bin/svc-example"))).unwrap()
    }

    #[test]
    fn test_unit_path_uses_name() {
        let svc = service(ServiceDescriptor::new("demo"));
        assert_eq!(svc.unit_path(), Path::new("/etc/systemd/system/demo.service"));
        assert_eq!(svc.platform(), "linux-systemd");
    }

    #[test]
    fn test_minimal_unit_file() {
        let svc = service(ServiceDescriptor::new("demo").description("Demo daemon"));
        let unit = svc.generate_unit_file();

        assert!(unit.contains("Description=Demo daemon\n"));
        assert!(unit.contains("ExecStart=/usr/local/bin/svc-example\n"));
        assert!(unit.contains("Restart=always\n"));
        assert!(unit.contains("WantedBy=multi-user.target\n"));
        assert!(!unit.contains("User="));
        assert!(!unit.contains("After="));
    }

    #[test]
    fn test_full_unit_file() {
        let svc = service(
            ServiceDescriptor::new("demo")
                .display_name("Demo")
                .arguments(["--mode", "two words"])
                .user("svc")
                .working_directory("/var/lib/demo")
                .dependencies(["network-online.target"]),
        );
        let unit = svc.generate_unit_file();

        assert!(unit.contains("Description=Demo\n"));
        assert!(unit.contains("ExecStart=/usr/local/bin/svc-example --mode \"two words\"\n"));
        assert!(unit.contains("After=network-online.target\nWants=network-online.target\n"));
        assert!(unit.contains("User=svc\n"));
        assert!(unit.contains("WorkingDirectory=/var/lib/demo\n"));
    }

    #[test]
    fn test_invalid_descriptor_is_rejected() {
        assert!(SystemdService::new(Arc::new(ServiceDescriptor::new("bad name"))).is_err());
    }

    #[test]
    fn test_parse_is_active() {
        assert_eq!(parse_is_active("active\n"), ServiceStatus::Running);
        assert_eq!(parse_is_active("inactive\n"), ServiceStatus::Stopped);
        assert_eq!(parse_is_active("failed"), ServiceStatus::Stopped);
        assert_eq!(parse_is_active("activating"), ServiceStatus::Unknown);
        assert_eq!(parse_is_active(""), ServiceStatus::Unknown);
    }

    #[test]
    fn test_quote_arg() {
        assert_eq!(quote_arg("plain"), "plain");
        assert_eq!(quote_arg("a b"), "\"a b\"");
        assert_eq!(quote_arg("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote_arg(""), "\"\"");
    }
}
