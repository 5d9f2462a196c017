//! `sc.exe` command lines and output parsing.

use std::path::Path;

use anyhow::Result;

use svc_platform::descriptor::ServiceDescriptor;
use svc_platform::service::ServiceStatus;

/// ERROR_SERVICE_DOES_NOT_EXIST
const SERVICE_DOES_NOT_EXIST: &str = "1060";
/// ERROR_SERVICE_NOT_ACTIVE
const SERVICE_NOT_ACTIVE: &str = "1062";

/// Arguments for `sc.exe create`.
pub fn create_args(descriptor: &ServiceDescriptor, executable: &Path) -> Vec<String> {
    let mut bin_path = format!("\"{}\"", executable.display());
    for arg in descriptor.argument_list() {
        bin_path.push(' ');
        bin_path.push_str(&quote_arg(arg));
    }

    let mut args = vec![
        "create".to_string(),
        descriptor.name().to_string(),
        format!("binPath={}", bin_path),
        format!("DisplayName={}", descriptor.effective_display_name()),
        "start=auto".to_string(),
        "type=own".to_string(),
    ];
    if !descriptor.dependency_list().is_empty() {
        args.push(format!("depend={}", descriptor.dependency_list().join("/")));
    }
    if let Some(user) = descriptor.run_as_user() {
        args.push(format!("obj={}", user));
    }
    args
}

/// Restart on failure: 10s, 30s, then 60s, resetting after a day.
pub fn failure_args(name: &str) -> [String; 4] {
    [
        "failure".to_string(),
        name.to_string(),
        "reset=86400".to_string(),
        "actions=restart/10000/restart/30000/restart/60000".to_string(),
    ]
}

/// Map `sc.exe query` output to a run state.
pub fn parse_query(stdout: &str) -> Result<ServiceStatus> {
    if stdout.contains(SERVICE_DOES_NOT_EXIST) {
        anyhow::bail!("the service is not installed");
    }

    let state = stdout
        .lines()
        .find(|line| line.trim_start().starts_with("STATE"))
        .unwrap_or_default();

    if state.contains("RUNNING") {
        Ok(ServiceStatus::Running)
    } else if state.contains("STOPPED") {
        Ok(ServiceStatus::Stopped)
    } else {
        Ok(ServiceStatus::Unknown)
    }
}

/// `sc.exe stop` on a service that is not running is not a failure.
pub fn is_not_active(output: &str) -> bool {
    output.contains(SERVICE_NOT_ACTIVE) || output.contains("has not been started")
}

/// Quote one argument so `CommandLineToArgvW` hands it back unchanged.
fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0;
    for ch in arg.chars() {
        match ch {
            '\\' => backslashes += 1,
            '"' => {
                // backslashes before a quote are escapes, double them
                quoted.extend(std::iter::repeat('\\').take(backslashes * 2 + 1));
                backslashes = 0;
            }
            _ => {
                quoted.extend(std::iter::repeat('\\').take(backslashes));
                backslashes = 0;
            }
        }
        if ch != '\\' {
            quoted.push(ch);
        }
    }
    quoted.extend(std::iter::repeat('\\').take(backslashes * 2));
    quoted.push('"');
    quoted
}
