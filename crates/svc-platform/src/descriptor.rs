//! Service identity and options, fixed for the lifetime of the process.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::control::{AcceptedControls, ControlEvent};

/// Callback invoked for every control event the manager delivers.
///
/// Runs on the manager's delivery thread, so it must not block.
pub type ControlCallback = Arc<dyn Fn(ControlEvent) + Send + Sync>;

const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("service name cannot be empty")]
    EmptyName,

    #[error("service name {name:?} contains invalid character {ch:?}")]
    InvalidName { name: String, ch: char },

    #[error("service argument {0:?} contains a line break")]
    InvalidArgument(String),
}

/// Strongly typed service options.
#[derive(Clone)]
pub struct ServiceOptions {
    /// Controls accepted in addition to stop and shutdown
    pub extra_accepted_controls: AcceptedControls,
    pub control_callback: Option<ControlCallback>,
    /// Budget the manager is told to expect for a stop, and the bound on teardown
    pub stop_timeout: Duration,
    /// Pause between the stop and start halves of a restart
    pub restart_delay: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            extra_accepted_controls: AcceptedControls::empty(),
            control_callback: None,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            restart_delay: DEFAULT_RESTART_DELAY,
        }
    }
}

impl fmt::Debug for ServiceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceOptions")
            .field("extra_accepted_controls", &self.extra_accepted_controls)
            .field("control_callback", &self.control_callback.is_some())
            .field("stop_timeout", &self.stop_timeout)
            .field("restart_delay", &self.restart_delay)
            .finish()
    }
}

/// Identity of the service as registered with the OS manager.
#[derive(Debug, Clone, Default)]
pub struct ServiceDescriptor {
    name: String,
    display_name: String,
    description: String,
    arguments: Vec<String>,
    executable: Option<PathBuf>,
    working_directory: Option<PathBuf>,
    user: Option<String>,
    dependencies: Vec<String>,
    options: ServiceOptions,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Arguments passed to the executable when the manager launches it
    pub fn arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(path.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Units or services that must be up before this one starts
    pub fn dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name, falling back to the service name when unset.
    pub fn effective_display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn argument_list(&self) -> &[String] {
        &self.arguments
    }

    pub fn executable_path(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    pub fn working_directory_path(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    pub fn run_as_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn dependency_list(&self) -> &[String] {
        &self.dependencies
    }

    pub fn service_options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Reject names and arguments that would break unit files or sc.exe command lines.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.name.trim().is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        if let Some(ch) = self.name.chars().find(|c| is_forbidden_name_char(*c)) {
            return Err(DescriptorError::InvalidName {
                name: self.name.clone(),
                ch,
            });
        }
        if let Some(arg) = self
            .arguments
            .iter()
            .find(|a| a.contains('\n') || a.contains('\r'))
        {
            return Err(DescriptorError::InvalidArgument(arg.clone()));
        }
        Ok(())
    }
}

fn is_forbidden_name_char(c: char) -> bool {
    c.is_whitespace()
        || c.is_control()
        || matches!(c, '/' | '\\' | '"' | '\'' | ';' | '&' | '|' | '`' | '$')
}
