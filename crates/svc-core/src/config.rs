use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use svc_platform::descriptor::{ServiceDescriptor, ServiceOptions};

/// On-disk overrides for the service identity and timings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Registered service name
    pub name: String,

    pub display_name: String,

    pub description: String,

    /// Arguments the manager passes when launching the service
    pub arguments: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Interval between "still running" heartbeats
    pub heartbeat_interval_secs: u64,

    /// Grace period for stop and teardown
    pub stop_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "ServiceExampleSimple".to_string(),
            display_name: "Service Example".to_string(),
            description: "This is an example service.".to_string(),
            arguments: Vec::new(),
            log_level: "info".to_string(),
            heartbeat_interval_secs: 30,
            stop_timeout_secs: 5,
        }
    }
}

impl ServiceConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "svc-example", "service") {
            dirs.config_dir().join("service.json")
        } else {
            PathBuf::from("service.json")
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        Self::from_json(&data)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).context("failed to parse config JSON")
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    /// Build the descriptor; `options` supplies the non-serialisable parts.
    pub fn to_descriptor(&self, mut options: ServiceOptions) -> ServiceDescriptor {
        options.stop_timeout = self.stop_timeout();
        ServiceDescriptor::new(&self.name)
            .display_name(&self.display_name)
            .description(&self.description)
            .arguments(self.arguments.iter().cloned())
            .options(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = ServiceConfig::from_json(r#"{"name": "Other", "stop_timeout_secs": 2}"#).unwrap();
        assert_eq!(cfg.name, "Other");
        assert_eq!(cfg.display_name, "Service Example");
        assert_eq!(cfg.heartbeat_interval_secs, 30);
        assert_eq!(cfg.stop_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = ServiceConfig::from_json("{ nope").unwrap_err();
        assert!(err.to_string().contains("failed to parse config JSON"));
    }

    #[test]
    fn test_zero_heartbeat_is_clamped() {
        let cfg = ServiceConfig {
            heartbeat_interval_secs: 0,
            ..ServiceConfig::default()
        };
        assert_eq!(cfg.heartbeat_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_to_descriptor_carries_identity_and_timeout() {
        let cfg = ServiceConfig {
            arguments: vec!["--verbose".to_string()],
            stop_timeout_secs: 9,
            ..ServiceConfig::default()
        };
        let desc = cfg.to_descriptor(ServiceOptions::default());
        assert_eq!(desc.name(), "ServiceExampleSimple");
        assert_eq!(desc.effective_display_name(), "Service Example");
        assert_eq!(desc.description_text(), "This is an example service.");
        assert_eq!(desc.argument_list(), ["--verbose"]);
        assert_eq!(desc.service_options().stop_timeout, Duration::from_secs(9));
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("svc-core-config-{}", std::process::id()));
        let path = dir.join("service.json");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, r#"{"name": "FromFile", "arguments": ["-v"]}"#).unwrap();

        let loaded = ServiceConfig::load_or_default(&path).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(loaded.name, "FromFile");
        assert_eq!(loaded.arguments, ["-v"]);
        assert_eq!(loaded.log_level, "info");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = Path::new("/nonexistent/svc-example/service.json");
        assert_eq!(ServiceConfig::load_or_default(path).unwrap(), ServiceConfig::default());
    }
}
