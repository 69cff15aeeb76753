//! Run and installation configuration
//!
//! The installation registry replaces what used to be process-wide mutable
//! state with an explicitly passed object carrying its own load/save
//! lifecycle. The run configuration is the external collaborator input:
//! which installation to use, how to log into the nodes, and the node
//! definitions themselves.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::RemoteLoginProgram;
use crate::error::{Error, Result};
use crate::node::{Node, NodeList};

/// One named benchmark installation, anchoring absolute paths on the nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgInstallation {
    /// Installation name used for lookup
    pub name: String,

    /// Installation home directory on the target nodes
    pub home: String,
}

impl RgInstallation {
    /// Create an installation
    pub fn new(name: impl Into<String>, home: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            home: home.into(),
        }
    }

    /// Absolute path of a script under the installation's `bin/` directory
    pub fn script_path(&self, script: &str) -> String {
        format!("{}/bin/{script}", self.home)
    }
}

/// Registry of known installations with an explicit load/save lifecycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallationRegistry {
    installations: Vec<RgInstallation>,
}

impl InstallationRegistry {
    /// Create a registry from a list of installations
    pub fn new(installations: Vec<RgInstallation>) -> Self {
        Self { installations }
    }

    /// Look up an installation by name; empty names match nothing
    pub fn get(&self, name: &str) -> Option<&RgInstallation> {
        if name.is_empty() {
            return None;
        }
        self.installations.iter().find(|i| i.name == name)
    }

    /// Add an installation
    pub fn push(&mut self, installation: RgInstallation) {
        self.installations.push(installation);
    }

    /// All registered installations
    pub fn installations(&self) -> &[RgInstallation] {
        &self.installations
    }

    /// Load a registry from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| Error::config(format!("invalid registry: {e}")))
    }

    /// Save the registry to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| Error::config(format!("registry not serializable: {e}")))?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

/// Configuration of one benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Name of the installation to run, resolved against the registry
    pub installation: String,

    /// Remote login program; old configurations omit it and default to ssh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_login_program: Option<RemoteLoginProgram>,

    /// Login user on the target nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_login: Option<String>,

    /// Remote workspace the scripts run in
    pub workspace_path: String,

    /// Extra plugin path passed to the master script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_path: Option<String>,

    /// Plugin configuration path passed to the master script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_config_path: Option<String>,

    /// Reporter path passed to the master script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_path: Option<String>,

    /// Target nodes; first is the master node
    pub nodes: Vec<Node>,
}

impl RunConfig {
    /// Parse a run configuration from TOML
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("invalid run config: {e}")))
    }

    /// Load a run configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.installation.is_empty() {
            return Err(ConfigError::MissingInstallation);
        }
        if self.workspace_path.is_empty() {
            return Err(ConfigError::MissingWorkspace);
        }
        if self.nodes.is_empty() {
            return Err(ConfigError::NoNodes);
        }
        Ok(())
    }

    /// The remote login program, defaulting to ssh for old configurations
    pub fn login_program(&self) -> RemoteLoginProgram {
        match self.remote_login_program {
            Some(program) => program,
            None => {
                tracing::warn!(
                    "no remote login program configured, defaulting to ssh; \
                     set 'remote_login_program' explicitly"
                );
                RemoteLoginProgram::default()
            }
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No installation name given
    #[error("installation name must not be empty")]
    MissingInstallation,

    /// No workspace path given
    #[error("workspace path must not be empty")]
    MissingWorkspace,

    /// No nodes given
    #[error("at least one node is required")]
    NoNodes,
}

/// Warn about deprecated configuration shapes; never fatal
pub fn check_deprecated_configs(nodes: &NodeList) {
    for node in nodes.iter() {
        if node.jvm_opts.is_some() {
            tracing::warn!(
                hostname = %node.hostname,
                "node uses deprecated 'jvm_opts', move JVM options into 'env_vars'"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> RunConfig {
        RunConfig {
            installation: "rg-3.0".to_string(),
            remote_login_program: Some(RemoteLoginProgram::Ssh),
            remote_login: None,
            workspace_path: "/workspace".to_string(),
            plugin_path: None,
            plugin_config_path: None,
            reporter_path: None,
            nodes: vec![Node::new("edg-01"), Node::new("edg-02")],
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = InstallationRegistry::new(vec![
            RgInstallation::new("rg-2.1", "/opt/radargun-2.1"),
            RgInstallation::new("rg-3.0", "/opt/radargun-3.0"),
        ]);

        assert_eq!(registry.get("rg-3.0").unwrap().home, "/opt/radargun-3.0");
        assert!(registry.get("rg-9.9").is_none());
        assert!(registry.get("").is_none());
    }

    #[test]
    fn test_registry_load_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installations.json");

        let registry =
            InstallationRegistry::new(vec![RgInstallation::new("rg-3.0", "/opt/radargun-3.0")]);
        registry.save(&path).unwrap();

        let loaded = InstallationRegistry::load(&path).unwrap();
        assert_eq!(loaded.installations(), registry.installations());
    }

    #[test]
    fn test_run_config_from_toml() {
        let config = RunConfig::from_toml_str(
            r#"
            installation = "rg-3.0"
            workspace_path = "/workspace"

            [[nodes]]
            hostname = "edg-01"
            login = "bench"

            [[nodes]]
            hostname = "edg-02"
            before_cmds = ["ulimit -n 4096"]

            [nodes.env_vars]
            JAVA_HOME = "/opt/jdk"
            "#,
        )
        .unwrap();

        assert_eq!(config.installation, "rg-3.0");
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.nodes[0].login.as_deref(), Some("bench"));
        assert_eq!(
            config.nodes[1].env_vars.as_ref().unwrap().get("JAVA_HOME"),
            Some(&"/opt/jdk".to_string())
        );
    }

    #[test]
    fn test_run_config_validation() {
        assert!(sample_config().validate().is_ok());

        let mut config = sample_config();
        config.installation.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingInstallation)
        ));

        let mut config = sample_config();
        config.workspace_path.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingWorkspace)
        ));

        let mut config = sample_config();
        config.nodes.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoNodes)));
    }

    #[test]
    fn test_legacy_login_program_defaults_to_ssh() {
        let mut config = sample_config();
        config.remote_login_program = None;
        assert_eq!(config.login_program(), RemoteLoginProgram::Ssh);
    }

    #[test]
    fn test_installation_script_path() {
        let installation = RgInstallation::new("rg-3.0", "/opt/radargun-3.0");
        assert_eq!(
            installation.script_path("master.sh"),
            "/opt/radargun-3.0/bin/master.sh"
        );
    }
}
