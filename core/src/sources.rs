//! Script and scenario source collaborators
//!
//! Sources supply the paths of the init scripts launched on the remote
//! nodes and clean up any temporary material they produced. Cleanup is
//! advisory: the orchestrator swallows and logs cleanup errors so teardown
//! stays total-effort.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::RgInstallation;

/// Errors raised by source collaborators
#[derive(Debug, Error)]
pub enum SourceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other source failure
    #[error("{0}")]
    Other(String),
}

/// Supplies the init scripts used to launch the benchmark on remote nodes
#[async_trait]
pub trait ScriptSource: Send + Sync {
    /// Path of the master init script, relative to the run workspace
    async fn master_script_path(&self, workspace: &str) -> Result<String, SourceError>;

    /// Path of the slave init script, relative to the run workspace
    async fn slave_script_path(&self, workspace: &str) -> Result<String, SourceError>;

    /// Remove temporary files produced by this source
    async fn cleanup(&self) -> Result<(), SourceError>;
}

/// Supplies the benchmark scenario; only its cleanup obligation is part of
/// the orchestration contract
#[async_trait]
pub trait ScenarioSource: Send + Sync {
    /// Remove temporary files produced by this source
    async fn cleanup(&self) -> Result<(), SourceError>;
}

/// Script source anchored at an installation's `bin/` directory
#[derive(Debug, Clone)]
pub struct InstallationScriptSource {
    master: String,
    slave: String,
}

impl InstallationScriptSource {
    /// Standard master init script name
    pub const MASTER_SCRIPT: &'static str = "master.sh";
    /// Standard slave init script name
    pub const SLAVE_SCRIPT: &'static str = "slave.sh";

    /// Point at the `bin/` scripts of the given installation
    pub fn new(installation: &RgInstallation) -> Self {
        Self {
            master: installation.script_path(Self::MASTER_SCRIPT),
            slave: installation.script_path(Self::SLAVE_SCRIPT),
        }
    }
}

#[async_trait]
impl ScriptSource for InstallationScriptSource {
    async fn master_script_path(&self, _workspace: &str) -> Result<String, SourceError> {
        Ok(self.master.clone())
    }

    async fn slave_script_path(&self, _workspace: &str) -> Result<String, SourceError> {
        Ok(self.slave.clone())
    }

    async fn cleanup(&self) -> Result<(), SourceError> {
        // installation scripts are permanent, nothing to remove
        Ok(())
    }
}

/// Scenario source with no temporary material
#[derive(Debug, Clone, Default)]
pub struct NullScenarioSource;

#[async_trait]
impl ScenarioSource for NullScenarioSource {
    async fn cleanup(&self) -> Result<(), SourceError> {
        Ok(())
    }
}
