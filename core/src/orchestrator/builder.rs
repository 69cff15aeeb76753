//! Builder pattern for Orchestrator construction

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::{InstallationRegistry, RunConfig};
use crate::error::{Error, Result};
use crate::launcher::{Launcher, LocalLauncher};
use crate::resolver::Resolver;
use crate::sources::{NullScenarioSource, ScenarioSource, ScriptSource};

use super::executor::Orchestrator;

/// Builder for creating an Orchestrator with proper configuration
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .config(run_config)
///     .installations(registry)
///     .script_source(script_source)
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    config: Option<RunConfig>,
    installations: Option<InstallationRegistry>,
    resolver: Resolver,
    launcher: Arc<dyn Launcher>,
    script_source: Option<Arc<dyn ScriptSource>>,
    scenario_source: Arc<dyn ScenarioSource>,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder
    pub fn new() -> Self {
        Self {
            config: None,
            installations: None,
            resolver: Resolver::default(),
            launcher: Arc::new(LocalLauncher),
            script_source: None,
            scenario_source: Arc::new(NullScenarioSource),
        }
    }

    /// Set the run configuration
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the installation registry
    pub fn installations(mut self, installations: InstallationRegistry) -> Self {
        self.installations = Some(installations);
        self
    }

    /// Set the variable resolver
    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the command execution boundary; defaults to [`LocalLauncher`]
    pub fn launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Set the script source
    pub fn script_source(mut self, source: Arc<dyn ScriptSource>) -> Self {
        self.script_source = Some(source);
        self
    }

    /// Set the scenario source; defaults to [`NullScenarioSource`]
    pub fn scenario_source(mut self, source: Arc<dyn ScenarioSource>) -> Self {
        self.scenario_source = source;
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if the config, installations, or script source are
    /// not set, or if configuration validation fails.
    pub fn build(self) -> Result<Orchestrator> {
        let config = self.config.ok_or_else(|| Error::missing_config("config"))?;
        let installations = self
            .installations
            .ok_or_else(|| Error::missing_config("installations"))?;
        let script_source = self
            .script_source
            .ok_or_else(|| Error::missing_config("script_source"))?;

        config.validate().map_err(|e| Error::config(e.to_string()))?;

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Orchestrator {
            config,
            installations,
            resolver: self.resolver,
            launcher: self.launcher,
            script_source,
            scenario_source: self.scenario_source,
            shutdown_tx,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
