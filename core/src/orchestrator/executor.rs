//! Orchestrator execution logic

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::cleanup::{self, CleanupError};
use crate::config::{check_deprecated_configs, InstallationRegistry, RunConfig};
use crate::context::RgBuild;
use crate::error::{Error, Result};
use crate::launcher::Launcher;
use crate::node::NodeList;
use crate::process::{ProcessError, RgProcess};
use crate::resolver::Resolver;
use crate::sources::{ScenarioSource, ScriptSource};

/// Final outcome of one benchmark run
///
/// Cancelled is deliberately distinct from Failed: a run stopped on request
/// did not fail, but it did not succeed either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Master finished with exit code zero
    Success,
    /// Master finished nonzero, or a configuration or launch error occurred
    Failed,
    /// The run was stopped on request while waiting on the master
    Cancelled,
}

impl RunOutcome {
    /// Whether the run succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}

/// Orchestrator manages the run lifecycle
///
/// Responsible for preparing and launching one process per node, waiting
/// on the master's result, and tearing everything down deterministically
/// regardless of outcome.
pub struct Orchestrator {
    /// Run configuration
    pub(crate) config: RunConfig,

    /// Known installations
    pub(crate) installations: InstallationRegistry,

    /// Variable resolver for configuration strings
    pub(crate) resolver: Resolver,

    /// Command execution boundary (shared with every process)
    pub(crate) launcher: Arc<dyn Launcher>,

    /// Supplies the node init scripts
    pub(crate) script_source: Arc<dyn ScriptSource>,

    /// Supplies the benchmark scenario
    pub(crate) scenario_source: Arc<dyn ScenarioSource>,

    /// Cancellation signal sender
    pub(crate) shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Get a cancellation signal receiver
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Request cancellation of a running orchestration
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// The run configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the benchmark
    ///
    /// Configuration and launch errors are logged and reported as
    /// [`RunOutcome::Failed`]; cancellation while waiting on the master
    /// yields [`RunOutcome::Cancelled`]. Only an execution failure while
    /// waiting on the master escalates to [`Error::Abort`]: the run cannot
    /// determine success or failure, so it must not report a silent false.
    /// Cleanup runs in every case.
    pub async fn run(&self) -> Result<RunOutcome> {
        let start = Instant::now();
        tracing::info!(
            installation = %self.config.installation,
            nodes = self.config.nodes.len(),
            "starting benchmark run"
        );

        // subscribe before any phase runs; a broadcast with no receivers
        // drops the message, and a cancellation that arrives while paths
        // are still resolving must not be lost
        let shutdown_rx = self.shutdown_receiver();

        let mut processes: Vec<RgProcess> = Vec::new();
        let phases = self.run_phases(&mut processes, shutdown_rx).await;

        self.cleanup(&mut processes).await;

        let outcome = match phases {
            Ok(outcome) => outcome,
            Err(Error::Abort(msg)) => {
                tracing::error!(error = %msg, "failing the run, master result unavailable");
                return Err(Error::Abort(msg));
            }
            Err(e) => {
                tracing::error!(error = %e, "run failed");
                RunOutcome::Failed
            }
        };

        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            outcome = ?outcome,
            "run finished"
        );
        Ok(outcome)
    }

    /// Run with Ctrl+C handling; the signal triggers cancellation
    pub async fn run_with_signal_handling(&self) -> Result<RunOutcome> {
        let shutdown_tx = self.shutdown_tx.clone();

        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("received Ctrl+C, cancelling the run");
                    let _ = shutdown_tx.send(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to listen for Ctrl+C");
                }
            }
        });

        let result = self.run().await;

        signal_handle.abort();

        result
    }

    /// Preparing, Launching, and WaitingOnMaster; cleanup happens in the
    /// caller so it runs on every exit path
    async fn run_phases(
        &self,
        processes: &mut Vec<RgProcess>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<RunOutcome> {
        // Preparing
        let rg_build = self.prepare_build()?;
        *processes = self.prepare_processes(&rg_build).await?;

        // Launching: starts are non-blocking submissions in list order, one
        // dedicated task per process, no readiness barrier between them
        for process in processes.iter_mut() {
            let role = process.role();
            process
                .start()
                .map_err(|e| Error::launch(format!("starting {role} failed: {e}")))?;
        }
        tracing::info!(processes = processes.len(), "all node processes started");

        // WaitingOnMaster
        self.wait_for_master(&mut processes[0], shutdown_rx).await
    }

    /// Resolve the installation and snapshot the run context
    pub(crate) fn prepare_build(&self) -> Result<RgBuild> {
        self.config
            .validate()
            .map_err(|e| Error::config(e.to_string()))?;

        let installation = self
            .installations
            .get(&self.config.installation)
            .cloned()
            .ok_or_else(|| {
                Error::config(format!(
                    "unknown installation '{}'",
                    self.config.installation
                ))
            })?;

        let mut nodes = self.config.nodes.clone();
        for node in &mut nodes {
            node.hostname = self.resolver.resolve(&node.hostname);
            if node.login.is_none() {
                node.login = self.resolver.resolve_opt(self.config.remote_login.as_deref());
            }
        }
        let nodes = NodeList::new(nodes)?;
        check_deprecated_configs(&nodes);

        let workspace = self.resolver.resolve(&self.config.workspace_path);

        Ok(RgBuild {
            config: self.config.clone(),
            nodes,
            installation,
            workspace,
            launcher: Arc::clone(&self.launcher),
        })
    }

    /// Construct one process per node, master first, slaves in list order
    pub(crate) async fn prepare_processes(&self, rg_build: &RgBuild) -> Result<Vec<RgProcess>> {
        let mut processes = Vec::with_capacity(rg_build.nodes.len());
        processes.push(RgProcess::master(rg_build, self.script_source.as_ref()).await?);
        for index in 0..rg_build.nodes.slaves().len() {
            processes.push(RgProcess::slave(rg_build, index, self.script_source.as_ref()).await?);
        }
        Ok(processes)
    }

    /// Block only on the master; slave completion is not observed here, a
    /// slave failure is the master's to detect
    ///
    /// The receiver was subscribed before the preparing phase, so a
    /// cancellation requested at any point since the run started is
    /// observed here.
    async fn wait_for_master(
        &self,
        master: &mut RgProcess,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<RunOutcome> {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => {
                tracing::info!("stopping the run, cancellation requested");
                Ok(RunOutcome::Cancelled)
            }

            result = master.wait_for_result() => match result {
                Ok(0) => Ok(RunOutcome::Success),
                Ok(code) => {
                    tracing::info!(exit_code = code, "master finished with nonzero exit code");
                    Ok(RunOutcome::Failed)
                }
                Err(ProcessError::Interrupted) => {
                    tracing::info!("stopping the run, master wait interrupted");
                    Ok(RunOutcome::Cancelled)
                }
                Err(ProcessError::Launch(e)) => {
                    Err(Error::launch(format!("master never started: {e}")))
                }
                Err(e) => Err(Error::abort(format!("getting master result failed: {e}"))),
            }
        }
    }

    /// Total-effort teardown: pool shutdown, then collaborator cleanup,
    /// then an explicit master kill. The ordering guarantees no new work
    /// starts before the kill, and the kill is attempted even when earlier
    /// steps fail.
    async fn cleanup(&self, processes: &mut [RgProcess]) {
        let mut still_running = 0usize;
        for process in processes.iter_mut() {
            if process.abort() {
                still_running += 1;
            }
        }
        tracing::debug!(
            count = still_running,
            "execution tasks still running at shutdown"
        );

        let script_source = Arc::clone(&self.script_source);
        let scenario_source = Arc::clone(&self.scenario_source);
        cleanup::run_all(
            "run teardown",
            vec![
                (
                    "script source",
                    Box::pin(async move {
                        script_source
                            .cleanup()
                            .await
                            .map_err(|e| Box::new(e) as CleanupError)
                    }),
                ),
                (
                    "scenario source",
                    Box::pin(async move {
                        scenario_source
                            .cleanup()
                            .await
                            .map_err(|e| Box::new(e) as CleanupError)
                    }),
                ),
            ],
        )
        .await;

        if let Some(master) = processes.first() {
            master.kill();
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("installation", &self.config.installation)
            .field("nodes", &self.config.nodes.len())
            .finish()
    }
}
