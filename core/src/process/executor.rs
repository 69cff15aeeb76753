//! Node process lifecycle

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::command::{build_node_cmd_line, ScriptConfig};
use crate::context::RgBuild;
use crate::error::{Error, Result};
use crate::launcher::{LaunchError, LaunchSpec, Launcher};
use crate::sources::ScriptSource;

use super::ProcessRole;

/// Errors at the process boundary
#[derive(Debug, Error)]
pub enum ProcessError {
    /// `wait_for_result` called before `start`
    #[error("process was never started")]
    NotStarted,

    /// `start` called twice on the same instance
    #[error("process already started")]
    AlreadyStarted,

    /// The external invocation could not be launched
    #[error("launch failed: {0}")]
    Launch(#[from] LaunchError),

    /// The execution crashed before producing an exit code
    #[error("execution failed: {0}")]
    Execution(String),

    /// The waiting task was cancelled; callers treat this as a request to
    /// abort the whole run, not as a process failure
    #[error("wait interrupted")]
    Interrupted,

    /// The process was force-terminated
    #[error("process killed")]
    Killed,
}

/// One external command execution on one node
pub struct RgProcess {
    role: ProcessRole,
    spec: LaunchSpec,
    launcher: Arc<dyn Launcher>,
    handle: Option<JoinHandle<std::result::Result<i32, ProcessError>>>,
    kill_tx: watch::Sender<bool>,
    kill_rx: watch::Receiver<bool>,
}

impl RgProcess {
    /// Create a process from an already-built launch spec
    pub fn new(role: ProcessRole, spec: LaunchSpec, launcher: Arc<dyn Launcher>) -> Self {
        let (kill_tx, kill_rx) = watch::channel(false);
        Self {
            role,
            spec,
            launcher,
            handle: None,
            kill_tx,
            kill_rx,
        }
    }

    /// Build the master process for a run
    pub async fn master(build: &RgBuild, source: &dyn ScriptSource) -> Result<Self> {
        let script_path = source
            .master_script_path(&build.workspace)
            .await
            .map_err(|e| Error::launch(format!("cannot resolve master script: {e}")))?;
        let config = ScriptConfig::master().with_args(build.master_args());
        let cmd = build_node_cmd_line(
            build.login_program(),
            &script_path,
            build.nodes.master(),
            &config,
            &build.workspace,
        );
        Ok(Self::new(
            ProcessRole::Master,
            LaunchSpec::new(cmd),
            Arc::clone(&build.launcher),
        ))
    }

    /// Build the slave process with the given index for a run
    pub async fn slave(build: &RgBuild, index: usize, source: &dyn ScriptSource) -> Result<Self> {
        let script_path = source
            .slave_script_path(&build.workspace)
            .await
            .map_err(|e| Error::launch(format!("cannot resolve slave script: {e}")))?;
        let node = &build.nodes.slaves()[index];
        let config = ScriptConfig::slave(index).with_args(build.slave_args());
        let cmd = build_node_cmd_line(
            build.login_program(),
            &script_path,
            node,
            &config,
            &build.workspace,
        );
        Ok(Self::new(
            ProcessRole::Slave { index },
            LaunchSpec::new(cmd),
            Arc::clone(&build.launcher),
        ))
    }

    /// This process's role
    pub fn role(&self) -> ProcessRole {
        self.role
    }

    /// The launch spec this process will execute
    pub fn spec(&self) -> &LaunchSpec {
        &self.spec
    }

    /// Submit the execution as a dedicated task; non-blocking
    ///
    /// The task launches the external command and then races its completion
    /// against the kill signal.
    pub fn start(&mut self) -> std::result::Result<(), ProcessError> {
        if self.handle.is_some() {
            return Err(ProcessError::AlreadyStarted);
        }

        let role = self.role;
        let spec = self.spec.clone();
        let launcher = Arc::clone(&self.launcher);
        let mut kill_rx = self.kill_rx.clone();

        tracing::debug!(role = %role, command = %spec.display_cmd(), "starting node process");

        self.handle = Some(tokio::spawn(async move {
            if *kill_rx.borrow() {
                return Err(ProcessError::Killed);
            }

            let mut child = launcher.launch(&spec).await?;

            tokio::select! {
                biased;

                // the wait_for read guard must not outlive its own branch
                // future, the spawned task has to stay Send
                _ = async { let _ = kill_rx.wait_for(|killed| *killed).await; } => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(role = %role, error = %e, "killing node process failed");
                    }
                    Err(ProcessError::Killed)
                }

                result = child.wait() => {
                    match result {
                        Ok(code) => {
                            tracing::debug!(role = %role, exit_code = code, "node process finished");
                            Ok(code)
                        }
                        Err(e) => Err(ProcessError::Execution(e.to_string())),
                    }
                }
            }
        }));

        Ok(())
    }

    /// Await the exit code of the execution
    ///
    /// Fails with [`ProcessError::Launch`] or [`ProcessError::Execution`]
    /// when no exit code could be produced, and with
    /// [`ProcessError::Interrupted`] when the execution task was cancelled
    /// underneath the waiter.
    pub async fn wait_for_result(&mut self) -> std::result::Result<i32, ProcessError> {
        let handle = self.handle.take().ok_or(ProcessError::NotStarted)?;
        match handle.await {
            Ok(result) => result,
            Err(join_err) if join_err.is_cancelled() => Err(ProcessError::Interrupted),
            Err(join_err) => Err(ProcessError::Execution(join_err.to_string())),
        }
    }

    /// Advisory force-termination
    ///
    /// Safe to call multiple times, before `start`, and after completion;
    /// never fails past this boundary.
    pub fn kill(&self) {
        tracing::debug!(role = %self.role, "kill requested");
        let _ = self.kill_tx.send(true);
    }

    /// Abort the execution task during teardown
    ///
    /// Returns true when the task was still running. Aborting drops the
    /// child handle, which terminates the external process.
    pub fn abort(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for RgProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgProcess")
            .field("role", &self.role)
            .field("started", &self.handle.is_some())
            .field("command", &self.spec.display_cmd())
            .finish()
    }
}
