//! Command execution boundary
//!
//! Every node process ultimately invokes an external command (the
//! remote-login program) with a constructed argument vector. The
//! [`Launcher`] trait is the seam between the orchestration logic and the
//! operating system; tests substitute mock launchers, production uses
//! [`LocalLauncher`] on top of `tokio::process`.

use std::process::Stdio;

use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::process::{Child, Command};

/// Fully resolved invocation of an external command
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    /// Command line, first token is the executable
    pub cmd: Vec<String>,

    /// Working directory for the local process, if any
    pub workdir: Option<String>,

    /// Extra environment for the local process (the remote environment is
    /// carried inside the command line itself)
    pub env: IndexMap<String, String>,
}

impl LaunchSpec {
    /// Create a spec from a command line
    pub fn new(cmd: Vec<String>) -> Self {
        Self {
            cmd,
            workdir: None,
            env: IndexMap::new(),
        }
    }

    /// Command line joined for display
    pub fn display_cmd(&self) -> String {
        shlex::try_join(self.cmd.iter().map(String::as_str))
            .unwrap_or_else(|_| self.cmd.join(" "))
    }
}

/// Errors at the command execution boundary
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The command line was empty
    #[error("empty command line")]
    EmptyCommand,

    /// The process could not be spawned
    #[error("failed to spawn process: {0}")]
    Spawn(std::io::Error),

    /// Waiting on the process failed
    #[error("failed waiting on process: {0}")]
    Wait(std::io::Error),

    /// The process terminated by signal, without an exit code
    #[error("process terminated without an exit code")]
    NoExitCode,

    /// Killing the process failed
    #[error("failed to kill process: {0}")]
    Kill(std::io::Error),
}

/// Handle over one launched external process
#[async_trait]
pub trait ProcessHandle: Send {
    /// Wait for the process to finish and return its exit code
    async fn wait(&mut self) -> Result<i32, LaunchError>;

    /// Force-terminate the process
    async fn kill(&mut self) -> Result<(), LaunchError>;
}

/// Launches external commands
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start the command described by `spec` and return a handle to it
    async fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn ProcessHandle>, LaunchError>;
}

/// Launcher backed by `tokio::process`
///
/// Stdout and stderr are inherited so the remote output streams straight
/// into the run log. Children are killed on drop to keep teardown bounded
/// even when a task owning a child is aborted.
#[derive(Debug, Clone, Default)]
pub struct LocalLauncher;

#[async_trait]
impl Launcher for LocalLauncher {
    async fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn ProcessHandle>, LaunchError> {
        let (program, args) = spec.cmd.split_first().ok_or(LaunchError::EmptyCommand)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if let Some(dir) = &spec.workdir {
            command.current_dir(dir);
        }
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let child = command.spawn().map_err(LaunchError::Spawn)?;
        tracing::info!(pid = ?child.id(), command = %spec.display_cmd(), "spawned process");

        Ok(Box::new(ChildHandle { child }))
    }
}

struct ChildHandle {
    child: Child,
}

#[async_trait]
impl ProcessHandle for ChildHandle {
    async fn wait(&mut self) -> Result<i32, LaunchError> {
        let status = self.child.wait().await.map_err(LaunchError::Wait)?;
        status.code().ok_or(LaunchError::NoExitCode)
    }

    async fn kill(&mut self) -> Result<(), LaunchError> {
        self.child.kill().await.map_err(LaunchError::Kill)
    }
}
