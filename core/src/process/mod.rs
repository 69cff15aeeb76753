//! Node process abstraction
//!
//! One [`RgProcess`] wraps one external command execution on one node.
//! The master process determines the run result; slave processes run
//! unattended and their failures are detected by the master's own
//! protocol, not by the orchestrator.
//!
//! A process moves through Created -> Started -> Completed/Failed/Killed.
//! `start` spawns the execution as a dedicated task, `wait_for_result`
//! awaits the exit code, and `kill` is an advisory force-termination that
//! is safe in every state.

mod executor;

pub use executor::{ProcessError, RgProcess};

/// Role of a node process within the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// The coordinating process whose exit code decides the run result
    Master,
    /// An unattended process, named by its stable index
    Slave {
        /// Zero-based slave index, used to name and route its artifacts
        index: usize,
    },
}

impl ProcessRole {
    /// Whether this is the master role
    pub fn is_master(&self) -> bool {
        matches!(self, ProcessRole::Master)
    }
}

impl std::fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessRole::Master => write!(f, "master"),
            ProcessRole::Slave { index } => write!(f, "slave-{index}"),
        }
    }
}

#[cfg(test)]
mod tests;
