//! rgbench-core: Orchestration core for distributed benchmark runs
//!
//! This crate launches one master process and zero or more slave processes
//! on remote hosts via a remote-login program, waits for the master to
//! finish, and tears everything down deterministically, including on
//! partial failure. It provides:
//!
//! - Remote command construction (cd, env setup, tail+wait script mode)
//! - A process abstraction over master and slave executions
//! - The orchestrator coordinating launch, master wait, and total-effort
//!   cleanup
//! - Configuration, variable resolution, and the collaborator seams

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cleanup;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod launcher;
pub mod node;
pub mod orchestrator;
pub mod process;
pub mod resolver;
pub mod sources;

pub use command::{build_node_cmd_line, RemoteLoginProgram, ScriptConfig};
pub use config::{ConfigError, InstallationRegistry, RgInstallation, RunConfig};
pub use context::RgBuild;
pub use error::{Error, Result};
pub use launcher::{LaunchError, LaunchSpec, Launcher, LocalLauncher, ProcessHandle};
pub use node::{Node, NodeList};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, RunOutcome};
pub use process::{ProcessError, ProcessRole, RgProcess};
pub use resolver::Resolver;
pub use sources::{
    InstallationScriptSource, NullScenarioSource, ScenarioSource, ScriptSource, SourceError,
};
