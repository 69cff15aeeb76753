//! Orchestrator for the benchmark run lifecycle
//!
//! The Orchestrator drives one run through its phases:
//! - Preparing: resolve the installation, snapshot the node list, build one
//!   process per node
//! - Launching: start every process concurrently, one dedicated task each
//! - WaitingOnMaster: block only on the master's result
//! - CleaningUp: always runs; shuts the task pool down, cleans the source
//!   collaborators, and force-kills the master
//!
//! # Example
//!
//! ```ignore
//! use rgbench_core::{OrchestratorBuilder, RunOutcome};
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .config(run_config)
//!     .installations(registry)
//!     .script_source(script_source)
//!     .build()?;
//!
//! match orchestrator.run_with_signal_handling().await? {
//!     RunOutcome::Success => {}
//!     other => eprintln!("run ended with {other:?}"),
//! }
//! ```

mod builder;
mod executor;

pub use builder::OrchestratorBuilder;
pub use executor::{Orchestrator, RunOutcome};
