//! Run context
//!
//! [`RgBuild`] aggregates everything a run needs into one read-only
//! snapshot: the validated configuration, the node list, the resolved
//! installation, and the launcher. It is threaded through process
//! construction and never mutated after the preparing phase.

use std::sync::Arc;

use crate::command::RemoteLoginProgram;
use crate::config::{RgInstallation, RunConfig};
use crate::launcher::Launcher;
use crate::node::NodeList;

/// Read-only context of one benchmark run
#[derive(Clone)]
pub struct RgBuild {
    /// Validated run configuration
    pub config: RunConfig,

    /// Node list snapshot, first node is the master node
    pub nodes: NodeList,

    /// Resolved installation
    pub installation: RgInstallation,

    /// Resolved remote workspace path
    pub workspace: String,

    /// Command execution boundary
    pub launcher: Arc<dyn Launcher>,
}

impl RgBuild {
    /// The remote login program for this run
    pub fn login_program(&self) -> RemoteLoginProgram {
        self.config.login_program()
    }

    /// Extra arguments for the master script
    pub fn master_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(plugin) = &self.config.plugin_path {
            args.push("-p".to_string());
            args.push(plugin.clone());
        }
        if let Some(plugin_config) = &self.config.plugin_config_path {
            args.push("-c".to_string());
            args.push(plugin_config.clone());
        }
        if let Some(reporter) = &self.config.reporter_path {
            args.push("-r".to_string());
            args.push(reporter.clone());
        }
        args
    }

    /// Extra arguments for a slave script; slaves are pointed at the master
    /// node so they can join its cluster
    pub fn slave_args(&self) -> Vec<String> {
        let mut args = vec!["-m".to_string(), self.nodes.master().hostname.clone()];
        if let Some(plugin) = &self.config.plugin_path {
            args.push("-p".to_string());
            args.push(plugin.clone());
        }
        args
    }
}

impl std::fmt::Debug for RgBuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgBuild")
            .field("installation", &self.installation.name)
            .field("workspace", &self.workspace)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}
