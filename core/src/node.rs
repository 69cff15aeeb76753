//! Target machine definitions
//!
//! A run targets an ordered list of machines. The first entry hosts the
//! master process; every following entry hosts one slave process, indexed
//! by its position among the slaves. The list is an immutable snapshot for
//! the duration of a run.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One target machine: hostname, login, user commands, and environment
/// overrides applied when launching the benchmark script there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Hostname the remote-login program connects to
    pub hostname: String,

    /// Login user; when set the remote target becomes `user@hostname`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,

    /// Commands run on the node before the benchmark script
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_cmds: Vec<String>,

    /// Commands run on the node after the benchmark script
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after_cmds: Vec<String>,

    /// Environment overrides for the benchmark script, iteration order is
    /// preserved on the wire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<IndexMap<String, String>>,

    /// Deprecated: JVM options belong in `env_vars` now. Accepted for old
    /// configurations, reported by the deprecated-config check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jvm_opts: Option<String>,
}

impl Node {
    /// Create a node with just a hostname
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            login: None,
            before_cmds: Vec::new(),
            after_cmds: Vec::new(),
            env_vars: None,
            jvm_opts: None,
        }
    }

    /// Set the login user
    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    /// Set the before-commands
    pub fn with_before_cmds(mut self, cmds: Vec<String>) -> Self {
        self.before_cmds = cmds;
        self
    }

    /// Set the after-commands
    pub fn with_after_cmds(mut self, cmds: Vec<String>) -> Self {
        self.after_cmds = cmds;
        self
    }

    /// Set the environment overrides
    pub fn with_env_vars(mut self, env: IndexMap<String, String>) -> Self {
        self.env_vars = Some(env);
        self
    }

    /// Remote-login target, `user@hostname` when a login is configured
    pub fn target(&self) -> String {
        match &self.login {
            Some(login) => format!("{login}@{}", self.hostname),
            None => self.hostname.clone(),
        }
    }
}

/// Ordered, non-empty collection of target machines
///
/// The first node is the master node; the rest are slave nodes with
/// contiguous indices starting at 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeList(Vec<Node>);

impl NodeList {
    /// Build a node list, rejecting empty input
    pub fn new(nodes: Vec<Node>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::config("node list must not be empty"));
        }
        Ok(Self(nodes))
    }

    /// The master node (first entry)
    pub fn master(&self) -> &Node {
        &self.0[0]
    }

    /// The slave nodes, in list order
    pub fn slaves(&self) -> &[Node] {
        &self.0[1..]
    }

    /// Total node count (master + slaves)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the constructor rejects empty lists
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all nodes in list order
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_node_list_rejected() {
        assert!(NodeList::new(Vec::new()).is_err());
    }

    #[test]
    fn test_single_node_is_master_with_no_slaves() {
        let nodes = NodeList::new(vec![Node::new("edg-01")]).unwrap();
        assert_eq!(nodes.master().hostname, "edg-01");
        assert!(nodes.slaves().is_empty());
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_master_slave_split_preserves_order() {
        let nodes = NodeList::new(vec![
            Node::new("edg-01"),
            Node::new("edg-02"),
            Node::new("edg-03"),
        ])
        .unwrap();

        assert_eq!(nodes.master().hostname, "edg-01");
        let slaves: Vec<&str> = nodes.slaves().iter().map(|n| n.hostname.as_str()).collect();
        assert_eq!(slaves, vec!["edg-02", "edg-03"]);
    }

    #[test]
    fn test_node_target_with_login() {
        let node = Node::new("edg-01").with_login("bench");
        assert_eq!(node.target(), "bench@edg-01");
        assert_eq!(Node::new("edg-01").target(), "edg-01");
    }

    #[test]
    fn test_node_deserialization_defaults() {
        let node: Node = serde_json::from_str(r#"{"hostname": "edg-01"}"#).unwrap();
        assert!(node.login.is_none());
        assert!(node.before_cmds.is_empty());
        assert!(node.after_cmds.is_empty());
        assert!(node.env_vars.is_none());
    }
}
