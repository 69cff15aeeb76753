//! Remote command construction
//!
//! Builds the exact argument vector handed to the remote-login program for
//! one node: change into the workspace, run the user's before-commands, set
//! the environment, run the benchmark script in tail+wait mode, run the
//! after-commands. Tail+wait is forced unconditionally; without it the
//! login client returns as soon as the remote script backgrounds itself and
//! the orchestrator would tear the session down while the benchmark is
//! still running.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::node::Node;

/// Directory-change command prefix
pub const CD_CMD: &str = "cd";
/// Environment wrapper command
pub const ENV_CMD: &str = "env";
/// Separator between shell commands
pub const CMD_SEPARATOR: char = ';';
/// Separator between an environment key and its value
pub const ENV_KEY_VAL_SEPARATOR: char = '=';
/// Quote character around environment values
pub const ENV_VAR_QUOTE: char = '"';
/// Separator between flattened environment pairs
pub const VAR_SEPARATOR: char = ' ';

/// Remote-login program used to reach the target nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteLoginProgram {
    /// Secure shell client (the default)
    #[default]
    Ssh,
    /// Remote shell client
    Rsh,
}

impl RemoteLoginProgram {
    /// Invocation tokens placed at the front of the command line
    pub fn invocation(&self) -> &'static [&'static str] {
        match self {
            RemoteLoginProgram::Ssh => &["ssh"],
            RemoteLoginProgram::Rsh => &["rsh"],
        }
    }
}

/// Script invocation parameters for one node process
///
/// Master and slave runs differ only in the role-specific arguments the
/// script receives; both share the tail-follow and wait flags.
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    kind: ScriptKind,
    args: Vec<String>,
    tail_follow: bool,
    wait: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptKind {
    Master,
    Slave { index: usize },
}

impl ScriptConfig {
    /// Configuration for the master script
    pub fn master() -> Self {
        Self {
            kind: ScriptKind::Master,
            args: Vec::new(),
            tail_follow: false,
            wait: false,
        }
    }

    /// Configuration for the slave script with the given slave index
    pub fn slave(index: usize) -> Self {
        Self {
            kind: ScriptKind::Slave { index },
            args: Vec::new(),
            tail_follow: false,
            wait: false,
        }
    }

    /// Append extra script arguments
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args.extend(args);
        self
    }

    /// Keep the script attached, tailing the remote log
    pub fn with_tail_follow(mut self) -> Self {
        self.tail_follow = true;
        self
    }

    /// Make the script wait for the benchmark process to finish
    pub fn with_wait(mut self) -> Self {
        self.wait = true;
        self
    }

    /// The script's own invocation tokens
    pub fn script_cmd(&self, script_path: &str) -> Vec<String> {
        let mut cmd = vec![script_path.to_string()];
        if self.tail_follow {
            cmd.push("-t".to_string());
        }
        if self.wait {
            cmd.push("-w".to_string());
        }
        if let ScriptKind::Slave { index } = self.kind {
            cmd.push("-i".to_string());
            cmd.push(index.to_string());
        }
        cmd.extend(self.args.iter().cloned());
        cmd
    }
}

/// Build the full remote command line for one node
///
/// Token order: login program + target, `cd <workspace>;`, before-commands,
/// optional `env` + flattened overrides, the script in tail+wait mode, then
/// after-commands. Empty command lists and absent environment maps insert
/// no tokens.
pub fn build_node_cmd_line(
    login: RemoteLoginProgram,
    script_path: &str,
    node: &Node,
    script_config: &ScriptConfig,
    workspace: &str,
) -> Vec<String> {
    let mut cmd: Vec<String> = login.invocation().iter().map(|s| s.to_string()).collect();
    cmd.push(node.target());

    cmd.push(CD_CMD.to_string());
    cmd.push(format!("{workspace}{CMD_SEPARATOR}"));

    cmd.extend(user_cmds_to_args(&node.before_cmds, CMD_SEPARATOR, false));

    // env takes the command to run in the given environment as its
    // argument, so it must come right before the script tokens
    if let Some(env) = &node.env_vars {
        if !env.is_empty() {
            cmd.push(ENV_CMD.to_string());
            cmd.push(flatten_env_vars(env));
        }
    }

    let script_config = script_config.clone().with_tail_follow().with_wait();
    cmd.extend(script_config.script_cmd(script_path));

    cmd.extend(user_cmds_to_args(&node.after_cmds, CMD_SEPARATOR, true));

    cmd
}

/// Convert user commands into shell tokens, each command terminated by
/// `separator`. With `force_last_separator` false the final command is left
/// unterminated so the remote shell does not see a dangling separator.
pub fn user_cmds_to_args(
    cmds: &[String],
    separator: char,
    force_last_separator: bool,
) -> Vec<String> {
    let mut args = Vec::new();
    for (i, user_cmd) in cmds.iter().enumerate() {
        let mut tokens: Vec<String> = user_cmd.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            continue;
        }
        let is_last = i == cmds.len() - 1;
        if !is_last || force_last_separator {
            if let Some(last) = tokens.last_mut() {
                last.push(separator);
            }
        }
        args.extend(tokens);
    }
    args
}

/// Flatten environment overrides into a single `KEY="VALUE" ` string in map
/// iteration order, as consumed by the remote `env` command.
pub fn flatten_env_vars(env: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in env {
        out.push_str(key);
        out.push(ENV_KEY_VAL_SEPARATOR);
        out.push(ENV_VAR_QUOTE);
        out.push_str(value);
        out.push(ENV_VAR_QUOTE);
        out.push(VAR_SEPARATOR);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_cmd_line_minimal_node() {
        let node = Node::new("edg-01");
        let cmd = build_node_cmd_line(
            RemoteLoginProgram::Ssh,
            "/opt/rg/bin/master.sh",
            &node,
            &ScriptConfig::master(),
            "/workspace",
        );

        assert_eq!(
            cmd,
            vec![
                "ssh",
                "edg-01",
                "cd",
                "/workspace;",
                "/opt/rg/bin/master.sh",
                "-t",
                "-w",
            ]
        );
    }

    #[test]
    fn test_cmd_line_targets_login_user() {
        let node = Node::new("edg-01").with_login("bench");
        let cmd = build_node_cmd_line(
            RemoteLoginProgram::Ssh,
            "/opt/rg/bin/master.sh",
            &node,
            &ScriptConfig::master(),
            "/workspace",
        );
        assert_eq!(cmd[1], "bench@edg-01");
    }

    #[test]
    fn test_cmd_line_before_and_after_ordering() {
        let node = Node::new("edg-01")
            .with_before_cmds(vec![
                "ulimit -n 4096".to_string(),
                "mkdir -p /tmp/rg".to_string(),
            ])
            .with_after_cmds(vec!["rm -rf /tmp/rg".to_string()]);
        let cmd = build_node_cmd_line(
            RemoteLoginProgram::Ssh,
            "/opt/rg/bin/slave.sh",
            &node,
            &ScriptConfig::slave(0),
            "/workspace",
        );

        let script_pos = cmd.iter().position(|t| t == "/opt/rg/bin/slave.sh").unwrap();
        let before_pos = cmd.iter().position(|t| t == "ulimit").unwrap();
        let after_pos = cmd.iter().position(|t| t == "rm").unwrap();

        assert!(before_pos < script_pos);
        assert!(script_pos < after_pos);
        // inner before-commands are terminated, the last one is not;
        // after-commands always terminate
        assert_eq!(cmd[before_pos + 2], "4096;");
        let mkdir_pos = cmd.iter().position(|t| t == "mkdir").unwrap();
        assert_eq!(cmd[mkdir_pos + 2], "/tmp/rg");
        assert_eq!(*cmd.last().unwrap(), "/tmp/rg;");
    }

    #[test]
    fn test_cmd_line_empty_lists_insert_no_tokens() {
        let node = Node::new("edg-01");
        let cmd = build_node_cmd_line(
            RemoteLoginProgram::Ssh,
            "/opt/rg/bin/master.sh",
            &node,
            &ScriptConfig::master(),
            "/workspace",
        );
        assert!(!cmd.iter().any(|t| t == "env"));
        assert!(!cmd.iter().any(|t| t == ";"));
    }

    #[test]
    fn test_cmd_line_env_right_before_script() {
        let node = Node::new("edg-01").with_env_vars(env(&[("JAVA_HOME", "/opt/jdk")]));
        let cmd = build_node_cmd_line(
            RemoteLoginProgram::Ssh,
            "/opt/rg/bin/master.sh",
            &node,
            &ScriptConfig::master(),
            "/workspace",
        );

        let env_pos = cmd.iter().position(|t| t == "env").unwrap();
        assert_eq!(cmd[env_pos + 1], "JAVA_HOME=\"/opt/jdk\" ");
        assert_eq!(cmd[env_pos + 2], "/opt/rg/bin/master.sh");
    }

    #[test]
    fn test_cmd_line_empty_env_map_skipped() {
        let node = Node::new("edg-01").with_env_vars(IndexMap::new());
        let cmd = build_node_cmd_line(
            RemoteLoginProgram::Ssh,
            "/opt/rg/bin/master.sh",
            &node,
            &ScriptConfig::master(),
            "/workspace",
        );
        assert!(!cmd.iter().any(|t| t == "env"));
    }

    #[test]
    fn test_tail_and_wait_forced() {
        let node = Node::new("edg-01");
        // caller did not request tail/wait, the builder must force both
        let cmd = build_node_cmd_line(
            RemoteLoginProgram::Ssh,
            "/opt/rg/bin/slave.sh",
            &node,
            &ScriptConfig::slave(2),
            "/workspace",
        );
        let script_pos = cmd.iter().position(|t| t == "/opt/rg/bin/slave.sh").unwrap();
        assert_eq!(&cmd[script_pos + 1..script_pos + 5], ["-t", "-w", "-i", "2"]);
    }

    #[test]
    fn test_user_cmds_separator_flags() {
        let cmds = vec!["echo a".to_string(), "echo b".to_string()];

        let no_force = user_cmds_to_args(&cmds, ';', false);
        assert_eq!(no_force, vec!["echo", "a;", "echo", "b"]);

        let forced = user_cmds_to_args(&cmds, ';', true);
        assert_eq!(forced, vec!["echo", "a;", "echo", "b;"]);
    }

    #[test]
    fn test_user_cmds_empty_and_blank_entries() {
        assert!(user_cmds_to_args(&[], ';', true).is_empty());
        let blanks = vec!["   ".to_string()];
        assert!(user_cmds_to_args(&blanks, ';', true).is_empty());
    }

    #[test]
    fn test_flatten_env_vars_exact_format() {
        let flattened = flatten_env_vars(&env(&[("A", "1"), ("B", "2")]));
        assert_eq!(flattened, "A=\"1\" B=\"2\" ");
    }

    #[test]
    fn test_flatten_env_vars_round_trip() {
        let original = env(&[("JAVA_HOME", "/opt/jdk"), ("RG_OPTS", "-Xmx4g")]);
        let flattened = flatten_env_vars(&original);

        let mut recovered = IndexMap::new();
        for pair in flattened.split_terminator("\" ") {
            let (key, value) = pair.split_once("=\"").unwrap();
            recovered.insert(key.to_string(), value.to_string());
        }
        assert_eq!(recovered, original);
    }

    #[test]
    fn test_login_program_serde_lowercase() {
        assert_eq!(serde_json::to_string(&RemoteLoginProgram::Ssh).unwrap(), "\"ssh\"");
        let parsed: RemoteLoginProgram = serde_json::from_str("\"rsh\"").unwrap();
        assert_eq!(parsed, RemoteLoginProgram::Rsh);
    }
}
