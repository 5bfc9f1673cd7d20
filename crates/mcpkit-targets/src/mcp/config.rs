use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::{TargetError, TargetResult};

const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// How to launch an MCP server: `{type: "mcp", name, command, args?, env?, cwd?, timeout_secs?}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct McpServerConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl McpServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Split `command` shell-style into program and arguments when no
    /// explicit `args` were given
    pub fn normalized(mut self) -> TargetResult<Self> {
        if !self.args.is_empty() {
            return Ok(self);
        }

        let mut parts = shlex::split(&self.command).ok_or_else(|| {
            TargetError::Configuration(format!(
                "mcp target '{}': failed to parse command: {}",
                self.name, self.command
            ))
        })?;

        if parts.is_empty() {
            return Err(TargetError::Configuration(format!(
                "mcp target '{}': command is empty",
                self.name
            )));
        }

        self.command = parts.remove(0);
        self.args = parts;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_command_line_when_args_are_empty() {
        let cfg = McpServerConfig::new(
            "filesystem",
            "npx -y @modelcontextprotocol/server-filesystem '/tmp/my dir'",
        )
        .normalized()
        .unwrap();

        assert_eq!(cfg.command, "npx");
        assert_eq!(
            cfg.args,
            vec!["-y", "@modelcontextprotocol/server-filesystem", "/tmp/my dir"]
        );
    }

    #[test]
    fn explicit_args_are_kept() {
        let cfg = McpServerConfig::new("py", "python3 server.py")
            .with_args(["-u"])
            .normalized()
            .unwrap();
        assert_eq!(cfg.command, "python3 server.py");
        assert_eq!(cfg.args, vec!["-u"]);
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = McpServerConfig::new("blank", "  ").normalized().unwrap_err();
        assert!(err.to_string().contains("blank"), "{err}");
    }
}
