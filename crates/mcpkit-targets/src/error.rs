//! Target error types

use mcpkit_prompts::PromptError;
use thiserror::Error;

use crate::mcp::McpClientError;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("target '{target}' is not initialized; call initialize() first")]
    NotInitialized { target: String },

    #[error("invalid target configuration: {0}")]
    Configuration(String),

    #[error("unknown target type: {kind}")]
    UnknownTargetType { kind: String },

    #[error("registry at {url} for target '{target}' is unreachable: {message}")]
    RegistryUnreachable {
        target: String,
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("registry response for target '{target}' is invalid: {message}")]
    RegistryResponseInvalid { target: String, message: String },

    #[error("tool '{tool}' not found on target '{target}'")]
    ToolNotFound { target: String, tool: String },

    #[error("prompt '{prompt}' not found on target '{target}'")]
    PromptNotFound { target: String, prompt: String },

    #[error("tool '{tool}' on target '{target}' reported an error: {message}")]
    ToolFailed {
        target: String,
        tool: String,
        message: String,
    },

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Mcp(#[from] McpClientError),
}

impl TargetError {
    pub(crate) fn not_initialized(target: &str) -> Self {
        Self::NotInitialized {
            target: target.to_string(),
        }
    }

    /// Errors produced while resolving a registry target, as opposed to
    /// errors raised by the target it resolved to
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Self::RegistryUnreachable { .. } | Self::RegistryResponseInvalid { .. }
        )
    }
}

/// Result type for target operations
pub type TargetResult<T> = Result<T, TargetError>;
