//! Prompt engine error types

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("invalid prompt engine configuration: {0}")]
    Configuration(String),

    #[error("unknown prompt engine type: {kind}")]
    UnknownEngineType { kind: String },

    #[error("no prompt found for prompt '{prompt}' in interpolation engine")]
    PromptNotFound { prompt: String },

    #[error("missing required argument '{argument}' for prompt '{prompt}'")]
    MissingArgument { argument: String, prompt: String },

    #[error("failed to interpolate prompt for prompt '{prompt}': {message}")]
    InterpolationFailed { prompt: String, message: String },
}

impl PromptError {
    /// Name of the prompt the error refers to, when it refers to one
    pub fn prompt(&self) -> Option<&str> {
        match self {
            Self::PromptNotFound { prompt }
            | Self::MissingArgument { prompt, .. }
            | Self::InterpolationFailed { prompt, .. } => Some(prompt),
            Self::Configuration(_) | Self::UnknownEngineType { .. } => None,
        }
    }
}

/// Result alias for prompt engine operations
pub type EngineResult<T> = Result<T, PromptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_the_failing_prompt() {
        let missing = PromptError::MissingArgument {
            argument: "company".to_string(),
            prompt: "welcome".to_string(),
        };
        assert_eq!(missing.prompt(), Some("welcome"));

        let malformed = PromptError::InterpolationFailed {
            prompt: "farewell".to_string(),
            message: "unsupported placeholder '{0}'".to_string(),
        };
        assert_eq!(malformed.prompt(), Some("farewell"));

        let unknown = PromptError::UnknownEngineType {
            kind: "jinja".to_string(),
        };
        assert_eq!(unknown.prompt(), None);
    }
}
