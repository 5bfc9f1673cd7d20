//! Interpolation engine: literal `{placeholder}` substitution over a fixed
//! set of named templates.
//!
//! Template grammar:
//! - `{{` and `}}` render a literal brace
//! - `{ident}` is replaced by the argument named `ident`, where `ident` is
//!   `[A-Za-z_][A-Za-z0-9_]*`
//! - anything else between braces, an unclosed `{`, or a lone `}` is rejected
//!
//! Argument values are copied into the output as-is and never re-scanned, so a
//! value that itself looks like a template renders verbatim.

use indexmap::IndexMap;
use mcpkit_types::{Prompt, PromptMessage, PromptResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use crate::{EngineResult, PromptEngine, PromptError};

/// A template as written in configuration: either the bare template string or
/// an object carrying it under `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptTemplate {
    Text(String),
    Structured { text: String },
}

impl PromptTemplate {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::Structured { text } => text,
        }
    }

    fn into_string(self) -> String {
        match self {
            Self::Text(text) | Self::Structured { text } => text,
        }
    }
}

impl From<&str> for PromptTemplate {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PromptTemplate {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterpolationPromptEngine {
    prompts: IndexMap<String, String>,
}

impl InterpolationPromptEngine {
    pub const KIND: &'static str = "interpolation";

    pub fn new<I, K, T>(prompts: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<PromptTemplate>,
    {
        Self {
            prompts: prompts
                .into_iter()
                .map(|(name, template)| (name.into(), template.into().into_string()))
                .collect(),
        }
    }

    /// Build from `{"type": "interpolation", "prompts": {name: template, ...}}`.
    ///
    /// The templates are copied out of `config`; the engine keeps no reference
    /// to it.
    pub fn from_config(config: &Value) -> EngineResult<Self> {
        let prompts = config.get("prompts").ok_or_else(|| {
            PromptError::Configuration("configuration must include a 'prompts' parameter".to_string())
        })?;

        let prompts: IndexMap<String, PromptTemplate> = serde_json::from_value(prompts.clone())
            .map_err(|e| PromptError::Configuration(format!("invalid 'prompts' parameter: {e}")))?;

        Ok(Self::new(prompts))
    }

    pub fn template(&self, name: &str) -> Option<&str> {
        self.prompts.get(name).map(String::as_str)
    }

    /// Configured prompt names, in configuration order
    pub fn prompt_names(&self) -> impl Iterator<Item = &str> {
        self.prompts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl PromptEngine for InterpolationPromptEngine {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn generate(
        &self,
        target_name: &str,
        prompt: &Prompt,
        arguments: Option<&HashMap<String, String>>,
    ) -> EngineResult<PromptResult> {
        let template = self
            .template(&prompt.name)
            .ok_or_else(|| PromptError::PromptNotFound {
                prompt: prompt.name.clone(),
            })?;

        let empty = HashMap::new();
        let arguments = arguments.unwrap_or(&empty);
        let text = interpolate(&prompt.name, template, arguments)?;

        Ok(PromptResult {
            description: Some(format!(
                "Interpolated response for prompt '{}' from {}",
                prompt.name, target_name
            )),
            messages: vec![PromptMessage::user_text(text)],
        })
    }
}

fn interpolate(
    prompt_name: &str,
    template: &str,
    arguments: &HashMap<String, String>,
) -> EngineResult<String> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if next_is(&mut chars, '{') => output.push('{'),
            '}' if next_is(&mut chars, '}') => output.push('}'),
            '{' => {
                let field = read_field(prompt_name, &mut chars)?;
                let value = arguments
                    .get(&field)
                    .ok_or_else(|| PromptError::MissingArgument {
                        argument: field.clone(),
                        prompt: prompt_name.to_string(),
                    })?;
                output.push_str(value);
            }
            '}' => {
                return Err(malformed(
                    prompt_name,
                    "single '}' encountered in template".to_string(),
                ))
            }
            other => output.push(other),
        }
    }

    Ok(output)
}

/// Consume the next char when it equals `expected`
fn next_is(chars: &mut Peekable<Chars<'_>>, expected: char) -> bool {
    chars.next_if_eq(&expected).is_some()
}

/// Read a placeholder body up to its closing brace. Only bare identifiers are
/// accepted, so padding such as `{ name }` is malformed instead of naming an
/// argument called ` name `.
fn read_field(prompt_name: &str, chars: &mut Peekable<Chars<'_>>) -> EngineResult<String> {
    let mut field = String::new();
    loop {
        match chars.next() {
            Some('}') => break,
            Some(c) => field.push(c),
            None => {
                return Err(malformed(
                    prompt_name,
                    "expected '}' before end of template".to_string(),
                ))
            }
        }
    }

    if !is_identifier(&field) {
        return Err(malformed(
            prompt_name,
            format!("unsupported placeholder '{{{field}}}'"),
        ));
    }

    Ok(field)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn malformed(prompt_name: &str, message: String) -> PromptError {
    PromptError::InterpolationFailed {
        prompt: prompt_name.to_string(),
        message,
    }
}
