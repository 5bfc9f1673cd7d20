//! Prompt engine trait and the discriminator-keyed engine factory

use mcpkit_types::{Prompt, PromptResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{EngineResult, InterpolationPromptEngine, PromptError};

/// Turns a prompt definition plus string arguments into a prompt result.
///
/// Engines hold no mutable state between calls; `generate` is pure
/// computation and never suspends.
pub trait PromptEngine: Send + Sync {
    /// Discriminator this engine is registered under
    fn kind(&self) -> &'static str;

    /// Render `prompt` for the target identified by `target_name`
    fn generate(
        &self,
        target_name: &str,
        prompt: &Prompt,
        arguments: Option<&HashMap<String, String>>,
    ) -> EngineResult<PromptResult>;
}

/// Builds an engine from its configuration record
pub type EngineConstructor =
    Arc<dyn Fn(&Value) -> EngineResult<Box<dyn PromptEngine>> + Send + Sync>;

/// Selects a prompt engine implementation by the record's `type` field
#[derive(Clone, Default)]
pub struct PromptEngineFactory {
    constructors: HashMap<String, EngineConstructor>,
}

impl PromptEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with every engine shipped by this crate
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.register(InterpolationPromptEngine::KIND, |config| {
            Ok(Box::new(InterpolationPromptEngine::from_config(config)?))
        });
        factory
    }

    /// Register (or replace) the constructor for `kind`
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(&Value) -> EngineResult<Box<dyn PromptEngine>> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Arc::new(constructor));
    }

    pub fn has(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn create(&self, config: &Value) -> EngineResult<Box<dyn PromptEngine>> {
        let kind = config
            .get("type")
            .ok_or_else(|| {
                PromptError::Configuration(
                    "prompt engine configuration must include a 'type'".to_string(),
                )
            })?
            .as_str()
            .ok_or_else(|| {
                PromptError::Configuration("prompt engine 'type' must be a string".to_string())
            })?;

        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| PromptError::UnknownEngineType {
                kind: kind.to_string(),
            })?;

        tracing::debug!(kind, "creating prompt engine");
        constructor(config)
    }
}
