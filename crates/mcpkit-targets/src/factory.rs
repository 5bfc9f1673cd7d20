//! Discriminator-keyed target construction

use mcpkit_prompts::PromptEngineFactory;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{BoxedTarget, McpTarget, RegistryTarget, StaticTarget, TargetError, TargetResult};

/// Builds a target from its configuration record. The factory passes itself
/// in so variants that wrap other targets can construct them.
pub type TargetConstructor =
    Arc<dyn Fn(&Value, &Arc<TargetFactory>) -> TargetResult<BoxedTarget> + Send + Sync>;

/// Creates targets by the `type` field of their configuration record.
///
/// Shared behind an `Arc` so it can be handed to the targets it builds; the
/// registry target calls back into the same factory for the target it
/// resolves.
pub struct TargetFactory {
    constructors: HashMap<String, TargetConstructor>,
    prompt_engines: PromptEngineFactory,
}

impl TargetFactory {
    pub fn builder() -> TargetFactoryBuilder {
        TargetFactoryBuilder::default()
    }

    /// Factory knowing every target variant and prompt engine in mcpkit
    pub fn with_defaults() -> Arc<Self> {
        Self::builder().with_default_targets().build()
    }

    pub fn has(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Prompt engines available to targets that render prompts
    pub fn prompt_engines(&self) -> &PromptEngineFactory {
        &self.prompt_engines
    }

    pub fn create(self: &Arc<Self>, config: &Value) -> TargetResult<BoxedTarget> {
        if !config.is_object() {
            return Err(TargetError::Configuration(
                "target configuration must be a mapping".to_string(),
            ));
        }

        let kind = match config.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            Some(_) => {
                return Err(TargetError::Configuration(
                    "target 'type' must be a string".to_string(),
                ))
            }
            None => {
                return Err(TargetError::Configuration(
                    "target configuration must include a 'type'".to_string(),
                ))
            }
        };

        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| TargetError::UnknownTargetType {
                kind: kind.to_string(),
            })?;

        tracing::debug!(kind, name = ?config.get("name"), "creating target");
        constructor(config, self)
    }
}

#[derive(Default)]
pub struct TargetFactoryBuilder {
    constructors: HashMap<String, TargetConstructor>,
    prompt_engines: Option<PromptEngineFactory>,
}

impl TargetFactoryBuilder {
    /// Register the `registry`, `mcp` and `static` variants
    pub fn with_default_targets(self) -> Self {
        self.register(RegistryTarget::KIND, |config, factory| {
            Ok(Box::new(RegistryTarget::from_config(config, factory)?))
        })
        .register(McpTarget::KIND, |config, _| {
            Ok(Box::new(McpTarget::from_config(config)?))
        })
        .register(StaticTarget::KIND, |config, factory| {
            Ok(Box::new(StaticTarget::from_config(
                config,
                factory.prompt_engines(),
            )?))
        })
    }

    /// Register (or replace) the constructor for `kind`
    pub fn register<F>(mut self, kind: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&Value, &Arc<TargetFactory>) -> TargetResult<BoxedTarget> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Arc::new(constructor));
        self
    }

    /// Use `engines` instead of [`PromptEngineFactory::with_defaults`]
    pub fn prompt_engines(mut self, engines: PromptEngineFactory) -> Self {
        self.prompt_engines = Some(engines);
        self
    }

    pub fn build(self) -> Arc<TargetFactory> {
        Arc::new(TargetFactory {
            constructors: self.constructors,
            prompt_engines: self
                .prompt_engines
                .unwrap_or_else(PromptEngineFactory::with_defaults),
        })
    }
}

/// Convert an untyped record into a variant's typed configuration
pub(crate) fn parse_config<T: DeserializeOwned>(kind: &str, config: &Value) -> TargetResult<T> {
    serde_json::from_value(config.clone()).map_err(|e| {
        let name = config.get("name").and_then(Value::as_str);
        match name {
            Some(name) => {
                TargetError::Configuration(format!("invalid {kind} target '{name}': {e}"))
            }
            None => TargetError::Configuration(format!("invalid {kind} target: {e}")),
        }
    })
}
