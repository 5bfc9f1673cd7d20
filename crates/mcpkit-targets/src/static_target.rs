//! Static target: tools and prompts declared inline in configuration.
//!
//! ```yaml
//! type: static
//! name: helpdesk
//! tools:
//!   - name: lookup_ticket
//!     description: Fetch a ticket by id
//! responses:
//!   lookup_ticket: "Ticket is open"
//! prompts:
//!   - name: welcome
//!     arguments: [{ name: customer_name, required: true }]
//! prompt_engine:
//!   type: interpolation
//!   prompts:
//!     welcome: "Hello {customer_name}!"
//! ```

use async_trait::async_trait;
use mcpkit_prompts::{PromptEngine, PromptEngineFactory};
use mcpkit_types::{Content, Prompt, PromptResult, Tool};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::factory::parse_config;
use crate::{Target, TargetError, TargetResult};

#[derive(Debug, Deserialize)]
struct StaticTargetConfig {
    name: String,
    #[serde(default)]
    tools: Vec<Tool>,
    #[serde(default)]
    responses: HashMap<String, String>,
    #[serde(default)]
    prompts: Vec<Prompt>,
    #[serde(default)]
    prompt_engine: Option<Value>,
}

pub struct StaticTarget {
    name: String,
    tools: Vec<Tool>,
    responses: HashMap<String, String>,
    prompts: Vec<Prompt>,
    prompt_engine: Option<Box<dyn PromptEngine>>,
    initialized: bool,
}

impl StaticTarget {
    pub const KIND: &'static str = "static";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
            responses: HashMap::new(),
            prompts: Vec::new(),
            prompt_engine: None,
            initialized: false,
        }
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Text returned by every call of `tool`
    pub fn with_response(mut self, tool: impl Into<String>, text: impl Into<String>) -> Self {
        self.responses.insert(tool.into(), text.into());
        self
    }

    pub fn with_prompts(mut self, prompts: Vec<Prompt>, engine: Box<dyn PromptEngine>) -> Self {
        self.prompts = prompts;
        self.prompt_engine = Some(engine);
        self
    }

    pub fn from_config(config: &Value, engines: &PromptEngineFactory) -> TargetResult<Self> {
        let config: StaticTargetConfig = parse_config(Self::KIND, config)?;

        if let Some(tool) = config
            .responses
            .keys()
            .find(|tool| !config.tools.iter().any(|t| &t.name == *tool))
        {
            return Err(TargetError::Configuration(format!(
                "static target '{}' has a response for undeclared tool '{}'",
                config.name, tool
            )));
        }

        let prompt_engine = match config.prompt_engine {
            Some(engine) => Some(engines.create(&engine)?),
            None if !config.prompts.is_empty() => {
                return Err(TargetError::Configuration(format!(
                    "static target '{}' declares prompts but no 'prompt_engine'",
                    config.name
                )))
            }
            None => None,
        };

        Ok(Self {
            name: config.name,
            tools: config.tools,
            responses: config.responses,
            prompts: config.prompts,
            prompt_engine,
            initialized: false,
        })
    }

    fn ensure_initialized(&self) -> TargetResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(TargetError::not_initialized(&self.name))
        }
    }
}

#[async_trait]
impl Target for StaticTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    async fn initialize(&mut self) -> TargetResult<()> {
        self.initialized = true;
        Ok(())
    }

    async fn list_tools(&self) -> TargetResult<Vec<Tool>> {
        self.ensure_initialized()?;
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        _arguments: Option<Map<String, Value>>,
    ) -> TargetResult<Vec<Content>> {
        self.ensure_initialized()?;

        if !self.tools.iter().any(|tool| tool.name == name) {
            return Err(TargetError::ToolNotFound {
                target: self.name.clone(),
                tool: name.to_string(),
            });
        }

        Ok(self
            .responses
            .get(name)
            .map(|text| vec![Content::text(text.as_str())])
            .unwrap_or_default())
    }

    async fn list_prompts(&self) -> TargetResult<Vec<Prompt>> {
        self.ensure_initialized()?;
        Ok(self.prompts.clone())
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> TargetResult<PromptResult> {
        self.ensure_initialized()?;

        let not_found = || TargetError::PromptNotFound {
            target: self.name.clone(),
            prompt: name.to_string(),
        };
        let prompt = self
            .prompts
            .iter()
            .find(|prompt| prompt.name == name)
            .ok_or_else(not_found)?;
        let engine = self.prompt_engine.as_ref().ok_or_else(not_found)?;

        Ok(engine.generate(&self.name, prompt, arguments.as_ref())?)
    }

    async fn close(&mut self) -> TargetResult<()> {
        self.initialized = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpkit_prompts::{InterpolationPromptEngine, PromptError};
    use serde_json::json;

    fn helpdesk() -> StaticTarget {
        StaticTarget::from_config(
            &json!({
                "type": "static",
                "name": "helpdesk",
                "tools": [
                    {"name": "lookup_ticket", "description": "Fetch a ticket"},
                    {"name": "noop"}
                ],
                "responses": {"lookup_ticket": "Ticket is open"},
                "prompts": [{"name": "welcome"}],
                "prompt_engine": {
                    "type": "interpolation",
                    "prompts": {"welcome": "Hello {customer_name}!"}
                }
            }),
            &PromptEngineFactory::with_defaults(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn requires_initialize() {
        let target = helpdesk();
        assert!(matches!(
            target.list_tools().await,
            Err(TargetError::NotInitialized { .. })
        ));
        assert!(matches!(
            target.get_prompt("welcome", None).await,
            Err(TargetError::NotInitialized { .. })
        ));
    }

    #[tokio::test]
    async fn serves_declared_tools() {
        let mut target = helpdesk();
        target.initialize().await.unwrap();

        let tools = target.list_tools().await.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "lookup_ticket");

        let content = target.call_tool("lookup_ticket", None).await.unwrap();
        assert_eq!(content, vec![Content::text("Ticket is open")]);
        assert!(target.call_tool("noop", None).await.unwrap().is_empty());

        let err = target.call_tool("delete_ticket", None).await.unwrap_err();
        assert!(matches!(err, TargetError::ToolNotFound { ref tool, .. } if tool == "delete_ticket"));
    }

    #[tokio::test]
    async fn renders_prompts_through_engine() {
        let mut target = helpdesk();
        target.initialize().await.unwrap();

        let args = HashMap::from([("customer_name".to_string(), "Alice".to_string())]);
        let result = target.get_prompt("welcome", Some(args)).await.unwrap();
        assert_eq!(result.messages[0].content.as_text(), Some("Hello Alice!"));
        assert_eq!(
            result.description.as_deref(),
            Some("Interpolated response for prompt 'welcome' from helpdesk")
        );

        let err = target.get_prompt("welcome", None).await.unwrap_err();
        assert!(matches!(
            err,
            TargetError::Prompt(PromptError::MissingArgument { .. })
        ));

        let err = target.get_prompt("farewell", None).await.unwrap_err();
        assert!(matches!(err, TargetError::PromptNotFound { .. }));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut target = StaticTarget::new("t")
            .with_tool(Tool::new("echo", "Echo"))
            .with_prompts(
                vec![Prompt::new("p")],
                Box::new(InterpolationPromptEngine::new([("p", "x")])),
            );
        target.initialize().await.unwrap();
        target.close().await.unwrap();
        target.close().await.unwrap();
        assert!(matches!(
            target.list_tools().await,
            Err(TargetError::NotInitialized { .. })
        ));
    }

    #[test]
    fn prompts_need_an_engine() {
        let err = StaticTarget::from_config(
            &json!({"type": "static", "name": "t", "prompts": [{"name": "p"}]}),
            &PromptEngineFactory::with_defaults(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, TargetError::Configuration(_)), "{err}");
    }

    #[test]
    fn responses_must_match_declared_tools() {
        let err = StaticTarget::from_config(
            &json!({"type": "static", "name": "t", "responses": {"ghost": "boo"}}),
            &PromptEngineFactory::with_defaults(),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("ghost"), "{err}");
    }

    #[test]
    fn engine_configuration_errors_surface() {
        let err = StaticTarget::from_config(
            &json!({
                "type": "static",
                "name": "t",
                "prompt_engine": {"type": "interpolation"}
            }),
            &PromptEngineFactory::with_defaults(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, TargetError::Prompt(PromptError::Configuration(_))));
    }
}
