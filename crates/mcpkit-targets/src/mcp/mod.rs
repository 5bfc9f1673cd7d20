//! MCP target: a Model Context Protocol server run as a child process and
//! spoken to with JSON-RPC over its stdio.

mod config;
mod connection;
mod framing;

pub use config::McpServerConfig;
pub use connection::McpClientError;

use async_trait::async_trait;
use mcpkit_types::{Content, Prompt, PromptResult, Tool};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::factory::parse_config;
use crate::{Target, TargetError, TargetResult};
use connection::McpConnection;

pub struct McpTarget {
    config: McpServerConfig,
    connection: Option<McpConnection>,
}

impl McpTarget {
    pub const KIND: &'static str = "mcp";

    pub fn new(config: McpServerConfig) -> TargetResult<Self> {
        Ok(Self {
            config: config.normalized()?,
            connection: None,
        })
    }

    pub fn from_config(config: &Value) -> TargetResult<Self> {
        Self::new(parse_config(Self::KIND, config)?)
    }

    pub fn config(&self) -> &McpServerConfig {
        &self.config
    }

    fn connection(&self) -> TargetResult<&McpConnection> {
        self.connection
            .as_ref()
            .ok_or_else(|| TargetError::not_initialized(&self.config.name))
    }

    async fn list<T: DeserializeOwned>(&self, method: &str, key: &str) -> TargetResult<Vec<T>> {
        let connection = self.connection()?;
        let items = connection
            .list_all(method, key, self.config.timeout())
            .await?;
        decode(Value::Array(items), method)
    }
}

#[async_trait]
impl Target for McpTarget {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    async fn initialize(&mut self) -> TargetResult<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let connection = McpConnection::spawn(&self.config).await?;
        if let Err(err) = connection.handshake(self.config.timeout()).await {
            connection.shutdown().await;
            return Err(err.into());
        }

        tracing::info!(server = %self.config.name, "MCP server initialized");
        self.connection = Some(connection);
        Ok(())
    }

    async fn list_tools(&self) -> TargetResult<Vec<Tool>> {
        self.list("tools/list", "tools").await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> TargetResult<Vec<Content>> {
        let connection = self.connection()?;
        let result = connection
            .request(
                "tools/call",
                json!({"name": name, "arguments": arguments.unwrap_or_default()}),
                self.config.timeout(),
            )
            .await?;

        let content: Vec<Content> = match result.get("content") {
            Some(content) => decode(content.clone(), "tools/call")?,
            None => Vec::new(),
        };

        if result.get("isError").and_then(Value::as_bool).unwrap_or(false) {
            let message = content
                .iter()
                .filter_map(Content::as_text)
                .collect::<Vec<_>>()
                .join("\n");
            return Err(TargetError::ToolFailed {
                target: self.config.name.clone(),
                tool: name.to_string(),
                message,
            });
        }

        Ok(content)
    }

    async fn list_prompts(&self) -> TargetResult<Vec<Prompt>> {
        self.list("prompts/list", "prompts").await
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> TargetResult<PromptResult> {
        let connection = self.connection()?;
        let result = connection
            .request(
                "prompts/get",
                json!({"name": name, "arguments": arguments.unwrap_or_default()}),
                self.config.timeout(),
            )
            .await?;
        decode(result, "prompts/get")
    }

    async fn close(&mut self) -> TargetResult<()> {
        if let Some(connection) = self.connection.take() {
            connection.shutdown().await;
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(value: Value, method: &str) -> TargetResult<T> {
    serde_json::from_value(value)
        .map_err(|e| McpClientError::Parse(format!("{method} result: {e}")).into())
}
