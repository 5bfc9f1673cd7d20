//! Registry target: the backend is chosen at runtime by a registry service.
//!
//! `initialize` POSTs `{"context": ...}` to the registry URL and expects a
//! 2xx response of the form `{"config": {"target": <target record>}}`. The
//! embedded record is built with the same [`TargetFactory`] that built this
//! target, initialized, and from then on every operation is forwarded to it
//! unchanged.

use async_trait::async_trait;
use mcpkit_prompts::PromptError;
use mcpkit_types::{Content, Prompt, PromptResult, Tool};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::factory::parse_config;
use crate::{BoxedTarget, Target, TargetError, TargetFactory, TargetResult};

#[derive(Debug, Deserialize)]
struct RegistryTargetConfig {
    name: String,
    registry_url: String,
    context: Map<String, Value>,
}

pub struct RegistryTarget {
    name: String,
    registry_url: String,
    context: Map<String, Value>,
    factory: Arc<TargetFactory>,
    session: Option<reqwest::Client>,
    target: Option<BoxedTarget>,
}

impl RegistryTarget {
    pub const KIND: &'static str = "registry";

    pub fn new(
        name: impl Into<String>,
        registry_url: impl Into<String>,
        context: Map<String, Value>,
        factory: Arc<TargetFactory>,
    ) -> Self {
        Self {
            name: name.into(),
            registry_url: registry_url.into(),
            context,
            factory,
            session: None,
            target: None,
        }
    }

    /// Build from `{"type": "registry", "name", "registry_url", "context"}`
    pub fn from_config(config: &Value, factory: &Arc<TargetFactory>) -> TargetResult<Self> {
        let config: RegistryTargetConfig = parse_config(Self::KIND, config)?;
        Ok(Self::new(
            config.name,
            config.registry_url,
            config.context,
            Arc::clone(factory),
        ))
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn is_initialized(&self) -> bool {
        self.target.is_some()
    }

    /// The target the registry resolved to, once initialized
    pub fn resolved(&self) -> Option<&dyn Target> {
        self.target.as_deref()
    }

    fn child(&self) -> TargetResult<&dyn Target> {
        self.resolved()
            .ok_or_else(|| TargetError::not_initialized(&self.name))
    }

    async fn connect(&self, session: &reqwest::Client) -> TargetResult<BoxedTarget> {
        let target_config = self.resolve(session).await?;

        let mut child = self.factory.create(&target_config).map_err(|err| match err {
            TargetError::Configuration(_)
            | TargetError::UnknownTargetType { .. }
            | TargetError::Prompt(PromptError::Configuration(_))
            | TargetError::Prompt(PromptError::UnknownEngineType { .. }) => {
                self.invalid_response(format!("resolved target is unusable: {err}"))
            }
            other => other,
        })?;

        if let Err(err) = child.initialize().await {
            if let Err(close_err) = child.close().await {
                tracing::warn!(
                    target_name = %self.name,
                    child = %child.name(),
                    error = %close_err,
                    "failed to close resolved target after failed initialization"
                );
            }
            return Err(err);
        }

        Ok(child)
    }

    async fn resolve(&self, session: &reqwest::Client) -> TargetResult<Value> {
        tracing::debug!(target_name = %self.name, url = %self.registry_url, "resolving target");

        let response = session
            .post(&self.registry_url)
            .json(&json!({ "context": self.context }))
            .send()
            .await
            .map_err(|e| self.unreachable(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.unreachable(
                Some(status.as_u16()),
                format!("registry responded with status {status}"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.unreachable(Some(status.as_u16()), e.to_string()))?;
        let body: Value = serde_json::from_slice(&body)
            .map_err(|e| self.invalid_response(format!("body is not valid JSON: {e}")))?;

        body.get("config")
            .and_then(|config| config.get("target"))
            .cloned()
            .ok_or_else(|| self.invalid_response("response is missing 'config.target'".to_string()))
    }

    fn unreachable(&self, status: Option<u16>, message: String) -> TargetError {
        TargetError::RegistryUnreachable {
            target: self.name.clone(),
            url: self.registry_url.clone(),
            status,
            message,
        }
    }

    fn invalid_response(&self, message: String) -> TargetError {
        TargetError::RegistryResponseInvalid {
            target: self.name.clone(),
            message,
        }
    }
}

#[async_trait]
impl Target for RegistryTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    async fn initialize(&mut self) -> TargetResult<()> {
        if self.target.is_some() {
            tracing::debug!(target_name = %self.name, "registry target already initialized");
            return Ok(());
        }

        let session = self
            .session
            .get_or_insert_with(reqwest::Client::new)
            .clone();

        match self.connect(&session).await {
            Ok(child) => {
                tracing::info!(
                    target_name = %self.name,
                    resolved = %child.name(),
                    kind = child.kind(),
                    "registry resolved target"
                );
                self.target = Some(child);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(target_name = %self.name, error = %err, "registry resolution failed");
                self.session = None;
                Err(err)
            }
        }
    }

    async fn list_tools(&self) -> TargetResult<Vec<Tool>> {
        self.child()?.list_tools().await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> TargetResult<Vec<Content>> {
        self.child()?.call_tool(name, arguments).await
    }

    async fn list_prompts(&self) -> TargetResult<Vec<Prompt>> {
        self.child()?.list_prompts().await
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> TargetResult<PromptResult> {
        self.child()?.get_prompt(name, arguments).await
    }

    async fn close(&mut self) -> TargetResult<()> {
        let mut last_error = None;

        if let Some(mut target) = self.target.take() {
            if let Err(err) = target.close().await {
                tracing::warn!(target_name = %self.name, error = %err, "failed to close resolved target");
                last_error = Some(err);
            }
        }

        if self.session.take().is_some() {
            tracing::debug!(target_name = %self.name, "registry session closed");
        }

        match last_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
