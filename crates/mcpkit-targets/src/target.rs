//! The target contract

use async_trait::async_trait;
use mcpkit_types::{Content, Prompt, PromptResult, Tool};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::TargetResult;

/// A provider of callable tools and retrievable prompts.
///
/// `initialize` must succeed before any of the four operations; until then
/// they fail with [`TargetError::NotInitialized`](crate::TargetError). The
/// lifecycle methods take `&mut self`, so a caller cannot race them against
/// each other or against the operations, while the operations themselves take
/// `&self` and may run concurrently.
#[async_trait]
pub trait Target: Send + Sync {
    /// Name given in configuration; fixed for the life of the target
    fn name(&self) -> &str;

    /// Discriminator this target was built from
    fn kind(&self) -> &'static str;

    async fn initialize(&mut self) -> TargetResult<()>;

    async fn list_tools(&self) -> TargetResult<Vec<Tool>>;

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> TargetResult<Vec<Content>>;

    async fn list_prompts(&self) -> TargetResult<Vec<Prompt>>;

    async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> TargetResult<PromptResult>;

    /// Release everything `initialize` acquired. Safe to call repeatedly and
    /// from any state.
    async fn close(&mut self) -> TargetResult<()>;
}

/// A boxed target for dynamic dispatch
pub type BoxedTarget = Box<dyn Target>;
