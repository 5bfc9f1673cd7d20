//! mcpkit Targets - uniform providers of tools and prompts
//!
//! Every backend implements [`Target`]. [`TargetFactory`] picks the
//! implementation from a configuration record's `type` field:
//! - `registry`: asks a registry service which target to use, then delegates
//! - `mcp`: an MCP server spoken to over a child process's stdio
//! - `static`: tools and prompts declared inline, prompts rendered by a
//!   prompt engine

mod error;
mod factory;
pub mod mcp;
mod registry;
mod static_target;
mod target;

pub use error::{TargetError, TargetResult};
pub use factory::{TargetConstructor, TargetFactory, TargetFactoryBuilder};
pub use mcp::{McpClientError, McpServerConfig, McpTarget};
pub use registry::RegistryTarget;
pub use static_target::StaticTarget;
pub use target::{BoxedTarget, Target};
