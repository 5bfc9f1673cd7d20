//! mcpkit Types - protocol values passed between targets and their callers
//!
//! Targets hand these values through untouched. The only field the core ever
//! reads is `Prompt::name`; everything else, including fields this crate does
//! not model, survives a deserialize/serialize cycle.

mod content;
mod prompts;
mod tools;

pub use content::*;
pub use prompts::*;
pub use tools::*;
