mod engine;
mod error;
mod interpolation;

pub use engine::{EngineConstructor, PromptEngine, PromptEngineFactory};
pub use error::{EngineResult, PromptError};
pub use interpolation::{InterpolationPromptEngine, PromptTemplate};
