//! Asynchronous generators: bodies that await between suspension points,
//! stepped through futures with at most one step in flight per instance.

pub mod body;
pub mod driver;
pub mod scheduler;

pub use body::{AsyncBodyFactory, AsyncBodyStep, AsyncGeneratorBody, AsyncGeneratorDefinition};
pub use driver::{step_with_timeout, AsyncDriver};
pub use scheduler::{create_async, step_async, AsyncGenerator, AsyncStepResult};
