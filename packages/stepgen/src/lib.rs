//! stepgen: a suspendable generator engine.
//!
//! # Architecture
//!
//! - **Explicit bodies**: a generator body is a state machine that advances
//!   to its next suspension point per call, no native stack switching
//! - **Two-way step protocol**: `Resume(value)`, `Inject(error)`,
//!   `ForceReturn(value)`, each answered with `{value, done}` or an error
//! - **Flat delegation stack**: delegating moves the child's frames onto the
//!   parent's stack; only the top frame runs, cleanup unwinds top-down
//! - **Async stepping**: bodies may await between suspension points; each
//!   instance has at most one step future in flight

pub mod asyncgen;
pub mod body;
pub mod config;
pub mod delegation;
pub mod driver;
pub mod error;
pub mod frame;
pub mod generator;
pub mod ids;
mod lifecycle;
pub mod paginated;
pub mod programs;
pub mod step;
pub mod value;

pub use asyncgen::{
    create_async, step_async, step_with_timeout, AsyncBodyStep, AsyncDriver, AsyncGenerator,
    AsyncGeneratorBody, AsyncGeneratorDefinition, AsyncStepResult,
};
pub use body::{BodyStep, GeneratorBody, GeneratorDefinition};
pub use config::Config;
pub use delegation::DelegationStack;
pub use driver::Driver;
pub use error::GeneratorError;
pub use frame::Frame;
pub use generator::{create, step, Generator};
pub use ids::GeneratorId;
pub use lifecycle::Completion;
pub use paginated::{InMemoryPages, Page, PageSource, Paginated};
pub use programs::{Accumulator, Chain, Counter, Sequence};
pub use step::{GeneratorState, StepRequest, StepResult};
pub use value::{Exception, Value};
