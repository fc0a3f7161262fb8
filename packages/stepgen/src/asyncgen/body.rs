//! Asynchronous generator bodies and definitions.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::asyncgen::scheduler::AsyncGenerator;
use crate::error::GeneratorError;
use crate::generator::Generator;
use crate::step::StepResult;
use crate::value::{Exception, Value};

/// What an asynchronous body did when it was advanced.
#[derive(Debug)]
pub enum AsyncBodyStep {
    Yield(Value),
    /// Delegate to a child; its completion value comes back through
    /// [`AsyncGeneratorBody::resume`].
    Delegate(AsyncGenerator),
    Return(Value),
    Throw(Exception),
}

/// A body that may await external operations between suspension points.
///
/// Awaiting inside `resume` is invisible to the driver: the step future just
/// resolves later, once the body reaches its next suspension point or ends.
#[async_trait]
pub trait AsyncGeneratorBody: fmt::Debug + Send {
    async fn resume(&mut self, value: Value) -> AsyncBodyStep;

    async fn throw(&mut self, exception: Exception) -> AsyncBodyStep {
        AsyncBodyStep::Throw(exception)
    }

    async fn close(&mut self) -> Result<(), Exception> {
        Ok(())
    }
}

pub type AsyncBodyFactory = Arc<dyn Fn() -> Box<dyn AsyncGeneratorBody> + Send + Sync>;

#[derive(Clone)]
pub struct AsyncGeneratorDefinition {
    name: String,
    factory: AsyncBodyFactory,
}

impl fmt::Debug for AsyncGeneratorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncGeneratorDefinition")
            .field("name", &self.name)
            .finish()
    }
}

impl AsyncGeneratorDefinition {
    pub fn new<B, F>(name: impl Into<String>, factory: F) -> Self
    where
        B: AsyncGeneratorBody + 'static,
        F: Fn() -> B + Send + Sync + 'static,
    {
        AsyncGeneratorDefinition {
            name: name.into(),
            factory: Arc::new(move || Box::new(factory()) as Box<dyn AsyncGeneratorBody>),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create(&self) -> AsyncGenerator {
        AsyncGenerator::from_boxed(self.name.clone(), (self.factory)())
    }
}

/// Runs a synchronous generator as one frame of an asynchronous chain.
///
/// The wrapped instance keeps its own lifecycle: requests are translated
/// one-to-one into its step protocol.
#[derive(Debug)]
pub(crate) struct SyncFrame {
    generator: Generator,
}

impl SyncFrame {
    pub(crate) fn new(generator: Generator) -> Self {
        SyncFrame { generator }
    }

    fn translate(result: Result<StepResult, GeneratorError>) -> AsyncBodyStep {
        match result {
            Ok(result) if result.done => AsyncBodyStep::Return(result.value),
            Ok(result) => AsyncBodyStep::Yield(result.value),
            Err(err) => AsyncBodyStep::Throw(err.into_exception()),
        }
    }
}

#[async_trait]
impl AsyncGeneratorBody for SyncFrame {
    async fn resume(&mut self, value: Value) -> AsyncBodyStep {
        Self::translate(self.generator.resume(value))
    }

    async fn throw(&mut self, exception: Exception) -> AsyncBodyStep {
        Self::translate(self.generator.inject(exception))
    }

    async fn close(&mut self) -> Result<(), Exception> {
        self.generator
            .force_return(Value::Undefined)
            .map(|_| ())
            .map_err(GeneratorError::into_exception)
    }
}
