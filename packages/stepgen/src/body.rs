//! Generator bodies and definitions.
//!
//! A body is a computation compiled into an explicit state machine: it keeps
//! its resumption point and locals in its own fields and advances one
//! segment per call, up to the next suspension point.

use std::fmt;
use std::sync::Arc;

use crate::generator::Generator;
use crate::value::{Exception, Value};

/// What a body did when it was advanced.
#[derive(Debug)]
pub enum BodyStep {
    /// Reached a suspension point producing this value.
    Yield(Value),
    /// Reached a delegation expression over this child. The child runs in
    /// place of the body until it terminates; its completion value is later
    /// delivered back through [`GeneratorBody::resume`].
    Delegate(Generator),
    /// Finished normally with this completion value.
    Return(Value),
    /// Raised an error it did not handle itself.
    Throw(Exception),
}

/// The interface every synchronous generator body implements.
pub trait GeneratorBody: fmt::Debug + Send {
    /// Continue from the current suspension point with `value` as the result
    /// of that point. The first call starts the body and receives
    /// [`Value::Undefined`].
    fn resume(&mut self, value: Value) -> BodyStep;

    /// Raise `exception` at the current suspension point. Bodies with a
    /// handler around that point recover and keep going; the default has
    /// none.
    fn throw(&mut self, exception: Exception) -> BodyStep {
        BodyStep::Throw(exception)
    }

    /// Run the cleanup pending at the current suspension point. Called on
    /// forced return, only for bodies that have started. No suspension point
    /// may run after this.
    fn close(&mut self) -> Result<(), Exception> {
        Ok(())
    }
}

pub type BodyFactory = Arc<dyn Fn() -> Box<dyn GeneratorBody> + Send + Sync>;

/// Immutable description of a generator: a named body factory. Every
/// [`GeneratorDefinition::create`] builds an independent instance.
#[derive(Clone)]
pub struct GeneratorDefinition {
    name: String,
    factory: BodyFactory,
}

impl fmt::Debug for GeneratorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorDefinition")
            .field("name", &self.name)
            .finish()
    }
}

impl GeneratorDefinition {
    pub fn new<B, F>(name: impl Into<String>, factory: F) -> Self
    where
        B: GeneratorBody + 'static,
        F: Fn() -> B + Send + Sync + 'static,
    {
        GeneratorDefinition {
            name: name.into(),
            factory: Arc::new(move || Box::new(factory()) as Box<dyn GeneratorBody>),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create(&self) -> Generator {
        Generator::from_boxed(self.name.clone(), (self.factory)())
    }
}
