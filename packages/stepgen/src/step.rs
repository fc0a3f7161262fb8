//! Step protocol types: what a driver sends in and what comes back out.

use serde::Serialize;

use crate::value::{Exception, Value};

/// A request sent into a generator instance by its driver.
#[derive(Debug, Clone, PartialEq)]
pub enum StepRequest {
    /// Supply the value of the pending suspension point and keep running.
    /// Ignored on the very first step.
    Resume(Value),
    /// Raise the error at the pending suspension point.
    Inject(Exception),
    /// Terminate early: pending cleanup runs, then the instance completes
    /// with the given value.
    ForceReturn(Value),
}

impl StepRequest {
    pub fn resume(value: impl Into<Value>) -> Self {
        StepRequest::Resume(value.into())
    }

    pub fn next() -> Self {
        StepRequest::Resume(Value::Undefined)
    }

    pub fn inject(exception: Exception) -> Self {
        StepRequest::Inject(exception)
    }

    pub fn force_return(value: impl Into<Value>) -> Self {
        StepRequest::ForceReturn(value.into())
    }

    /// The exception carried by an `Inject` request.
    pub fn injected(&self) -> Option<&Exception> {
        match self {
            StepRequest::Inject(exception) => Some(exception),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StepRequest::Resume(_) => "Resume",
            StepRequest::Inject(_) => "Inject",
            StepRequest::ForceReturn(_) => "ForceReturn",
        }
    }
}

/// Successful outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub value: Value,
    pub done: bool,
}

impl StepResult {
    pub fn yielded(value: impl Into<Value>) -> Self {
        StepResult {
            value: value.into(),
            done: false,
        }
    }

    pub fn complete(value: impl Into<Value>) -> Self {
        StepResult {
            value: value.into(),
            done: true,
        }
    }
}

/// Lifecycle state of a generator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeneratorState {
    NotStarted,
    Suspended,
    Running,
    Completed,
    Failed,
}

impl GeneratorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, GeneratorState::Completed | GeneratorState::Failed)
    }
}

/// What is being delivered into the frame on top of the delegation stack.
///
/// A step request turns into a mode, and every frame transition (child
/// completing, child failing, child cleaned up) produces the next mode for
/// the frame below it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Mode {
    Deliver(Value),
    Throw(Exception),
    Return(Value),
}

impl From<StepRequest> for Mode {
    fn from(request: StepRequest) -> Self {
        match request {
            StepRequest::Resume(value) => Mode::Deliver(value),
            StepRequest::Inject(exception) => Mode::Throw(exception),
            StepRequest::ForceReturn(value) => Mode::Return(value),
        }
    }
}
