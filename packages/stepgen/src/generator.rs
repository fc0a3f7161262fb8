//! Synchronous generator instances and their step state machine.

use crate::body::{BodyStep, GeneratorBody, GeneratorDefinition};
use crate::delegation::DelegationStack;
use crate::error::GeneratorError;
use crate::frame::Frame;
use crate::ids::GeneratorId;
use crate::lifecycle::{Completion, Lifecycle, Next};
use crate::step::{GeneratorState, Mode, StepRequest, StepResult};
use crate::value::{Exception, Value};

/// A runtime generator instance.
///
/// Owns its body exclusively, plus the bodies of every child it is currently
/// delegating to. Transitions only happen through [`Generator::step`].
#[derive(Debug)]
pub struct Generator {
    lifecycle: Lifecycle,
    frames: DelegationStack<Box<dyn GeneratorBody>>,
}

/// Instantiate a definition. The new instance is `NotStarted`.
pub fn create(definition: &GeneratorDefinition) -> Generator {
    definition.create()
}

/// Send one request into an instance.
pub fn step(generator: &mut Generator, request: StepRequest) -> Result<StepResult, GeneratorError> {
    generator.step(request)
}

impl Generator {
    pub fn from_body(name: impl Into<String>, body: impl GeneratorBody + 'static) -> Self {
        Self::from_boxed(name, Box::new(body))
    }

    pub fn from_boxed(name: impl Into<String>, body: Box<dyn GeneratorBody>) -> Self {
        let lifecycle = Lifecycle::new(name);
        let root = Frame::new(lifecycle.id(), lifecycle.name(), body);
        Generator {
            lifecycle,
            frames: DelegationStack::new(root),
        }
    }

    pub fn id(&self) -> GeneratorId {
        self.lifecycle.id()
    }

    pub fn name(&self) -> &str {
        self.lifecycle.name()
    }

    pub fn state(&self) -> GeneratorState {
        self.lifecycle.state()
    }

    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// Last value produced at a suspension point, `Undefined` before the
    /// first one.
    pub fn last_output(&self) -> &Value {
        self.lifecycle.last_output()
    }

    pub fn completion_value(&self) -> Option<&Value> {
        match self.lifecycle.completion() {
            Some(Completion::Returned(value)) => Some(value),
            _ => None,
        }
    }

    pub fn completion_error(&self) -> Option<&Exception> {
        match self.lifecycle.completion() {
            Some(Completion::Raised(exception)) => Some(exception),
            _ => None,
        }
    }

    /// Number of children currently delegated to, counting nested ones.
    pub fn delegation_depth(&self) -> usize {
        self.frames.delegation_depth()
    }

    /// Ids along the delegation chain, root first.
    pub fn delegation_ids(&self) -> Vec<GeneratorId> {
        self.frames.ids()
    }

    pub fn resume(&mut self, value: impl Into<Value>) -> Result<StepResult, GeneratorError> {
        self.step(StepRequest::Resume(value.into()))
    }

    pub fn inject(&mut self, exception: Exception) -> Result<StepResult, GeneratorError> {
        self.step(StepRequest::Inject(exception))
    }

    pub fn force_return(&mut self, value: impl Into<Value>) -> Result<StepResult, GeneratorError> {
        self.step(StepRequest::ForceReturn(value.into()))
    }

    pub fn step(&mut self, request: StepRequest) -> Result<StepResult, GeneratorError> {
        let injected = request.injected().cloned();
        match self.lifecycle.accept(&mut self.frames, request) {
            Next::Run(mode) => self.run(mode, injected.as_ref()),
            Next::Finish(result) => result,
        }
    }

    /// Drive the top frame until something reaches the caller: a suspension
    /// point, completion of the root body, or an error nobody handled.
    fn run(
        &mut self,
        mut mode: Mode,
        injected: Option<&Exception>,
    ) -> Result<StepResult, GeneratorError> {
        let mut cleanup_error: Option<Exception> = None;
        loop {
            let outcome = match mode {
                Mode::Return(value) => {
                    let Some(mut frame) = self.frames.pop() else {
                        return self.lifecycle.unwound(value, cleanup_error);
                    };
                    if frame.started {
                        if let Err(exception) = frame.body.close() {
                            log::warn!("{} cleanup raised {exception}", frame.id);
                            cleanup_error.get_or_insert(exception);
                        }
                    }
                    log::debug!("{} ({}) closed", frame.id, frame.name);
                    mode = Mode::Return(value);
                    continue;
                }
                Mode::Deliver(value) => match self.frames.top_mut() {
                    Some(frame) if frame.started => frame.body.resume(value),
                    Some(frame) => {
                        frame.started = true;
                        frame.body.resume(Value::Undefined)
                    }
                    None => return Ok(self.lifecycle.complete(value)),
                },
                Mode::Throw(exception) => match self.frames.top_mut() {
                    Some(frame) if frame.started => frame.body.throw(exception),
                    Some(frame) => {
                        frame.started = true;
                        BodyStep::Throw(exception)
                    }
                    None => return Err(self.lifecycle.fail(exception, injected)),
                },
            };

            let next = match outcome {
                BodyStep::Yield(value) => return Ok(self.lifecycle.suspend(value)),
                BodyStep::Delegate(child) => Next::Run(self.delegate(child)),
                BodyStep::Return(value) => self.lifecycle.frame_returned(&mut self.frames, value),
                BodyStep::Throw(exception) => {
                    self.lifecycle
                        .frame_raised(&mut self.frames, exception, injected)
                }
            };
            mode = match next {
                Next::Run(mode) => mode,
                Next::Finish(result) => return result,
            };
        }
    }

    /// Move a child's frames onto this instance's delegation stack and pick
    /// the mode that continues execution.
    fn delegate(&mut self, mut child: Generator) -> Mode {
        match child.state() {
            GeneratorState::NotStarted | GeneratorState::Suspended => {
                let frames = child.frames.take();
                let moved = self.frames.absorb(frames);
                log::debug!(
                    "{} delegates to {} ({moved} frame(s), depth {})",
                    self.id(),
                    child.id(),
                    self.frames.delegation_depth()
                );
                Mode::Deliver(Value::Undefined)
            }
            // A terminated child answers its first resume with done, so the
            // delegation expression evaluates to undefined right away.
            GeneratorState::Completed | GeneratorState::Failed => Mode::Deliver(Value::Undefined),
            GeneratorState::Running => Mode::Throw(Exception::runtime_error(format!(
                "{} is already running",
                child.id()
            ))),
        }
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        if matches!(self.state(), GeneratorState::Suspended | GeneratorState::Running)
            && !self.frames.is_empty()
        {
            log::warn!(
                "{} ({}) dropped while {:?}; pending cleanup skipped",
                self.id(),
                self.name(),
                self.state()
            );
        }
    }
}
