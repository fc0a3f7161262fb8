//! Per-instance lifecycle bookkeeping shared by sync and async generators.

use crate::delegation::DelegationStack;
use crate::error::GeneratorError;
use crate::ids::GeneratorId;
use crate::step::{GeneratorState, Mode, StepRequest, StepResult};
use crate::value::{Exception, Value};

/// How a terminated instance ended. Set exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Returned(Value),
    Raised(Exception),
}

/// What a run loop does after a request was accepted or a frame settled.
#[derive(Debug)]
pub(crate) enum Next {
    /// Deliver this mode into the frame now on top.
    Run(Mode),
    /// The step is over; hand this to the caller.
    Finish(Result<StepResult, GeneratorError>),
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    id: GeneratorId,
    name: String,
    state: GeneratorState,
    last_output: Value,
    completion: Option<Completion>,
}

impl Lifecycle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Lifecycle {
            id: GeneratorId::fresh(),
            name: name.into(),
            state: GeneratorState::NotStarted,
            last_output: Value::Undefined,
            completion: None,
        }
    }

    pub(crate) fn id(&self) -> GeneratorId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn state(&self) -> GeneratorState {
        self.state
    }

    pub(crate) fn last_output(&self) -> &Value {
        &self.last_output
    }

    pub(crate) fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    /// The fixed answer every request gets once the instance has terminated.
    ///
    /// `ForceReturn` echoes the value passed on this call rather than any
    /// earlier completion value; `Inject` never re-raises.
    pub(crate) fn terminal_response(&self, request: &StepRequest) -> Option<StepResult> {
        if !self.state.is_terminal() {
            return None;
        }
        let result = match request {
            StepRequest::Resume(_) | StepRequest::Inject(_) => {
                StepResult::complete(Value::Undefined)
            }
            StepRequest::ForceReturn(value) => StepResult::complete(value.clone()),
        };
        log::trace!(
            "{} ({}) is {:?}; {} is a no-op",
            self.id,
            self.name,
            self.state,
            request.kind()
        );
        Some(result)
    }

    /// Decide whether `request` needs body code at all.
    ///
    /// Terminal instances answer idempotently. A `NotStarted` instance takes
    /// `Inject` and `ForceReturn` without running anything, and an instance
    /// left `Running` by an abandoned step only takes `ForceReturn`.
    /// Otherwise the instance enters `Running` and the request becomes the
    /// starting mode.
    pub(crate) fn accept<B>(
        &mut self,
        frames: &mut DelegationStack<B>,
        request: StepRequest,
    ) -> Next {
        log::trace!("{} <- {}", self.id, request.kind());
        if let Some(result) = self.terminal_response(&request) {
            return Next::Finish(Ok(result));
        }

        match (self.state, &request) {
            (GeneratorState::NotStarted, StepRequest::Inject(exception)) => {
                frames.take();
                return Next::Finish(Err(self.fail(exception.clone(), Some(exception))));
            }
            (GeneratorState::NotStarted, StepRequest::ForceReturn(value)) => {
                frames.take();
                return Next::Finish(Ok(self.complete(value.clone())));
            }
            (GeneratorState::Running, StepRequest::Resume(_) | StepRequest::Inject(_)) => {
                return Next::Finish(Err(GeneratorError::interrupted(self.id)));
            }
            _ => {}
        }

        self.begin();
        Next::Run(Mode::from(request))
    }

    /// The top frame returned `value`: pop it and deliver the value to its
    /// parent, or complete when it was the root.
    pub(crate) fn frame_returned<B>(&mut self, frames: &mut DelegationStack<B>, value: Value) -> Next {
        let finished = frames.pop();
        if frames.is_empty() {
            return Next::Finish(Ok(self.complete(value)));
        }
        if let Some(child) = finished {
            log::debug!("{} returned {value} to its parent", child.id);
        }
        Next::Run(Mode::Deliver(value))
    }

    /// The top frame raised `exception`: pop it and throw into its parent,
    /// or fail when it was the root.
    pub(crate) fn frame_raised<B>(
        &mut self,
        frames: &mut DelegationStack<B>,
        exception: Exception,
        injected: Option<&Exception>,
    ) -> Next {
        let failed = frames.pop();
        if frames.is_empty() {
            return Next::Finish(Err(self.fail(exception, injected)));
        }
        if let Some(child) = failed {
            log::debug!("{} raised {exception} into its parent", child.id);
        }
        Next::Run(Mode::Throw(exception))
    }

    /// Every frame has been closed by a forced return.
    pub(crate) fn unwound(
        &mut self,
        value: Value,
        cleanup_error: Option<Exception>,
    ) -> Result<StepResult, GeneratorError> {
        match cleanup_error {
            Some(exception) => Err(self.fail(exception, None)),
            None => Ok(self.complete(value)),
        }
    }

    pub(crate) fn begin(&mut self) {
        self.transition(GeneratorState::Running);
    }

    pub(crate) fn suspend(&mut self, value: Value) -> StepResult {
        log::trace!("{} -> yield {value}", self.id);
        self.transition(GeneratorState::Suspended);
        self.last_output = value.clone();
        StepResult::yielded(value)
    }

    pub(crate) fn complete(&mut self, value: Value) -> StepResult {
        self.transition(GeneratorState::Completed);
        self.completion = Some(Completion::Returned(value.clone()));
        StepResult::complete(value)
    }

    /// Enter `Failed` and build the error surfaced to the step caller.
    ///
    /// The error counts as injected when it is the very exception the driver
    /// injected on this step and nothing along the chain replaced it.
    pub(crate) fn fail(
        &mut self,
        exception: Exception,
        injected: Option<&Exception>,
    ) -> GeneratorError {
        self.transition(GeneratorState::Failed);
        self.completion = Some(Completion::Raised(exception.clone()));
        if injected == Some(&exception) {
            GeneratorError::injected(self.id, exception)
        } else {
            GeneratorError::body_raised(self.id, exception)
        }
    }

    fn transition(&mut self, next: GeneratorState) {
        if self.state != next {
            log::debug!("{} ({}): {:?} -> {:?}", self.id, self.name, self.state, next);
        }
        self.state = next;
    }
}
