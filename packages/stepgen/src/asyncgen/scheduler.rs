//! Asynchronous stepping: one in-flight step per instance, futures resolve in
//! issue order.
//!
//! Every step takes the instance's lock at the moment it is issued, not when
//! its future is first polled. A second request made while the lock is held
//! is rejected with `ConcurrentStep` instead of being queued. The lock is an
//! owned guard moved into the step future and released when that future
//! resolves or is dropped.

use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};
use tokio::sync::Mutex;

use crate::asyncgen::body::{AsyncBodyStep, AsyncGeneratorBody, AsyncGeneratorDefinition, SyncFrame};
use crate::delegation::DelegationStack;
use crate::error::GeneratorError;
use crate::frame::Frame;
use crate::generator::Generator;
use crate::ids::GeneratorId;
use crate::lifecycle::{Completion, Lifecycle, Next};
use crate::step::{GeneratorState, Mode, StepRequest, StepResult};
use crate::value::{Exception, Value};

/// Future returned by every asynchronous step. Resolves exactly once.
pub type AsyncStepResult = BoxFuture<'static, Result<StepResult, GeneratorError>>;

#[derive(Debug)]
struct AsyncCore {
    lifecycle: Lifecycle,
    frames: DelegationStack<Box<dyn AsyncGeneratorBody>>,
}

/// Handle to an asynchronous generator instance.
///
/// Deliberately not `Clone`: whoever holds the handle is the only driver,
/// and delegating moves the handle into the parent.
#[derive(Debug)]
pub struct AsyncGenerator {
    id: GeneratorId,
    name: String,
    core: Arc<Mutex<AsyncCore>>,
}

/// Instantiate an asynchronous definition.
pub fn create_async(definition: &AsyncGeneratorDefinition) -> AsyncGenerator {
    definition.create()
}

/// Issue one request; the returned future resolves with its result.
pub fn step_async(generator: &AsyncGenerator, request: StepRequest) -> AsyncStepResult {
    generator.step(request)
}

impl AsyncGenerator {
    pub fn from_body(name: impl Into<String>, body: impl AsyncGeneratorBody + 'static) -> Self {
        Self::from_boxed(name, Box::new(body))
    }

    pub fn from_boxed(name: impl Into<String>, body: Box<dyn AsyncGeneratorBody>) -> Self {
        let lifecycle = Lifecycle::new(name);
        let root = Frame::new(lifecycle.id(), lifecycle.name(), body);
        Self::with_core(lifecycle, root)
    }

    /// Wrap a synchronous generator so it can be stepped, or delegated to,
    /// from asynchronous code.
    pub fn from_sync(generator: Generator) -> Self {
        let lifecycle = Lifecycle::new(generator.name());
        let body: Box<dyn AsyncGeneratorBody> = Box::new(SyncFrame::new(generator));
        let root = Frame::new(lifecycle.id(), lifecycle.name(), body).started();
        Self::with_core(lifecycle, root)
    }

    fn with_core(lifecycle: Lifecycle, root: Frame<Box<dyn AsyncGeneratorBody>>) -> Self {
        AsyncGenerator {
            id: lifecycle.id(),
            name: lifecycle.name().to_string(),
            core: Arc::new(Mutex::new(AsyncCore {
                lifecycle,
                frames: DelegationStack::new(root),
            })),
        }
    }

    pub fn id(&self) -> GeneratorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a step future is currently outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.core.try_lock().is_err()
    }

    /// Current state; `Running` while a step is in flight.
    pub fn state(&self) -> GeneratorState {
        match self.core.try_lock() {
            Ok(core) => core.lifecycle.state(),
            Err(_) => GeneratorState::Running,
        }
    }

    /// Last produced value, or `None` while a step is in flight.
    pub fn last_output(&self) -> Option<Value> {
        let core = self.core.try_lock().ok()?;
        Some(core.lifecycle.last_output().clone())
    }

    pub fn completion(&self) -> Option<Completion> {
        let core = self.core.try_lock().ok()?;
        core.lifecycle.completion().cloned()
    }

    pub fn delegation_depth(&self) -> Option<usize> {
        let core = self.core.try_lock().ok()?;
        Some(core.frames.delegation_depth())
    }

    pub fn step(&self, request: StepRequest) -> AsyncStepResult {
        match Arc::clone(&self.core).try_lock_owned() {
            Ok(mut core) => async move { core.step(request).await }.boxed(),
            Err(_) => {
                log::warn!(
                    "{} ({}): {} issued while a step is in flight",
                    self.id,
                    self.name,
                    request.kind()
                );
                future::ready(Err(GeneratorError::concurrent_step(self.id))).boxed()
            }
        }
    }

    pub fn resume(&self, value: impl Into<Value>) -> AsyncStepResult {
        self.step(StepRequest::Resume(value.into()))
    }

    pub fn inject(&self, exception: Exception) -> AsyncStepResult {
        self.step(StepRequest::Inject(exception))
    }

    pub fn force_return(&self, value: impl Into<Value>) -> AsyncStepResult {
        self.step(StepRequest::ForceReturn(value.into()))
    }
}

impl From<Generator> for AsyncGenerator {
    fn from(generator: Generator) -> Self {
        AsyncGenerator::from_sync(generator)
    }
}

impl AsyncCore {
    async fn step(&mut self, request: StepRequest) -> Result<StepResult, GeneratorError> {
        let injected = request.injected().cloned();
        match self.lifecycle.accept(&mut self.frames, request) {
            Next::Run(mode) => self.run(mode, injected.as_ref()).await,
            Next::Finish(result) => result,
        }
    }

    async fn run(
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
                        if let Err(exception) = frame.body.close().await {
                            log::warn!("{} cleanup raised {exception}", frame.id);
                            cleanup_error.get_or_insert(exception);
                        }
                    }
                    log::debug!("{} ({}) closed", frame.id, frame.name);
                    mode = Mode::Return(value);
                    continue;
                }
                Mode::Deliver(value) => match self.frames.top_mut() {
                    Some(frame) if frame.started => frame.body.resume(value).await,
                    Some(frame) => {
                        frame.started = true;
                        frame.body.resume(Value::Undefined).await
                    }
                    None => return Ok(self.lifecycle.complete(value)),
                },
                Mode::Throw(exception) => match self.frames.top_mut() {
                    Some(frame) if frame.started => frame.body.throw(exception).await,
                    Some(frame) => {
                        frame.started = true;
                        AsyncBodyStep::Throw(exception)
                    }
                    None => return Err(self.lifecycle.fail(exception, injected)),
                },
            };

            let next = match outcome {
                AsyncBodyStep::Yield(value) => return Ok(self.lifecycle.suspend(value)),
                AsyncBodyStep::Delegate(child) => Next::Run(self.delegate(child)),
                AsyncBodyStep::Return(value) => {
                    self.lifecycle.frame_returned(&mut self.frames, value)
                }
                AsyncBodyStep::Throw(exception) => {
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

    fn delegate(&mut self, child: AsyncGenerator) -> Mode {
        let Ok(mut child_core) = child.core.try_lock() else {
            return Mode::Throw(GeneratorError::concurrent_step(child.id).into_exception());
        };
        match child_core.lifecycle.state() {
            GeneratorState::NotStarted | GeneratorState::Suspended => {
                let frames = child_core.frames.take();
                let moved = self.frames.absorb(frames);
                log::debug!(
                    "{} delegates to {} ({moved} frame(s), depth {})",
                    self.lifecycle.id(),
                    child.id,
                    self.frames.delegation_depth()
                );
                Mode::Deliver(Value::Undefined)
            }
            GeneratorState::Completed | GeneratorState::Failed => Mode::Deliver(Value::Undefined),
            GeneratorState::Running => Mode::Throw(GeneratorError::interrupted(child.id).into_exception()),
        }
    }
}

impl Drop for AsyncCore {
    fn drop(&mut self) {
        let state = self.lifecycle.state();
        if matches!(state, GeneratorState::Suspended | GeneratorState::Running)
            && !self.frames.is_empty()
        {
            log::warn!(
                "{} ({}) dropped while {:?}; pending cleanup skipped",
                self.lifecycle.id(),
                self.lifecycle.name(),
                state
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct SlowCounter {
        next: i64,
    }

    #[async_trait]
    impl AsyncGeneratorBody for SlowCounter {
        async fn resume(&mut self, _value: Value) -> AsyncBodyStep {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.next += 1;
            if self.next > 2 {
                AsyncBodyStep::Return(Value::from("end"))
            } else {
                AsyncBodyStep::Yield(Value::Int(self.next))
            }
        }
    }

    #[tokio::test]
    async fn test_steps_resolve_in_order() {
        let gen = AsyncGenerator::from_body("slow", SlowCounter::default());
        assert_eq!(gen.resume(Value::Undefined).await.unwrap(), StepResult::yielded(1i64));
        assert_eq!(gen.resume(Value::Undefined).await.unwrap(), StepResult::yielded(2i64));
        assert_eq!(gen.resume(Value::Undefined).await.unwrap(), StepResult::complete("end"));
        assert_eq!(gen.state(), GeneratorState::Completed);
        assert_eq!(
            gen.completion(),
            Some(Completion::Returned(Value::from("end")))
        );
    }

    #[tokio::test]
    async fn test_second_step_while_in_flight_is_rejected() {
        let gen = AsyncGenerator::from_body("slow", SlowCounter::default());
        let first = gen.resume(Value::Undefined);
        assert!(gen.is_in_flight());
        assert_eq!(gen.state(), GeneratorState::Running);

        let second = gen.resume(Value::Undefined).await;
        assert_eq!(second, Err(GeneratorError::concurrent_step(gen.id())));

        assert_eq!(first.await.unwrap(), StepResult::yielded(1i64));
        assert!(!gen.is_in_flight());
        assert_eq!(gen.resume(Value::Undefined).await.unwrap(), StepResult::yielded(2i64));
    }

    #[tokio::test]
    async fn test_abandoned_step_only_accepts_force_return() {
        let gen = AsyncGenerator::from_body("slow", SlowCounter::default());
        drop(gen.resume(Value::Undefined));
        // Dropping an unpolled future releases the lock before the body ran.
        assert_eq!(gen.state(), GeneratorState::NotStarted);

        let pending = gen.resume(Value::Undefined);
        let timed = tokio::time::timeout(Duration::from_millis(1), pending).await;
        assert!(timed.is_err());
        assert_eq!(gen.state(), GeneratorState::Running);

        assert_eq!(
            gen.resume(Value::Undefined).await,
            Err(GeneratorError::interrupted(gen.id()))
        );
        assert_eq!(gen.force_return(0i64).await.unwrap(), StepResult::complete(0i64));
        assert_eq!(gen.state(), GeneratorState::Completed);
    }

    #[tokio::test]
    async fn test_from_sync_wraps_generator() {
        let sync = crate::programs::Sequence::definition("s", [1i64], Value::Null).create();
        let gen = AsyncGenerator::from(sync);
        assert_eq!(gen.resume(Value::Undefined).await.unwrap(), StepResult::yielded(1i64));
        assert_eq!(gen.resume(Value::Undefined).await.unwrap(), StepResult::complete(Value::Null));
    }
}
