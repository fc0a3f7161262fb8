//! Async iteration driver and host-side timeout helper.

use std::time::Duration;

use futures_util::stream::{self, Stream};

use crate::asyncgen::scheduler::AsyncGenerator;
use crate::error::GeneratorError;
use crate::step::{StepRequest, StepResult};
use crate::value::Value;

/// Race one step against a timer.
///
/// When the timer wins, the in-flight step is abandoned, the instance is
/// force-returned so its pending cleanup runs, and `TimedOut` is reported.
pub async fn step_with_timeout(
    generator: &AsyncGenerator,
    request: StepRequest,
    after: Duration,
) -> Result<StepResult, GeneratorError> {
    match tokio::time::timeout(after, generator.step(request)).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("{} step timed out after {after:?}; forcing return", generator.id());
            generator.force_return(Value::Undefined).await?;
            Err(GeneratorError::timed_out(generator.id(), after))
        }
    }
}

/// Consumes an asynchronous generator one awaited step at a time.
///
/// Unlike the synchronous driver, cleanup cannot run from `Drop`; callers
/// that stop early must `close().await` (the `take` and `collect_all`
/// helpers do so).
#[derive(Debug)]
pub struct AsyncDriver {
    generator: AsyncGenerator,
    step_timeout: Option<Duration>,
    completion: Option<Value>,
    finished: bool,
}

impl AsyncDriver {
    pub fn new(generator: AsyncGenerator) -> Self {
        AsyncDriver {
            generator,
            step_timeout: None,
            completion: None,
            finished: false,
        }
    }

    /// Bound every step with [`step_with_timeout`].
    pub fn with_step_timeout(mut self, after: Duration) -> Self {
        self.step_timeout = Some(after);
        self
    }

    pub fn generator(&self) -> &AsyncGenerator {
        &self.generator
    }

    pub fn completion(&self) -> Option<&Value> {
        self.completion.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub async fn next(&mut self) -> Option<Result<Value, GeneratorError>> {
        if self.finished {
            return None;
        }
        let request = StepRequest::Resume(Value::Undefined);
        let result = match self.step_timeout {
            Some(after) => step_with_timeout(&self.generator, request, after).await,
            None => self.generator.step(request).await,
        };
        match result {
            Ok(result) if !result.done => Some(Ok(result.value)),
            Ok(result) => {
                self.finished = true;
                self.completion = Some(result.value);
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), GeneratorError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.generator
            .force_return(Value::Undefined)
            .await
            .map(|_| ())
    }

    /// Collect up to `count` values, then close.
    pub async fn take(mut self, count: usize) -> Result<Vec<Value>, GeneratorError> {
        let mut values = Vec::with_capacity(count);
        while values.len() < count {
            match self.next().await {
                Some(item) => values.push(item?),
                None => break,
            }
        }
        self.close().await?;
        Ok(values)
    }

    pub async fn collect_all(mut self) -> Result<(Vec<Value>, Value), GeneratorError> {
        let mut values = Vec::new();
        while let Some(item) = self.next().await {
            values.push(item?);
        }
        Ok((values, self.completion.take().unwrap_or_default()))
    }

    /// View the driver as a `Stream` of produced values. Dropping the stream
    /// early skips cleanup, same as dropping the driver.
    pub fn into_stream(self) -> impl Stream<Item = Result<Value, GeneratorError>> {
        stream::unfold(self, |mut driver| async move {
            let item = driver.next().await?;
            Some((item, driver))
        })
    }
}

impl Drop for AsyncDriver {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!(
                "async driver for {} dropped without close; pending cleanup skipped",
                self.generator.id()
            );
        }
    }
}
