//! Iteration driver: consume a generator as a lazy, single-pass sequence.

use std::borrow::{Borrow, BorrowMut};

use crate::error::GeneratorError;
use crate::generator::Generator;
use crate::step::StepRequest;
use crate::value::Value;

/// Repeats `Resume(Undefined)` until the instance is done.
///
/// Yields each produced value; the completion value is kept aside and can be
/// read through [`Driver::completion`]. Dropping a driver before the
/// instance is done issues `ForceReturn(Undefined)` so cleanup still runs.
///
/// `G` is either an owned [`Generator`] or `&mut Generator`, the latter
/// leaving the instance with the caller for inspection afterwards.
#[derive(Debug)]
pub struct Driver<G: BorrowMut<Generator> = Generator> {
    generator: G,
    completion: Option<Value>,
    finished: bool,
}

impl<G: BorrowMut<Generator>> Driver<G> {
    pub fn new(generator: G) -> Self {
        Driver {
            generator,
            completion: None,
            finished: false,
        }
    }

    pub fn generator(&self) -> &Generator {
        self.generator.borrow()
    }

    /// Completion value once the instance finished normally.
    pub fn completion(&self) -> Option<&Value> {
        self.completion.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stop early and run pending cleanup now, surfacing any cleanup error.
    pub fn close(&mut self) -> Result<(), GeneratorError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let generator: &mut Generator = self.generator.borrow_mut();
        generator
            .step(StepRequest::ForceReturn(Value::Undefined))
            .map(|_| ())
    }

    /// Drain the instance, returning every produced value and the completion
    /// value. Infinite generators never return; bound them with `take`.
    pub fn collect_all(mut self) -> Result<(Vec<Value>, Value), GeneratorError> {
        let mut values = Vec::new();
        for item in self.by_ref() {
            values.push(item?);
        }
        let completion = self.completion.take().unwrap_or_default();
        Ok((values, completion))
    }
}

impl<G: BorrowMut<Generator>> Iterator for Driver<G> {
    type Item = Result<Value, GeneratorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let generator: &mut Generator = self.generator.borrow_mut();
        match generator.step(StepRequest::Resume(Value::Undefined)) {
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
}

impl<G: BorrowMut<Generator>> Drop for Driver<G> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("cleanup failed while dropping driver: {err}");
        }
    }
}

impl Generator {
    /// Drive this instance in place.
    pub fn drive(&mut self) -> Driver<&mut Generator> {
        Driver::new(self)
    }
}

impl IntoIterator for Generator {
    type Item = Result<Value, GeneratorError>;
    type IntoIter = Driver;

    fn into_iter(self) -> Driver {
        Driver::new(self)
    }
}
