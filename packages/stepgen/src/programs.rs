//! Stock generator bodies.

use std::collections::VecDeque;

use crate::body::{BodyStep, GeneratorBody, GeneratorDefinition};
use crate::value::{Exception, Value};

/// Emits a fixed list of values in order, then completes with `completion`.
#[derive(Debug, Clone)]
pub struct Sequence {
    items: VecDeque<Value>,
    completion: Value,
}

impl Sequence {
    pub fn new<T: Into<Value>>(items: impl IntoIterator<Item = T>, completion: Value) -> Self {
        Sequence {
            items: items.into_iter().map(Into::into).collect(),
            completion,
        }
    }

    pub fn definition<T: Into<Value>>(
        name: impl Into<String>,
        items: impl IntoIterator<Item = T>,
        completion: Value,
    ) -> GeneratorDefinition {
        let template = Sequence::new(items, completion);
        GeneratorDefinition::new(name, move || template.clone())
    }
}

impl GeneratorBody for Sequence {
    fn resume(&mut self, _value: Value) -> BodyStep {
        match self.items.pop_front() {
            Some(item) => BodyStep::Yield(item),
            None => BodyStep::Return(std::mem::take(&mut self.completion)),
        }
    }
}

/// An infinite arithmetic progression. Never completes on its own.
#[derive(Debug, Clone, Copy)]
pub struct Counter {
    next: i64,
    step: i64,
}

impl Counter {
    pub fn new(start: i64, step: i64) -> Self {
        Counter { next: start, step }
    }

    pub fn definition(name: impl Into<String>, start: i64, step: i64) -> GeneratorDefinition {
        GeneratorDefinition::new(name, move || Counter::new(start, step))
    }
}

impl GeneratorBody for Counter {
    fn resume(&mut self, _value: Value) -> BodyStep {
        let current = self.next;
        self.next = self.next.wrapping_add(self.step);
        BodyStep::Yield(Value::Int(current))
    }
}

/// Yields the running total of the integers it is resumed with, starting
/// from zero. Resuming with a non-integer completes with the total; a total
/// that would leave the `i64` range raises `OverflowError`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accumulator {
    total: i64,
    started: bool,
}

impl GeneratorBody for Accumulator {
    fn resume(&mut self, value: Value) -> BodyStep {
        if !self.started {
            self.started = true;
            return BodyStep::Yield(Value::Int(self.total));
        }
        match value.as_int() {
            Some(delta) => match self.total.checked_add(delta) {
                Some(total) => {
                    self.total = total;
                    BodyStep::Yield(Value::Int(total))
                }
                None => BodyStep::Throw(Exception::new(
                    "OverflowError",
                    format!("{} + {delta} overflows i64", self.total),
                )),
            },
            None => BodyStep::Return(Value::Int(self.total)),
        }
    }
}

/// Delegates to each definition in turn and completes with the list of the
/// children's completion values.
#[derive(Debug, Clone)]
pub struct Chain {
    parts: VecDeque<GeneratorDefinition>,
    results: Vec<Value>,
    delegating: bool,
}

impl Chain {
    pub fn new(parts: impl IntoIterator<Item = GeneratorDefinition>) -> Self {
        Chain {
            parts: parts.into_iter().collect(),
            results: Vec::new(),
            delegating: false,
        }
    }

    pub fn definition(
        name: impl Into<String>,
        parts: impl IntoIterator<Item = GeneratorDefinition>,
    ) -> GeneratorDefinition {
        let template = Chain::new(parts);
        GeneratorDefinition::new(name, move || template.clone())
    }
}

impl GeneratorBody for Chain {
    fn resume(&mut self, value: Value) -> BodyStep {
        if self.delegating {
            self.results.push(value);
        }
        match self.parts.pop_front() {
            Some(part) => {
                self.delegating = true;
                BodyStep::Delegate(part.create())
            }
            None => BodyStep::Return(Value::List(std::mem::take(&mut self.results))),
        }
    }
}
