use std::sync::{Arc, Mutex};

use stepgen::{
    BodyStep, Chain, Exception, Generator, GeneratorBody, GeneratorDefinition, GeneratorState,
    Sequence, StepResult, Value,
};

type Log = Arc<Mutex<Vec<String>>>;

fn collect(generator: &mut Generator) -> (Vec<Value>, Value) {
    let mut values = Vec::new();
    loop {
        let result = generator.resume(Value::Undefined).unwrap();
        if result.done {
            return (values, result.value);
        }
        values.push(result.value);
    }
}

/// Yields its items, logging cleanup under its own name.
#[derive(Debug)]
struct Logged {
    name: &'static str,
    items: Vec<Value>,
    completion: Value,
    log: Log,
}

impl Logged {
    fn new(name: &'static str, items: Vec<Value>, completion: Value, log: Log) -> Self {
        Logged {
            name,
            items,
            completion,
            log,
        }
    }
}

impl GeneratorBody for Logged {
    fn resume(&mut self, _value: Value) -> BodyStep {
        if self.items.is_empty() {
            return BodyStep::Return(std::mem::take(&mut self.completion));
        }
        BodyStep::Yield(self.items.remove(0))
    }

    fn close(&mut self) -> Result<(), Exception> {
        self.log.lock().unwrap().push(format!("cleanup {}", self.name));
        Ok(())
    }
}

/// Yields "before", delegates to `child`, yields whatever the delegation
/// evaluated to, then completes.
#[derive(Debug)]
struct Parent {
    child: Option<Generator>,
    pc: u8,
    log: Log,
    catch: bool,
}

impl Parent {
    fn new(child: Generator, log: Log) -> Self {
        Parent {
            child: Some(child),
            pc: 0,
            log,
            catch: false,
        }
    }

    fn catching(mut self) -> Self {
        self.catch = true;
        self
    }
}

impl GeneratorBody for Parent {
    fn resume(&mut self, value: Value) -> BodyStep {
        self.pc += 1;
        match self.pc {
            1 => BodyStep::Yield(Value::from("before")),
            2 => match self.child.take() {
                Some(child) => BodyStep::Delegate(child),
                None => BodyStep::Throw(Exception::runtime_error("child already consumed")),
            },
            3 => BodyStep::Yield(value),
            _ => BodyStep::Return(Value::from("parent done")),
        }
    }

    fn throw(&mut self, exception: Exception) -> BodyStep {
        if self.catch && self.pc == 2 {
            self.log.lock().unwrap().push(format!("parent caught {}", exception.name));
            self.pc = 3;
            return BodyStep::Yield(Value::from("handled"));
        }
        BodyStep::Throw(exception)
    }

    fn close(&mut self) -> Result<(), Exception> {
        self.log.lock().unwrap().push("cleanup parent".to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FailsAfterOne {
    pc: u8,
}

impl GeneratorBody for FailsAfterOne {
    fn resume(&mut self, _value: Value) -> BodyStep {
        self.pc += 1;
        if self.pc == 1 {
            BodyStep::Yield(Value::from("child"))
        } else {
            BodyStep::Throw(Exception::new("ChildError", "child broke"))
        }
    }
}

#[test]
fn delegation_concatenates_outputs() {
    let a = Sequence::definition("A", ["a", "b"], Value::Int(1));
    let b = Sequence::definition("B", ["c", "d"], Value::Int(2));
    let mut chained = Chain::definition("AB", [a, b]).create();

    let (values, completion) = collect(&mut chained);
    assert_eq!(values, vec![Value::from("a"), "b".into(), "c".into(), "d".into()]);
    assert_eq!(completion, Value::List(vec![Value::Int(1), Value::Int(2)]));
}

#[test]
fn delegation_matches_flattened_sequence() {
    let flat = Sequence::definition("flat", ["a", "b", "c", "d"], Value::Null);
    let nested = Chain::definition(
        "nested",
        [
            Sequence::definition("A", ["a", "b"], Value::Null),
            Chain::definition("inner", [Sequence::definition("B", ["c", "d"], Value::Null)]),
        ],
    );
    let (flat_values, _) = collect(&mut flat.create());
    let (nested_values, _) = collect(&mut nested.create());
    assert_eq!(flat_values, nested_values);
}

#[test]
fn child_completion_value_resumes_parent() {
    let log: Log = Arc::default();
    let child = Sequence::definition("child", ["x"], Value::from("child result")).create();
    let mut parent = Generator::from_body("parent", Parent::new(child, log));

    let (values, completion) = collect(&mut parent);
    assert_eq!(
        values,
        vec![Value::from("before"), "x".into(), "child result".into()]
    );
    assert_eq!(completion, Value::from("parent done"));
}

#[test]
fn force_return_cleans_child_before_parent() {
    let log: Log = Arc::default();
    let child = Generator::from_body(
        "child",
        Logged::new("child", vec!["c1".into(), "c2".into()], Value::Null, log.clone()),
    );
    let mut parent = Generator::from_body("parent", Parent::new(child, log.clone()));

    assert_eq!(parent.resume(Value::Undefined).unwrap(), StepResult::yielded("before"));
    assert_eq!(parent.resume(Value::Undefined).unwrap(), StepResult::yielded("c1"));
    assert_eq!(parent.delegation_depth(), 1);

    assert_eq!(parent.force_return("stop").unwrap(), StepResult::complete("stop"));
    assert_eq!(parent.state(), GeneratorState::Completed);
    assert_eq!(parent.delegation_depth(), 0);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["cleanup child".to_string(), "cleanup parent".to_string()]
    );
}

#[test]
fn child_error_propagates_to_parent_handler() {
    let log: Log = Arc::default();
    let child = Generator::from_body("child", FailsAfterOne::default());
    let mut parent = Generator::from_body("parent", Parent::new(child, log.clone()).catching());

    parent.resume(Value::Undefined).unwrap();
    assert_eq!(parent.resume(Value::Undefined).unwrap(), StepResult::yielded("child"));
    assert_eq!(parent.resume(Value::Undefined).unwrap(), StepResult::yielded("handled"));
    assert_eq!(parent.delegation_depth(), 0);
    assert_eq!(
        parent.resume(Value::Undefined).unwrap(),
        StepResult::complete("parent done")
    );
    assert_eq!(*log.lock().unwrap(), vec!["parent caught ChildError".to_string()]);
}

#[test]
fn uncaught_child_error_fails_parent() {
    let log: Log = Arc::default();
    let child = Generator::from_body("child", FailsAfterOne::default());
    let mut parent = Generator::from_body("parent", Parent::new(child, log));

    parent.resume(Value::Undefined).unwrap();
    parent.resume(Value::Undefined).unwrap();
    let err = parent.resume(Value::Undefined).unwrap_err();
    assert_eq!(err.generator_id(), parent.id());
    assert!(err.exception().is_some_and(|exception| exception.is("ChildError")));
    assert_eq!(parent.state(), GeneratorState::Failed);
}

#[test]
fn injection_reaches_innermost_delegate() {
    let log: Log = Arc::default();
    let grandchild = Generator::from_body("grandchild", FailsAfterOne::default());
    let child = Generator::from_body("child", Parent::new(grandchild, log.clone()).catching());
    let mut root = Generator::from_body("root", Parent::new(child, log.clone()));

    assert_eq!(root.resume(Value::Undefined).unwrap(), StepResult::yielded("before"));
    assert_eq!(root.resume(Value::Undefined).unwrap(), StepResult::yielded("before"));
    assert_eq!(root.resume(Value::Undefined).unwrap(), StepResult::yielded("child"));
    assert_eq!(root.delegation_depth(), 2);
    assert_eq!(root.delegation_ids().len(), 3);

    // The grandchild has no handler; the middle generator catches it.
    let result = root.inject(Exception::new("Cancelled", "from host")).unwrap();
    assert_eq!(result, StepResult::yielded("handled"));
    assert_eq!(root.delegation_depth(), 1);
    assert_eq!(*log.lock().unwrap(), vec!["parent caught Cancelled".to_string()]);

    assert_eq!(
        root.resume(Value::Undefined).unwrap(),
        StepResult::yielded("parent done")
    );
    assert_eq!(root.resume(Value::Undefined).unwrap(), StepResult::complete("parent done"));
}

#[test]
fn delegating_to_finished_child_evaluates_to_undefined() {
    let child_def = GeneratorDefinition::new("child", || {
        Sequence::new(["only"], Value::from("child done"))
    });
    let mut finished = child_def.create();
    collect(&mut finished);

    let log: Log = Arc::default();
    let mut parent = Generator::from_body("parent", Parent::new(finished, log));
    parent.resume(Value::Undefined).unwrap();
    assert_eq!(
        parent.resume(Value::Undefined).unwrap(),
        StepResult::yielded(Value::Undefined)
    );
    assert_eq!(parent.delegation_depth(), 0);
}
