//! Error types for the engine.

use std::time::Duration;

use thiserror::Error;

use crate::ids::GeneratorId;
use crate::value::Exception;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    /// Body code raised and nothing in the delegation chain handled it.
    #[error("{id} raised {exception}")]
    BodyRaised {
        id: GeneratorId,
        exception: Exception,
    },
    /// An injected error travelled through the whole chain uncaught.
    #[error("{id} did not handle injected {exception}")]
    Injected {
        id: GeneratorId,
        exception: Exception,
    },
    /// A step was issued while the previous one on the same instance was
    /// still unresolved.
    #[error("{id} already has a step in flight")]
    ConcurrentStep { id: GeneratorId },
    /// A previous step was abandoned half-way; only a forced return is
    /// accepted now.
    #[error("{id} was interrupted mid-step and only accepts a forced return")]
    Interrupted { id: GeneratorId },
    #[error("{id} step timed out after {after:?}")]
    TimedOut { id: GeneratorId, after: Duration },
}

impl GeneratorError {
    pub fn body_raised(id: GeneratorId, exception: Exception) -> Self {
        GeneratorError::BodyRaised { id, exception }
    }

    pub fn injected(id: GeneratorId, exception: Exception) -> Self {
        GeneratorError::Injected { id, exception }
    }

    pub fn concurrent_step(id: GeneratorId) -> Self {
        GeneratorError::ConcurrentStep { id }
    }

    pub fn interrupted(id: GeneratorId) -> Self {
        GeneratorError::Interrupted { id }
    }

    pub fn timed_out(id: GeneratorId, after: Duration) -> Self {
        GeneratorError::TimedOut { id, after }
    }

    /// The exception carried by this error, if it originated in a body.
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            GeneratorError::BodyRaised { exception, .. }
            | GeneratorError::Injected { exception, .. } => Some(exception),
            _ => None,
        }
    }

    /// Convert into an exception so it can be raised inside another body,
    /// e.g. when a synchronous generator delegated from an async body fails.
    pub fn into_exception(self) -> Exception {
        match self {
            GeneratorError::BodyRaised { exception, .. }
            | GeneratorError::Injected { exception, .. } => exception,
            GeneratorError::ConcurrentStep { .. } => {
                Exception::new("ConcurrentStepError", self.to_string())
            }
            GeneratorError::Interrupted { .. } => Exception::runtime_error(self.to_string()),
            GeneratorError::TimedOut { .. } => Exception::new("TimeoutError", self.to_string()),
        }
    }

    pub fn generator_id(&self) -> GeneratorId {
        match self {
            GeneratorError::BodyRaised { id, .. }
            | GeneratorError::Injected { id, .. }
            | GeneratorError::ConcurrentStep { id }
            | GeneratorError::Interrupted { id }
            | GeneratorError::TimedOut { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = GeneratorId::from_raw(3);
        let err = GeneratorError::concurrent_step(id);
        assert_eq!(err.to_string(), "gen#3 already has a step in flight");

        let err = GeneratorError::body_raised(id, Exception::new("ValueError", "boom"));
        assert!(err.to_string().contains("raised ValueError: boom"));
    }

    #[test]
    fn test_into_exception_keeps_body_exception() {
        let exc = Exception::new("KeyError", "missing");
        let err = GeneratorError::injected(GeneratorId::fresh(), exc.clone());
        assert_eq!(err.exception(), Some(&exc));
        assert_eq!(err.into_exception(), exc);
    }

    #[test]
    fn test_protocol_errors_carry_no_exception() {
        let id = GeneratorId::fresh();
        let err = GeneratorError::concurrent_step(id);
        assert!(err.exception().is_none());
        assert_eq!(err.generator_id(), id);
        assert!(err.into_exception().is("ConcurrentStepError"));
    }
}
