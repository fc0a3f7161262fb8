//! Identifier types for generator instances.
//!
//! IDs are lightweight Copy newtypes handed out from a global counter.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a generator instance.
///
/// Every `create()` call allocates a fresh id, whether the instance is
/// synchronous or asynchronous. Ids survive delegation: a child absorbed into
/// a parent's delegation stack keeps its own id on its frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct GeneratorId(pub u64);

static GENERATOR_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl GeneratorId {
    /// Create a fresh unique GeneratorId.
    pub fn fresh() -> Self {
        GeneratorId(GENERATOR_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a GeneratorId with a specific value (for testing).
    pub fn from_raw(value: u64) -> Self {
        GeneratorId(value)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_id_fresh_is_unique() {
        let g1 = GeneratorId::fresh();
        let g2 = GeneratorId::fresh();
        assert_ne!(g1, g2);
        assert!(g2 > g1);
    }

    #[test]
    fn test_generator_id_display() {
        assert_eq!(GeneratorId::from_raw(7).to_string(), "gen#7");
    }
}
