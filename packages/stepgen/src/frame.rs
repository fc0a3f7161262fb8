//! Frames on a delegation stack.

use crate::ids::GeneratorId;

/// One active body in a delegation chain.
///
/// `B` is the boxed body type: `Box<dyn GeneratorBody>` for synchronous
/// generators, `Box<dyn AsyncGeneratorBody>` for asynchronous ones.
#[derive(Debug)]
pub struct Frame<B> {
    pub id: GeneratorId,
    pub name: String,
    pub body: B,
    /// Whether the body has been entered. An unstarted frame has run no code,
    /// so an error thrown into it fails it at its first statement and a
    /// forced return skips its cleanup.
    pub started: bool,
}

impl<B> Frame<B> {
    pub fn new(id: GeneratorId, name: impl Into<String>, body: B) -> Self {
        Frame {
            id,
            name: name.into(),
            body,
            started: false,
        }
    }

    pub fn started(mut self) -> Self {
        self.started = true;
        self
    }
}
