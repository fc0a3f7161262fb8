//! Delegation stack: the owned chain of active bodies, indexed by depth.
//!
//! Depth 0 is the instance's own body; each delegation pushes the child's
//! frames on top. Only the top frame ever runs. Children are absorbed by
//! moving their frames in, so forwarding and cleanup order never depend on
//! native recursion.

use crate::frame::Frame;
use crate::ids::GeneratorId;

#[derive(Debug)]
pub struct DelegationStack<B> {
    frames: Vec<Frame<B>>,
}

impl<B> DelegationStack<B> {
    pub fn new(root: Frame<B>) -> Self {
        DelegationStack { frames: vec![root] }
    }

    pub fn empty() -> Self {
        DelegationStack { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: Frame<B>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame<B>> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&Frame<B>> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Frame<B>> {
        self.frames.last_mut()
    }

    pub fn get(&self, depth: usize) -> Option<&Frame<B>> {
        self.frames.get(depth)
    }

    /// Move every frame of `child` on top of this stack, preserving order.
    pub fn absorb(&mut self, child: DelegationStack<B>) -> usize {
        let moved = child.frames.len();
        self.frames.extend(child.frames);
        moved
    }

    /// Remove all frames, leaving the stack empty.
    pub fn take(&mut self) -> DelegationStack<B> {
        DelegationStack {
            frames: std::mem::take(&mut self.frames),
        }
    }

    /// Number of children currently delegated to (frames above depth 0).
    pub fn delegation_depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Ids from the root body up to the frame currently executing.
    pub fn ids(&self) -> Vec<GeneratorId> {
        self.frames.iter().map(|frame| frame.id).collect()
    }
}

impl<B> Default for DelegationStack<B> {
    fn default() -> Self {
        Self::empty()
    }
}
