//! Running-Computation Stack
//!
//! The stack records which getters are currently computing, innermost last.
//! It exists so that a tracked read can be attributed to every computation
//! that is (directly or through nested getter calls) waiting on it.
//!
//! # Implementation
//!
//! Each store owns one stack. Running a getter pushes a frame and returns a
//! [`ComputationFrame`] guard; the frame is popped when the guard drops, so
//! an early `?` return or a panic inside a getter function cannot leave an
//! abandoned frame that would swallow later reads.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use super::getter::{Getter, GetterId};
use super::registry::{Field, Target};

#[derive(Default)]
pub(crate) struct ContextStack {
    frames: RefCell<SmallVec<[Rc<Getter>; 4]>>,
}

impl ContextStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Push a frame for `getter`. The frame is popped when the guard drops.
    pub(crate) fn enter(&self, getter: Rc<Getter>) -> ComputationFrame<'_> {
        let getter_id = getter.id();
        self.frames.borrow_mut().push(getter);
        ComputationFrame {
            stack: self,
            getter_id,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        !self.frames.borrow().is_empty()
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    pub(crate) fn current(&self) -> Option<GetterId> {
        self.frames.borrow().last().map(|getter| getter.id())
    }

    pub(crate) fn contains(&self, id: GetterId) -> bool {
        self.frames.borrow().iter().any(|getter| getter.id() == id)
    }

    /// Names of the running getters, starting at the outermost frame of `id`.
    pub(crate) fn chain_from(&self, id: GetterId) -> Vec<String> {
        self.frames
            .borrow()
            .iter()
            .skip_while(|getter| getter.id() != id)
            .map(|getter| getter.name().to_string())
            .collect()
    }

    /// Record `target.field` in the registry of every running computation.
    pub(crate) fn track(&self, target: Target, field: Field) {
        for getter in self.frames.borrow().iter() {
            getter.record(target, field.clone());
        }
    }
}

/// Guard that pops the computation frame when dropped.
pub(crate) struct ComputationFrame<'a> {
    stack: &'a ContextStack,
    getter_id: GetterId,
}

impl Drop for ComputationFrame<'_> {
    fn drop(&mut self) {
        let popped = self.stack.frames.borrow_mut().pop();

        if let Some(getter) = popped {
            debug_assert_eq!(
                getter.id(),
                self.getter_id,
                "computation frame mismatch: expected {:?}, got {:?}",
                self.getter_id,
                getter.id()
            );
        }
    }
}
