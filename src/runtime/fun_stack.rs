//! Explicit call stack for resumable function bodies.
//!
//! Function bodies suspend on send, receive, nondeterministic choice and
//! spawn, and the machine holding them may be cloned before it resumes. Call
//! frames therefore live in this stack rather than on the native one.

use crate::core::{FunRef, Value};
use std::fmt;
use std::sync::Arc;

/// A suspended or about-to-run function invocation.
pub struct FunFrame<V: Value, Env> {
    pub fun: FunRef<V, Env>,
    /// Local-variable store owned by this frame alone.
    pub locals: Vec<V>,
    /// Resumption marker interpreted only by the function's own code.
    pub return_to: usize,
}

impl<V: Value, Env> Clone for FunFrame<V, Env> {
    fn clone(&self) -> Self {
        Self {
            fun: Arc::clone(&self.fun),
            locals: self.locals.clone(),
            return_to: self.return_to,
        }
    }
}

impl<V: Value, Env> PartialEq for FunFrame<V, Env> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.fun, &other.fun)
            && self.locals == other.locals
            && self.return_to == other.return_to
    }
}

impl<V: Value, Env> fmt::Debug for FunFrame<V, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunFrame")
            .field("fun", &self.fun.name())
            .field("locals", &self.locals)
            .field("return_to", &self.return_to)
            .finish()
    }
}

/// Stack of function frames, innermost last.
pub struct FunStack<V: Value, Env> {
    frames: Vec<FunFrame<V, Env>>,
}

impl<V: Value, Env> FunStack<V, Env> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Push a frame. The stack takes ownership of `locals`, so no other
    /// frame or caller can alias them.
    pub fn push(&mut self, fun: FunRef<V, Env>, locals: Vec<V>, return_to: usize) {
        self.frames.push(FunFrame {
            fun,
            locals,
            return_to,
        });
    }

    /// Remove and return the innermost frame.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    pub fn pop(&mut self) -> FunFrame<V, Env> {
        self.frames
            .pop()
            .expect("pop on an empty function stack")
    }

    pub fn top(&self) -> Option<&FunFrame<V, Env>> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut FunFrame<V, Env>> {
        self.frames.last_mut()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from the outermost call inwards.
    pub fn iter(&self) -> impl Iterator<Item = &FunFrame<V, Env>> {
        self.frames.iter()
    }
}

impl<V: Value, Env> Default for FunStack<V, Env> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value, Env> Clone for FunStack<V, Env> {
    fn clone(&self) -> Self {
        Self {
            frames: self.frames.clone(),
        }
    }
}

impl<V: Value, Env> PartialEq for FunStack<V, Env> {
    fn eq(&self, other: &Self) -> bool {
        self.frames == other.frames
    }
}

impl<V: Value, Env> fmt::Debug for FunStack<V, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames.iter()).finish()
    }
}
