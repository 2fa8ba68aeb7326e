//! Runtime scope frames.
//!
//! Frames are shared (`Rc<RefCell<_>>`) between the call frame that created
//! them and any closure that captured them; the longest holder keeps a frame
//! alive.  Chains are acyclic because a new frame's parent always exists
//! before it.

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A frame handle as stored by the interpreter and by closures.
pub type SharedEnv = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<SharedEnv>,
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

impl Environment {
    /// The global frame: no parent.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: SharedEnv) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wraps a fresh child of `enclosing` in a shareable handle.
    pub fn child_of(enclosing: &SharedEnv) -> SharedEnv {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    /// Unconditional insert/overwrite in this frame.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Defining '{}' = {}", name, value);

        self.values.insert(name.to_string(), value);
    }

    /// Search this frame, then the enclosing chain.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Mutate the nearest frame that already binds `name`.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Look `name` up exactly `depth` frames out, without searching.
    pub fn get_at(&self, depth: usize, name: &str) -> Option<Value> {
        if depth == 0 {
            return self.values.get(name).cloned();
        }

        self.enclosing
            .as_ref()
            .and_then(|enclosing| enclosing.borrow().get_at(depth - 1, name))
    }

    /// Write `name` exactly `depth` frames out, defining the slot if needed.
    /// Returns `false` if the chain is shorter than `depth`.
    pub fn assign_at(&mut self, depth: usize, name: &str, value: Value) -> bool {
        if depth == 0 {
            self.values.insert(name.to_string(), value);
            return true;
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign_at(depth - 1, name, value),
            None => false,
        }
    }
}
