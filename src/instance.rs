use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::class::Class;
use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// An object created by calling a class.  Handles are shared, so a field
/// written through one handle is visible through every other.
#[derive(Clone)]
pub struct Instance(Rc<RefCell<InstanceImpl>>);

struct InstanceImpl {
    class: Class,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Class) -> Self {
        Instance(Rc::new(RefCell::new(InstanceImpl {
            class,
            fields: HashMap::new(),
        })))
    }

    pub fn class(&self) -> Class {
        self.0.borrow().class.clone()
    }

    /// Fields shadow methods; methods come back bound to this instance.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.0.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        match self.class().find_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(method.bind(self.clone()))),
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.0
            .borrow_mut()
            .fields
            .insert(name.lexeme.clone(), value);
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.0.borrow().class)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
