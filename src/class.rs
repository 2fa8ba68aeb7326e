use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::callable::{Callable, Function};
use crate::error::Result;
use crate::instance::Instance;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Runtime representation of a class.  The method table is fixed once the
/// class statement has executed.
#[derive(Clone)]
pub struct Class(Rc<ClassImpl>);

struct ClassImpl {
    name: String,
    superclass: Option<Class>,
    methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(name: String, superclass: Option<Class>, methods: HashMap<String, Function>) -> Self {
        Class(Rc::new(ClassImpl {
            name,
            superclass,
            methods,
        }))
    }

    /// Walks the single-inheritance chain, nearest class first.
    pub fn find_method(&self, name: &str) -> Option<Function> {
        match self.0.methods.get(name) {
            Some(method) => Some(method.clone()),
            None => self.0.superclass.as_ref()?.find_method(name),
        }
    }
}

impl Callable for Class {
    /// The initializer's arity, or zero without one.
    fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// Instantiation: a fresh instance, initialized by `init` if present.
    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let instance = Instance::new(self.clone());

        if let Some(initializer) = self.find_method("init") {
            initializer
                .bind(instance.clone())
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.0.name)
    }
}
