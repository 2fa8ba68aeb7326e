use std::fmt;
use std::rc::Rc;

use crate::callable::{Function, NativeFunction};
use crate::class::Class;
use crate::instance::Instance;

/// A runtime value.  Declaring a variable without an initializer stores
/// `Nil` directly; an absent binding is what "undeclared" means.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction(Rc<NativeFunction>),
    Function(Function),
    Class(Class),
    Instance(Instance),
}

impl Value {
    /// `nil` and `false` are falsy; everything else, `0` and `""` included,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

/// Equality only holds between values of the same dynamic type.  Functions,
/// classes and instances compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction(_) => write!(f, "<native fn>"),

            Value::Function(function) => write!(f, "{}", function),

            Value::Class(class) => write!(f, "{}", class),

            Value::Instance(instance) => write!(f, "{}", instance),
        }
    }
}
