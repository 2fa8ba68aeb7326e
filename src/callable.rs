//! Things that can be invoked with call syntax: host-provided natives and
//! user-defined functions (including methods bound to an instance).

use std::fmt;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::ast;
use crate::environment::{Environment, SharedEnv};
use crate::error::{LoxError, Result};
use crate::instance::Instance;
use crate::interpreter::{InterpretError, Interpreter};
use crate::value::Value;

/// The call capability.  Argument counts are checked by the caller against
/// [`Callable::arity`] before `call` runs.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value>;
}

/// A function implemented by the host.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

impl NativeFunction {
    /// Zero-arity `clock()`: seconds since the Unix epoch, fractional.
    pub fn clock() -> Self {
        NativeFunction {
            name: "clock",
            arity: 0,
            func: |_args: &[Value]| {
                let now: f64 = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs_f64();

                Value::Number(now)
            },
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call<W: Write>(
        &self,
        _interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}

/// A user-defined function or method together with the environment it closes
/// over.  Cheap to clone: the declaration and the closure are shared.
#[derive(Clone)]
pub struct Function(Rc<FunctionImpl>);

struct FunctionImpl {
    declaration: Rc<ast::Function>,
    closure: SharedEnv,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<ast::Function>, closure: SharedEnv, is_initializer: bool) -> Self {
        Function(Rc::new(FunctionImpl {
            declaration,
            closure,
            is_initializer,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.declaration.name.lexeme
    }

    /// A copy of this method whose closure is a one-frame environment
    /// binding `this` to `instance`.
    pub fn bind(&self, instance: Instance) -> Function {
        let environment = Environment::child_of(&self.0.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function::new(
            Rc::clone(&self.0.declaration),
            environment,
            self.0.is_initializer,
        )
    }

    /// The `this` an initializer hands back, whatever its body returned.
    fn bound_this(&self) -> Value {
        self.0.closure.borrow().get_at(0, "this").unwrap_or(Value::Nil)
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.0.declaration.params.len()
    }

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let environment = Environment::child_of(&self.0.closure);

        {
            let mut frame = environment.borrow_mut();
            for (param, argument) in self.0.declaration.params.iter().zip(arguments) {
                frame.define(&param.lexeme, argument);
            }
        }

        let returned: Value = match interpreter.execute_block(&self.0.declaration.body, environment) {
            Ok(()) => Value::Nil,
            Err(InterpretError::Return(value)) => value,
            Err(InterpretError::Runtime(e)) => return Err(e),
            Err(InterpretError::Break(keyword)) => {
                return Err(LoxError::runtime(
                    &keyword,
                    "Cannot use 'break' outside of a loop.",
                ))
            }
        };

        if self.0.is_initializer {
            return Ok(self.bound_this());
        }

        Ok(returned)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.declaration.is_anonymous() {
            write!(f, "<fn>")
        } else {
            write!(f, "<fn {}>", self.name())
        }
    }
}

// Closures can reach themselves through their environment, so Debug stays
// shallow.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
