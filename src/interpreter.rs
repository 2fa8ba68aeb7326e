//! Tree-walking evaluator.
//!
//! Statements execute into [`IResult`], whose error channel carries either a
//! reportable runtime error or one of the two control signals (`return`,
//! `break`).  Each boundary consumes only its own signal: loops swallow
//! `Break`, function calls swallow `Return`, and everything else passes
//! through untouched.  Expressions cannot raise signals, so `evaluate` returns
//! a plain [`Result`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{Callable, Function, NativeFunction};
use crate::class::Class;
use crate::environment::{Environment, SharedEnv};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Why statement execution stopped early.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error(transparent)]
    Runtime(#[from] LoxError),

    #[error("Return signal with value: {0}")]
    Return(Value),

    #[error("Break signal at line {}", .0.line)]
    Break(Token),
}

/// Convenient alias for statement results.
pub type IResult<T> = std::result::Result<T, InterpretError>;

/// Resolver output: scope distance for every resolved local reference.
pub type Locals = HashMap<ExprId, usize>;

/// Nested calls allowed before a program is stopped with "Stack overflow.".
pub const MAX_CALL_DEPTH: usize = 200;

pub struct Interpreter<W: Write = io::Stdout> {
    globals: SharedEnv,
    environment: SharedEnv,
    locals: Locals,
    call_depth: usize,
    output: W,
}

impl Interpreter<io::Stdout> {
    /// An interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Creates an interpreter writing `print` output to `output`, with the
    /// native functions installed in the global frame.
    pub fn with_output(output: W) -> Self {
        info!("Initializing Interpreter");

        let globals: SharedEnv = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals
            .borrow_mut()
            .define("clock", Value::NativeFunction(Rc::new(NativeFunction::clock())));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            call_depth: 0,
            output,
        }
    }

    /// Records scope distances computed by the resolver.  Entries accumulate
    /// across calls so closures from earlier REPL lines keep resolving.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved locals", locals.len());

        self.locals.extend(locals);
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Executes a program.  The first runtime error aborts the remaining
    /// statements and is returned to the caller for reporting.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(InterpretError::Runtime(e)) => return Err(e),
                Err(InterpretError::Break(keyword)) => {
                    return Err(LoxError::runtime(
                        &keyword,
                        "Cannot use 'break' outside of a loop.",
                    ))
                }
                Err(InterpretError::Return(_)) => {
                    debug!("Return signal escaped to top level; ignoring");
                    return Ok(());
                }
            }
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Runs `statements` inside `environment`, restoring the previous
    /// environment afterwards no matter how execution ended.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: SharedEnv) -> IResult<()> {
        let previous: SharedEnv = mem::replace(&mut self.environment, environment);

        let result: IResult<()> = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;

        result
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Block(statements) => {
                debug!("Entering block with {} statements", statements.len());

                let environment = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::Break(keyword) => Err(InterpretError::Break(keyword.clone())),

            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(function));

                Ok(())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value).map_err(LoxError::from)?;

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);

                Err(InterpretError::Return(value))
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body) {
                        Ok(()) => {}
                        Err(InterpretError::Break(_)) => break,
                        Err(other) => return Err(other),
                    }
                }

                debug!("Exited while loop");

                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                // Bound first so methods can refer to the class by name.
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                let superclass: Option<Class> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let token: &Token = match expr {
                                Expr::Variable { name, .. } => name,
                                _ => name,
                            };

                            return Err(
                                LoxError::runtime(token, "Superclass must be a class.").into()
                            );
                        }
                    },
                    None => None,
                };

                let method_env: SharedEnv = match &superclass {
                    Some(superclass) => {
                        let environment = Environment::child_of(&self.environment);
                        environment
                            .borrow_mut()
                            .define("super", Value::Class(superclass.clone()));
                        environment
                    }
                    None => Rc::clone(&self.environment),
                };

                let methods: HashMap<String, Function> = methods
                    .iter()
                    .map(|method| {
                        let is_initializer: bool = method.name.lexeme == "init";
                        let function =
                            Function::new(Rc::clone(method), Rc::clone(&method_env), is_initializer);

                        (method.name.lexeme.clone(), function)
                    })
                    .collect();

                let class = Class::new(name.lexeme.clone(), superclass, methods);

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(class))?;

                Ok(())
            }
        }
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuits: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&depth) => {
                        let assigned: bool = self.environment.borrow_mut().assign_at(
                            depth,
                            &name.lexeme,
                            value.clone(),
                        );

                        if !assigned {
                            return Err(LoxError::runtime(
                                name,
                                format!("Undefined variable '{}'.", name.lexeme),
                            ));
                        }
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                match callee {
                    Value::Function(function) => self.invoke(&function, paren, values),
                    Value::NativeFunction(native) => self.invoke(native.as_ref(), paren, values),
                    Value::Class(class) => self.invoke(&class, paren, values),
                    _ => Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    )),
                }
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Lambda(declaration) => Ok(Value::Function(Function::new(
                Rc::clone(declaration),
                Rc::clone(&self.environment),
                false,
            ))),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
            },
            _ => Ok(Value::Bool(!right.is_truthy())),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        debug!("Binary '{}' on {} and {}", operator.lexeme, left, right);

        match operator.token_type {
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(left != right)),
            TokenType::PLUS => {
                return match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                    (Value::String(_), _) | (_, Value::String(_)) => {
                        Ok(Value::String(format!("{}{}", left, right)))
                    }
                    _ => Err(LoxError::runtime(
                        operator,
                        "Operands must be two numbers or two strings.",
                    )),
                };
            }
            _ => {}
        }

        let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
            return Err(LoxError::runtime(operator, "Operands must be numbers."));
        };

        let value: Value = match operator.token_type {
            TokenType::MINUS => Value::Number(a - b),
            TokenType::STAR => Value::Number(a * b),
            TokenType::SLASH => Value::Number(a / b),
            TokenType::GREATER => Value::Bool(a > b),
            TokenType::GREATER_EQUAL => Value::Bool(a >= b),
            TokenType::LESS => Value::Bool(a < b),
            TokenType::LESS_EQUAL => Value::Bool(a <= b),
            _ => {
                return Err(LoxError::runtime(
                    operator,
                    format!("Invalid binary operator '{}'.", operator.lexeme),
                ))
            }
        };

        Ok(value)
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let Some(&depth) = self.locals.get(&id) else {
            return Err(LoxError::runtime(
                keyword,
                "Cannot use 'super' outside of a class.",
            ));
        };

        let (superclass, this) = {
            let environment = self.environment.borrow();
            let superclass = environment.get_at(depth, "super");
            let this = depth
                .checked_sub(1)
                .and_then(|this_depth| environment.get_at(this_depth, "this"));
            (superclass, this)
        };

        let (Some(Value::Class(superclass)), Some(Value::Instance(instance))) = (superclass, this)
        else {
            return Err(LoxError::runtime(
                keyword,
                "Cannot use 'super' outside of a class.",
            ));
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(found.bind(instance))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    /// Resolver-backed lookup for locals, dynamic lookup for globals.
    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&depth) => self
                .environment
                .borrow()
                .get_at(depth, &name.lexeme)
                .ok_or_else(|| {
                    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
                }),
            None => self.globals.borrow().get(name),
        }
    }

    /// Checks the argument count and the call depth, then calls.
    fn invoke<C: Callable + ?Sized>(
        &mut self,
        callable: &C,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        if arguments.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            debug!("Call depth limit {} reached", MAX_CALL_DEPTH);
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result: Result<Value> = callable.call(self, arguments);
        self.call_depth -= 1;

        result
    }
}
