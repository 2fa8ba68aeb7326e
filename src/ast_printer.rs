use crate::ast::{Expr, Function, LiteralValue, Stmt};
use crate::token::format_number_literal;

/// Renders the tree in parenthesized prefix form, e.g. `(+ 1 (group 2))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => literal(lit),

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── variables ───────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::Lambda(function) => Self::function("fun", function),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Block(statements) => {
                let mut s = String::from("(block");
                for inner in statements {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(inner));
                }
                s.push(')');
                s
            }

            Stmt::Break(_) => "(break)".into(),

            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Function(function) => {
                Self::function(&format!("fun {}", function.name.lexeme), function)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if-else {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut s = format!("(class {}", name.lexeme);
                if let Some(superclass) = superclass {
                    s.push_str(" < ");
                    s.push_str(&Self::print(superclass));
                }
                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::function(&format!("fun {}", method.name.lexeme), method));
                }
                s.push(')');
                s
            }
        }
    }

    fn function(head: &str, function: &Function) -> String {
        let params: Vec<&str> = function.params.iter().map(|p| p.lexeme.as_str()).collect();

        let mut s = format!("({} ({})", head, params.join(" "));
        for stmt in &function.body {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }
}

/// Renders expressions in reverse-Polish form: `(1 + 2) * 3` becomes
/// `1 2 + 3 *`.  Node kinds with no postfix reading fall back to
/// [`AstPrinter`].
pub struct RpnPrinter;

impl RpnPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            Expr::Literal(lit) => literal(lit),

            Expr::Grouping(inner) => Self::print(inner),

            Expr::Unary { operator, right } => format!("{} {}", Self::print(right), operator.lexeme),

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "{} {} {}",
                Self::print(left),
                Self::print(right),
                operator.lexeme
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => format!("{} {} =", Self::print(value), name.lexeme),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut parts: Vec<String> = arguments.iter().map(Self::print).collect();
                parts.push(Self::print(callee));
                parts.push("call".into());
                parts.join(" ")
            }

            other => AstPrinter::print(other),
        }
    }
}

fn literal(lit: &LiteralValue) -> String {
    match lit {
        LiteralValue::True => "true".into(),
        LiteralValue::False => "false".into(),
        LiteralValue::Nil => "nil".into(),
        LiteralValue::Str(s) => s.clone(),
        // 3 → 3.0
        LiteralValue::Number(n) => format_number_literal(*n),
    }
}
