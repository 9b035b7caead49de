//! Parenthesized AST stringifier, used by tests to pin grammar shapes.

use crate::expr::{Expr, LiteralValue};
use crate::stmt::{ControlKind, Stmt};

pub struct Ast;

impl Ast {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(literal) => match literal {
                LiteralValue::Nil => "nil".to_string(),

                LiteralValue::Bool(b) => b.to_string(),

                LiteralValue::Int(n) => n.to_string(),

                LiteralValue::Float(n) => n.to_string(),

                LiteralValue::String(s) => s.to_string(),
            },

            Expr::Grouping(inner) => format!("(group {})", self.print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, self.print(right))
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
                self.print(left),
                self.print(right)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign {
                name,
                operator,
                value,
                ..
            } => format!("({} {} {})", operator.lexeme, name.lexeme, self.print(value)),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", self.print(callee));
                for argument in arguments {
                    out.push(' ');
                    out.push_str(&self.print(argument));
                }
                out.push(')');
                out
            }

            Expr::Get { object, name } => format!("(. {} {})", self.print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                self.print(object),
                name.lexeme,
                self.print(value)
            ),

            Expr::Subscript { object, key, .. } => {
                format!("(index {} {})", self.print(object), self.print(key))
            }

            Expr::SubscriptSet {
                object, key, value, ..
            } => format!(
                "(= (index {} {}) {})",
                self.print(object),
                self.print(key),
                self.print(value)
            ),

            Expr::This { .. } => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::Lambda(declaration) => {
                let params: Vec<&str> = declaration
                    .params
                    .iter()
                    .map(|p| p.lexeme.as_str())
                    .collect();

                let mut out = format!("(lambda ({})", params.join(" "));
                for stmt in &declaration.body {
                    out.push(' ');
                    out.push_str(&self.print_stmt(stmt));
                }
                out.push(')');
                out
            }

            Expr::Array { elements, .. } => {
                let mut out = "(array".to_string();
                for element in elements {
                    out.push(' ');
                    out.push_str(&self.print(element));
                }
                out.push(')');
                out
            }
        }
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", self.print(expr)),

            Stmt::Print(expr) => format!("(print {})", self.print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => format!("(var {} {})", name.lexeme, self.print(expr)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::VarList(declarations) => {
                let mut out = "(var-list".to_string();
                for declaration in declarations {
                    out.push(' ');
                    out.push_str(&self.print_stmt(declaration));
                }
                out.push(')');
                out
            }

            Stmt::Block(statements) => {
                let mut out = "(block".to_string();
                for statement in statements {
                    out.push(' ');
                    out.push_str(&self.print_stmt(statement));
                }
                out.push(')');
                out
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                self.print(condition),
                self.print_stmt(body)
            ),

            Stmt::Function(declaration) => {
                let name = declaration
                    .name
                    .as_ref()
                    .map(|n| n.lexeme.as_str())
                    .unwrap_or("lambda");

                let params: Vec<&str> = declaration
                    .params
                    .iter()
                    .map(|p| p.lexeme.as_str())
                    .collect();

                let mut out = format!("(fun {} ({})", name, params.join(" "));
                for stmt in &declaration.body {
                    out.push(' ');
                    out.push_str(&self.print_stmt(stmt));
                }
                out.push(')');
                out
            }

            Stmt::Class { name, superclass, .. } => match superclass {
                Some(superclass) => {
                    format!("(class {} < {})", name.lexeme, self.print(superclass))
                }
                None => format!("(class {})", name.lexeme),
            },

            Stmt::Control { kind, value, .. } => match kind {
                ControlKind::Return => match value {
                    Some(expr) => format!("(return {})", self.print(expr)),
                    None => "(return)".to_string(),
                },

                ControlKind::Break => "(break)".to_string(),
            },
        }
    }
}
