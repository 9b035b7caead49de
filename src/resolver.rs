//! Static resolution pass for the Lox interpreter.
//!
//! This module performs a single AST walk to:
//! 1. **Build lexical scopes**: maintains a stack of `HashMap<String,bool>` tracking declared
//!    (false) and fully defined (true) names in each nested block or function.
//! 2. **Enforce static rules**: reports errors such as redeclaration in the same scope,
//!    reading a variable in its own initializer, invalid `return` outside functions,
//!    `break` outside loops, and illegal use of `this`/`super` outside of classes.
//! 3. **Record binding distances**: for every name-bearing occurrence (`Variable`,
//!    `Assign`, `This`, `Super`), calls back into the interpreter to note the depth at
//!    which the name resolves. Occurrences not found in any scope fall through to the
//!    global environment at runtime. This enables the runtime to perform lookups by
//!    climbing exactly the right number of environment frames.
//!
//! # Workflow Overview
//!
//! 1. **Instantiation** (`Resolver::new`)
//!    - Captures a mutable reference to the `Interpreter`, where binding distances will be recorded.
//!    - Initializes empty scope stack and function/class/loop context flags.
//!
//! 2. **Resolution Entry Point** (`resolve(&[Stmt]) -> bool`)
//!    - Walks each top‑level statement via `resolve_stmt`. Errors are reported as they
//!      occur and resolution continues, so one pass surfaces every static error; the
//!      return value is the accumulated error flag.
//!
//! 3. **Statement Resolution** (`resolve_stmt`)
//!    - Declares and defines names for `var`, `fun`, and `class` declarations.
//!    - Handles nested scopes for blocks, class bodies, and function bodies.
//!    - Manages `return`/`break` validity via the function and loop context flags.
//!    - Injects `this` (and `super` for subclasses) in class member scopes.
//!
//! 4. **Expression Resolution** (`resolve_expr`)
//!    - Recursively descends into every expression node.
//!    - For variable reads and assignments, ensures no forward-read in initializers and
//!      calls `resolve_local`.
//!
//! The resolver never mutates the AST; its only output is the annotation map
//! inside the interpreter plus the error flag.

use std::collections::HashMap;

use log::{debug, info};

use crate::error::LoxError;
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::{ControlKind, FunctionDecl, Stmt};
use crate::token::Token;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class
    None,

    /// Inside a class declaration _without_ a superclass
    Class,

    /// Inside a class declaration _with_ a superclass
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    in_loop: bool,
    had_error: bool,
}

impl<'interp> Resolver<'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            in_loop: false,
            had_error: false,
        }
    }

    /// Walk all top‑level statements. Returns true when any static error was
    /// reported.
    pub fn resolve(&mut self, statements: &[Stmt]) -> bool {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        self.had_error
    }

    /// Report a static error and keep resolving.
    fn error(&mut self, token: &Token, message: &str) {
        let err = LoxError::resolve(token, message);

        eprintln!("{}", err);

        self.had_error = true;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Class {
                name,
                superclass,
                statics,
                methods,
                getters,
                setters,
            } => {
                // 1. Self‑inheritance guard
                if let Some(Expr::Variable {
                    name: super_name, ..
                }) = superclass
                {
                    if super_name.lexeme == name.lexeme {
                        self.error(super_name, "A class can't inherit from itself.");
                    }
                }

                // 2. Declare & define the class name so members can refer to it
                self.declare(name);
                self.define(name);

                // 3. Save and enter the class context
                let enclosing_class: ClassType = self.current_class;

                self.current_class = if superclass.is_some() {
                    ClassType::Subclass
                } else {
                    ClassType::Class
                };

                // 4. If there is a superclass, resolve it and bind `super`
                if let Some(super_expr) = superclass {
                    self.resolve_expr(super_expr);

                    self.begin_scope();
                    self.scope_insert("super");
                }

                // 5. Statics are resolved *outside* the `this` scope: they are
                // looked up unbound, so their environment chain has no `this`
                // layer and the recorded distances must not count one.
                for static_fn in statics {
                    self.resolve_function(FunctionType::Method, static_fn);
                }

                // 6. Open the implicit `this` scope for instance members
                self.begin_scope();
                self.scope_insert("this");

                // 7. Resolve each method, getter and setter in a method context
                for method in methods {
                    self.resolve_function(FunctionType::Method, method);
                }

                for getter in getters {
                    self.resolve_function(FunctionType::Method, getter);
                }

                for setter in setters {
                    self.resolve_function(FunctionType::Method, setter);
                }

                // 8. Close the `this` scope
                self.end_scope();

                // 9. If we opened a `super` scope, close it now
                if superclass.is_some() {
                    self.end_scope();
                }

                // 10. Restore the outer class context
                self.current_class = enclosing_class;
            }

            Stmt::Block(statements) => {
                // 1. Push a new anonymous scope for `{ … }`
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                // 2. Pop the block scope
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // 1. Declare the variable name (marked but not yet defined)
                self.declare(name);

                // 2. Resolve the initializer expression, if any
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                // 3. Define the variable so it’s available in this scope
                self.define(name);
            }

            Stmt::VarList(declarations) => {
                for declaration in declarations {
                    self.resolve_stmt(declaration);
                }
            }

            Stmt::Function(declaration) => {
                // 1. Declare & define the function name (allow recursion)
                if let Some(name) = &declaration.name {
                    self.declare(name);
                    self.define(name);
                }

                // 2. Resolve parameters and body under a function context
                self.resolve_function(FunctionType::Function, declaration);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);

                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                // 1. Resolve the loop condition
                self.resolve_expr(condition);

                // 2. Resolve the body with the loop flag raised so `break`
                //    validates
                let enclosing_loop = self.in_loop;
                self.in_loop = true;

                self.resolve_stmt(body);

                self.in_loop = enclosing_loop;
            }

            Stmt::Control {
                keyword,
                kind,
                value,
            } => match kind {
                ControlKind::Return => {
                    if self.current_function == FunctionType::None {
                        self.error(keyword, "illegal return statement.");
                    }

                    if let Some(expr) = value {
                        self.resolve_expr(expr);
                    }
                }

                ControlKind::Break => {
                    if !self.in_loop {
                        self.error(keyword, "illegal break statement.");
                    }
                }
            },
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        debug!("Resolving expr: {:?}", expr);

        match expr {
            Expr::Literal(_) => {
                // Literals have no sub‑expressions
            }

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // 1. Prevent reading a variable in its own initializer
                let mid_declaration = self
                    .scopes
                    .last()
                    .map(|scope| scope.get(&name.lexeme) == Some(&false))
                    .unwrap_or(false);

                if mid_declaration {
                    self.error(name, "cannot read variable being declared.");
                }

                // 2. Bind this variable occurrence at its lexical depth
                self.resolve_local(*id, name);
            }

            Expr::Assign {
                id, name, value, ..
            } => {
                // Resolve the right‑hand side first, then bind the assignment
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::This { id, keyword } => {
                // 'this' only valid inside class members
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'this' outside of a class.");
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::Subscript { object, key, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(key);
            }

            Expr::SubscriptSet {
                object, key, value, ..
            } => {
                self.resolve_expr(object);
                self.resolve_expr(key);
                self.resolve_expr(value);
            }

            Expr::Super { id, keyword, .. } => {
                // 1. Disallow outside any class
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'super' outside of a class.");
                } else if self.current_class != ClassType::Subclass {
                    // 2. Disallow in a class with no superclass
                    self.error(keyword, "Cannot use 'super' in a class with no superclass.");
                }

                // 3. Bind 'super' like a local variable
                self.resolve_local(*id, keyword);
            }

            Expr::Lambda(declaration) => {
                self.resolve_function(FunctionType::Function, declaration);
            }

            Expr::Array { elements, .. } => {
                for element in elements {
                    self.resolve_expr(element);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    ///
    /// `kind` indicates whether this is a standalone function or a class
    /// member.
    fn resolve_function(&mut self, kind: FunctionType, declaration: &FunctionDecl) {
        // 1. Save the enclosing contexts so we can restore them later. The
        //    loop flag resets: `break` cannot cross a function boundary.
        let enclosing_function = self.current_function;
        let enclosing_loop = self.in_loop;

        self.current_function = kind;
        self.in_loop = false;

        // 2. Begin a new lexical scope for the function parameters & body.
        self.begin_scope();

        // 3. Declare and immediately define each parameter in this new scope.
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }

        // 4. Resolve each statement in the function body under the current context.
        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }

        // 5. End the function’s parameter/body scope and restore contexts.
        self.end_scope();

        self.current_function = enclosing_function;
        self.in_loop = enclosing_loop;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Pre-define a synthetic name (`this`, `super`) in the innermost scope.
    fn scope_insert(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    fn declare(&mut self, name: &Token) {
        // 1. If in a local scope, ensure no duplicate declarations. The
        //    global scope is not tracked and allows redeclaration.
        let duplicate = self
            .scopes
            .last()
            .map(|scope| scope.contains_key(&name.lexeme))
            .unwrap_or(false);

        if duplicate {
            self.error(name, "variable redeclared.");
            return;
        }

        // 2. Mark the name as declared but not yet defined
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        // Mark the name as fully defined in the current scope
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this name occurrence as a local at depth `d`, or leave it
    /// unannotated (a global) when no scope contains it.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        // 1. Search each scope from innermost outward
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                // 2. Tell the interpreter about the local binding
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        // 3. Not found in any scope → it's a global
        debug!("Resolved '{}' as global", name.lexeme);
    }
}
