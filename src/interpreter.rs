//! Tree-walking evaluator.
//!
//! The interpreter owns the environment chain, the resolver's distance
//! annotations (`locals`), and the output sink that `print` writes through.
//! Non-local control flow (`return`, `break`) and runtime errors all travel
//! as a [`Signal`] through the `Result` channel; `return` is caught at
//! function-call entry, `break` at `while` entry, and errors unwind to
//! [`Interpreter::interpret`], which reports the first one and stops.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::builtins;
use crate::class::LoxClass;
use crate::environment::Environment;
use crate::error::LoxError;
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::function::LoxFunction;
use crate::instance::LoxInstance;
use crate::stmt::{ControlKind, FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{is_equal, is_truthy, Value};

/// Everything that can interrupt straight-line execution.
///
/// `Return` and `Break` are internal and never reach the user: the resolver
/// rejects programs where they could escape their enclosing construct.
#[derive(Debug)]
pub enum Signal {
    Error(LoxError),
    Return(Value),
    Break,
}

impl From<LoxError> for Signal {
    fn from(err: LoxError) -> Self {
        Signal::Error(err)
    }
}

impl From<io::Error> for Signal {
    fn from(err: io::Error) -> Self {
        Signal::Error(LoxError::Io(err))
    }
}

pub struct Interpreter {
    repl: bool,
    had_runtime_error: bool,
    environment: Rc<RefCell<Environment>>,
    globals: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    array_class: Rc<LoxClass>,
    out: Box<dyn Write>,
}

impl Interpreter {
    pub fn new(repl: bool) -> Self {
        Self::with_output(repl, Box::new(io::stdout()))
    }

    /// Build an interpreter writing `print` output (and REPL echoes) to an
    /// arbitrary sink instead of stdout.
    pub fn with_output(repl: bool, out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter (repl={})", repl);

        let globals = Rc::new(RefCell::new(Environment::new()));
        let array_class = builtins::install(&globals);

        Interpreter {
            repl,
            had_runtime_error: false,
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            array_class,
            out,
        }
    }

    /// Resolver callback: `name` occurrences with expression id `id` live
    /// `depth` environments up from the current one.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local: id={}, depth={}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Run a program to completion. Returns whether a runtime error was
    /// reported; the flag is reset on entry so a REPL line starts clean.
    pub fn interpret(&mut self, statements: &[Stmt]) -> bool {
        info!("Interpreting {} statement(s)", statements.len());

        self.had_runtime_error = false;

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Signal::Error(err)) => {
                    eprintln!("{}", err);
                    self.had_runtime_error = true;
                    break;
                }

                // A stray return/break is rejected by the resolver before
                // execution ever starts.
                Err(Signal::Return(_)) | Err(Signal::Break) => {
                    self.had_runtime_error = true;
                    break;
                }
            }
        }

        self.had_runtime_error
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Signal> {
        match stmt {
            Stmt::Expression(expr) => {
                let value = self.evaluate(expr)?;

                if self.repl && !matches!(value, Value::Nil) {
                    writeln!(self.out, "{}", value)?;
                }

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.out, "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::VarList(declarations) => {
                for declaration in declarations {
                    self.execute(declaration)?;
                }

                Ok(())
            }

            Stmt::Block(statements) => {
                let env = Rc::new(RefCell::new(Environment::with_enclosing(
                    self.environment.clone(),
                )));

                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body) {
                        Ok(()) => {}

                        // `break` unwinds exactly to the innermost while.
                        Err(Signal::Break) => break,

                        Err(signal) => return Err(signal),
                    }
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = Value::Function(Rc::new(LoxFunction::new(
                    declaration.clone(),
                    self.environment.clone(),
                )));

                if let Some(name) = &declaration.name {
                    self.environment.borrow_mut().define(&name.lexeme, function);
                }

                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                statics,
                methods,
                getters,
                setters,
            } => self.execute_class(name, superclass.as_ref(), statics, methods, getters, setters),

            Stmt::Control { kind, value, .. } => match kind {
                ControlKind::Return => {
                    let result: Value = match value {
                        Some(expr) => self.evaluate(expr)?,
                        None => Value::Nil,
                    };

                    Err(Signal::Return(result))
                }

                ControlKind::Break => Err(Signal::Break),
            },
        }
    }

    /// Run `statements` in `env`, restoring the previous environment on
    /// every exit path, signals included.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Result<(), Signal> {
        let previous: Rc<RefCell<Environment>> = std::mem::replace(&mut self.environment, env);

        let mut result: Result<(), Signal> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        statics: &[Rc<FunctionDecl>],
        methods: &[Rc<FunctionDecl>],
        getters: &[Rc<FunctionDecl>],
        setters: &[Rc<FunctionDecl>],
    ) -> Result<(), Signal> {
        debug!("Declaring class {}", name.lexeme);

        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let token = superclass_token(expr).unwrap_or(name);

                    return Err(Signal::Error(LoxError::runtime(
                        token,
                        "superclass must be a class.",
                    )));
                }
            },

            None => None,
        };

        // The name is defined (as nil) before the members are built so method
        // bodies can refer to the class through the scope machinery.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        // Member closures capture an extra layer binding `super` when a
        // superclass exists.
        let class_env: Rc<RefCell<Environment>> = match &superclass_value {
            Some(class) => {
                let mut env = Environment::with_enclosing(self.environment.clone());
                env.define("super", Value::Class(class.clone()));
                Rc::new(RefCell::new(env))
            }

            None => self.environment.clone(),
        };

        let class = Rc::new(LoxClass::new(
            name.lexeme.clone(),
            superclass_value,
            build_members(statics, &class_env),
            build_members(methods, &class_env),
            build_members(getters, &class_env),
            build_members(setters, &class_env),
        ));

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(class), name.line)?;

        Ok(())
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, Signal> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let value = self.evaluate(right)?;

                Ok(apply_unary(operator, &value)?)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;

                Ok(apply_binary(operator, &left_val, &right_val)?)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                match operator.token_type {
                    TokenType::OR => {
                        if is_truthy(&left_val) {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }

                    _ => {
                        if !is_truthy(&left_val) {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }
                }
            }

            Expr::Variable { id, name } => self.lookup_variable(*id, name),

            Expr::Assign {
                id,
                name,
                operator,
                value,
            } => {
                let mut value = self.evaluate(value)?;

                // `a += b` reads the current value and applies the base
                // operator before storing.
                if let Some(base) = desugared_operator(operator) {
                    let current = self.lookup_variable(*id, name)?;

                    value = apply_binary(&base, &current, &value)?;
                }

                match self.locals.get(id) {
                    Some(distance) => Environment::assign_at(
                        &self.environment,
                        *distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone(), name.line)?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_callable(&callee_val, args, paren)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => instance.get(self, name),

                    Value::Class(class) => match class.find_static(&name.lexeme) {
                        Some(static_member) => Ok(static_member),

                        None => Err(Signal::Error(LoxError::runtime(
                            name,
                            format!("undefined property '{}'.", name.lexeme),
                        ))),
                    },

                    _ => Err(Signal::Error(LoxError::runtime(
                        name,
                        "unexpected property access.",
                    ))),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;

                        instance.set(self, name, value)
                    }

                    _ => Err(Signal::Error(LoxError::runtime(
                        name,
                        "property assignment on a non-instance value.",
                    ))),
                }
            }

            Expr::Subscript {
                object,
                key,
                bracket,
            } => {
                let object = self.evaluate(object)?;
                let key = self.evaluate(key)?;

                match object {
                    Value::Instance(instance) => {
                        let name = subscript_name(&key, bracket);

                        instance.get(self, &name)
                    }

                    _ => Err(Signal::Error(LoxError::runtime(
                        bracket,
                        "subscript on a non-instance value.",
                    ))),
                }
            }

            Expr::SubscriptSet {
                object,
                key,
                bracket,
                value,
            } => {
                let object = self.evaluate(object)?;
                let key = self.evaluate(key)?;

                match object {
                    Value::Instance(instance) => {
                        let name = subscript_name(&key, bracket);
                        let value = self.evaluate(value)?;

                        instance.set(self, &name, value)
                    }

                    _ => Err(Signal::Error(LoxError::runtime(
                        bracket,
                        "subscript on a non-instance value.",
                    ))),
                }
            }

            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Lambda(declaration) => Ok(Value::Function(Rc::new(LoxFunction::new(
                declaration.clone(),
                self.environment.clone(),
            )))),

            Expr::Array { elements, .. } => {
                let mut values: Vec<Value> = Vec::with_capacity(elements.len());

                for element in elements {
                    values.push(self.evaluate(element)?);
                }

                Ok(Value::Instance(builtins::make_array(
                    &self.array_class,
                    values,
                )))
            }
        }
    }

    /// Dispatch a call on any callable value: user function, native, or
    /// class (construction). `site` anchors error reports.
    pub fn call_callable(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        site: &Token,
    ) -> Result<Value, Signal> {
        match callee {
            Value::Function(function) => {
                if args.len() != function.arity() {
                    return Err(Signal::Error(LoxError::runtime(
                        site,
                        format!(
                            "expect {} arguments, but got {}.",
                            function.arity(),
                            args.len()
                        ),
                    )));
                }

                function.call(self, args)
            }

            Value::Native(native) => {
                if !native.is_variadic() && args.len() != native.arity() as usize {
                    return Err(Signal::Error(LoxError::runtime(
                        site,
                        format!("expect {} arguments, but got {}.", native.arity(), args.len()),
                    )));
                }

                native
                    .call(&args)
                    .map_err(|msg| Signal::Error(LoxError::runtime(site, msg)))
            }

            Value::Class(class) => {
                debug!("Instantiating class {}", class.name());

                let instance = LoxInstance::new(class.clone());

                match class.find_initializer(&instance) {
                    Some(initializer) => {
                        self.call_callable(&initializer, args, site)?;
                    }

                    None => {
                        if !args.is_empty() {
                            return Err(Signal::Error(LoxError::runtime(
                                site,
                                format!("expect 0 arguments, but got {}.", args.len()),
                            )));
                        }
                    }
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(Signal::Error(LoxError::runtime(
                site,
                "callee is not callable.",
            ))),
        }
    }

    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token,
        method: &Token,
    ) -> Result<Value, Signal> {
        let distance: usize = match self.locals.get(&id) {
            Some(distance) => *distance,

            None => {
                return Err(Signal::Error(LoxError::runtime(
                    keyword,
                    "cannot use 'super' here.",
                )))
            }
        };

        let superclass = match Environment::get_at(
            &self.environment,
            distance,
            "super",
            keyword.line,
        )? {
            Value::Class(class) => class,

            _ => {
                return Err(Signal::Error(LoxError::runtime(
                    keyword,
                    "superclass must be a class.",
                )))
            }
        };

        // The receiver sits one environment below the `super` layer.
        let this_distance: usize = match distance.checked_sub(1) {
            Some(this_distance) => this_distance,

            None => {
                return Err(Signal::Error(LoxError::runtime(
                    keyword,
                    "cannot use 'super' here.",
                )))
            }
        };

        let receiver = match Environment::get_at(
            &self.environment,
            this_distance,
            "this",
            keyword.line,
        )? {
            Value::Instance(instance) => instance,

            _ => {
                return Err(Signal::Error(LoxError::runtime(
                    keyword,
                    "'super' used outside of a method.",
                )))
            }
        };

        match superclass.find_method(&receiver, &method.lexeme) {
            Some(found) => Ok(found),

            None => Err(Signal::Error(LoxError::runtime(
                method,
                format!("undefined property '{}'.", method.lexeme),
            ))),
        }
    }

    fn lookup_variable(&self, id: ExprId, name: &Token) -> Result<Value, Signal> {
        let value = match self.locals.get(&id) {
            Some(distance) => {
                Environment::get_at(&self.environment, *distance, &name.lexeme, name.line)?
            }

            None => self.globals.borrow().get(&name.lexeme, name.line)?,
        };

        Ok(value)
    }
}

fn build_members(
    declarations: &[Rc<FunctionDecl>],
    env: &Rc<RefCell<Environment>>,
) -> HashMap<String, Value> {
    declarations
        .iter()
        .filter_map(|decl| {
            decl.name.as_ref().map(|name| {
                (
                    name.lexeme.clone(),
                    Value::Function(Rc::new(LoxFunction::new(decl.clone(), env.clone()))),
                )
            })
        })
        .collect()
}

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Nil => Value::Nil,

        LiteralValue::Bool(b) => Value::Bool(*b),

        LiteralValue::Int(n) => Value::Int(*n),

        LiteralValue::Float(n) => Value::Float(*n),

        LiteralValue::String(s) => Value::String(s.clone()),
    }
}

fn superclass_token(expr: &Expr) -> Option<&Token> {
    match expr {
        Expr::Variable { name, .. } => Some(name),

        _ => None,
    }
}

fn subscript_name(key: &Value, bracket: &Token) -> Token {
    Token::new(TokenType::IDENTIFIER, key.to_string(), bracket.line)
}

/// Map a compound assignment operator to the binary operator it expands to.
fn desugared_operator(operator: &Token) -> Option<Token> {
    let (token_type, lexeme) = match operator.token_type {
        TokenType::PLUS_EQUAL => (TokenType::PLUS, "+"),

        TokenType::MINUS_EQUAL => (TokenType::MINUS, "-"),

        TokenType::STAR_EQUAL => (TokenType::STAR, "*"),

        TokenType::SLASH_EQUAL => (TokenType::SLASH, "/"),

        TokenType::PERCENT_EQUAL => (TokenType::PERCENT, "%"),

        _ => return None,
    };

    Some(Token::new(token_type, lexeme.to_string(), operator.line))
}

fn apply_unary(operator: &Token, value: &Value) -> Result<Value, LoxError> {
    match operator.token_type {
        TokenType::MINUS => match value {
            Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),

            Value::Float(n) => Ok(Value::Float(-n)),

            _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
        },

        TokenType::BANG => Ok(Value::Bool(!is_truthy(value))),

        _ => Err(LoxError::runtime(operator, "invalid unary operator.")),
    }
}

/// Evaluate one binary operation. Integer-ness is preserved exactly when
/// both operands are integers; comparisons coerce to floats.
fn apply_binary(operator: &Token, left: &Value, right: &Value) -> Result<Value, LoxError> {
    match operator.token_type {
        TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(left, right))),

        TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(left, right))),

        TokenType::GREATER => {
            let (lval, rval, _) = number_operands(operator, left, right)?;

            Ok(Value::Bool(lval > rval))
        }

        TokenType::GREATER_EQUAL => {
            let (lval, rval, _) = number_operands(operator, left, right)?;

            Ok(Value::Bool(lval >= rval))
        }

        TokenType::LESS => {
            let (lval, rval, _) = number_operands(operator, left, right)?;

            Ok(Value::Bool(lval < rval))
        }

        TokenType::LESS_EQUAL => {
            let (lval, rval, _) = number_operands(operator, left, right)?;

            Ok(Value::Bool(lval <= rval))
        }

        TokenType::PLUS => match (left, right) {
            // String concatenation only works between two strings.
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),

            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),

            _ => {
                let (lval, rval, _) = number_operands(operator, left, right)?;

                Ok(Value::Float(lval + rval))
            }
        },

        TokenType::MINUS => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),

            _ => {
                let (lval, rval, _) = number_operands(operator, left, right)?;

                Ok(Value::Float(lval - rval))
            }
        },

        TokenType::STAR => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),

            _ => {
                let (lval, rval, _) = number_operands(operator, left, right)?;

                Ok(Value::Float(lval * rval))
            }
        },

        TokenType::SLASH => match (left, right) {
            // Integer division truncates toward zero and rejects a zero
            // divisor; float division follows IEEE-754.
            (Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    Err(LoxError::runtime(operator, "division by zero."))
                } else {
                    Ok(Value::Int(a.wrapping_div(*b)))
                }
            }

            _ => {
                let (lval, rval, _) = number_operands(operator, left, right)?;

                Ok(Value::Float(lval / rval))
            }
        },

        TokenType::PERCENT => match (left, right) {
            (Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    Err(LoxError::runtime(operator, "division by zero."))
                } else {
                    Ok(Value::Int(a.wrapping_rem(*b)))
                }
            }

            _ => Err(LoxError::runtime(
                operator,
                "both operands must be integers.",
            )),
        },

        _ => Err(LoxError::runtime(operator, "invalid binary operator.")),
    }
}

/// Coerce one operand to a float, reporting whether it was an integer.
fn number_operand(operator: &Token, value: &Value) -> Result<(f64, bool), LoxError> {
    match value {
        Value::Int(n) => Ok((*n as f64, true)),

        Value::Float(n) => Ok((*n, false)),

        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
    }
}

/// Coerce both operands to floats; the flag is true when both were integers.
fn number_operands(
    operator: &Token,
    left: &Value,
    right: &Value,
) -> Result<(f64, f64, bool), LoxError> {
    let (lval, l_int) = number_operand(operator, left)?;
    let (rval, r_int) = number_operand(operator, right)?;

    Ok((lval, rval, l_int && r_int))
}
