use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::environment::Environment;
use crate::instance::LoxInstance;
use crate::interpreter::{Interpreter, Signal};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// A user-defined function: its declaration plus the environment captured at
/// the point the function value was created.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        LoxFunction {
            declaration,
            closure,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn name(&self) -> &str {
        match &self.declaration.name {
            Some(token) => &token.lexeme,
            None => "lambda",
        }
    }

    /// Produce a copy whose closure has one extra layer defining `this`.
    /// Methods, getters and setters capture their receiver this way.
    pub fn bind(&self, instance: &Rc<LoxInstance>) -> LoxFunction {
        let mut env = Environment::with_enclosing(self.closure.clone());
        env.define("this", Value::Instance(instance.clone()));

        LoxFunction::new(self.declaration.clone(), Rc::new(RefCell::new(env)))
    }

    /// Execute the body in a fresh environment chained to the closure.
    /// A `Return` signal carries the result; falling off the end yields nil.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, Signal> {
        debug!("Calling <fn {}> with {} args", self.name(), arguments.len());

        let mut env = Environment::with_enclosing(self.closure.clone());

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            env.define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, Rc::new(RefCell::new(env))) {
            Ok(()) => Ok(Value::Nil),

            Err(Signal::Return(value)) => Ok(value),

            Err(signal) => Err(signal),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The closure is omitted: environments and functions form cycles.
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish()
    }
}

/// Signature of a native implementation. The receiver is present when the
/// function was bound to an instance via property lookup.
pub type NativeFn =
    fn(receiver: Option<&Rc<LoxInstance>>, args: &[Value]) -> Result<Value, String>;

/// A function implemented in the host language. Shares the callable
/// contract with [`LoxFunction`]: arity (−1 means variadic), call, bind.
pub struct BuiltinFunction {
    name: &'static str,
    arity: i32,
    func: NativeFn,
    receiver: Option<Rc<LoxInstance>>,
}

impl BuiltinFunction {
    pub fn new(name: &'static str, arity: i32, func: NativeFn) -> Self {
        BuiltinFunction {
            name,
            arity,
            func,
            receiver: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> i32 {
        self.arity
    }

    pub fn is_variadic(&self) -> bool {
        self.arity < 0
    }

    /// Record the receiver for use inside the native action.
    pub fn bind(&self, instance: &Rc<LoxInstance>) -> BuiltinFunction {
        BuiltinFunction {
            name: self.name,
            arity: self.arity,
            func: self.func,
            receiver: Some(instance.clone()),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        debug!("Calling <native fn {}> with {} args", self.name, args.len());

        (self.func)(self.receiver.as_ref(), args)
    }
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}
