use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::class::LoxClass;
use crate::error::LoxError;
use crate::interpreter::{Interpreter, Signal};
use crate::token::Token;
use crate::value::Value;

/// An object: a class pointer plus a mutable property map. The Array class
/// keeps its elements in the reserved `list` property.
pub struct LoxInstance {
    class: Rc<LoxClass>,
    props: RefCell<HashMap<String, Value>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Rc<LoxInstance> {
        Rc::new(LoxInstance {
            class,
            props: RefCell::new(HashMap::new()),
        })
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Raw property read, no method or getter fallback.
    pub fn prop(&self, name: &str) -> Option<Value> {
        self.props.borrow().get(name).cloned()
    }

    /// Raw property write, bypassing setters. Used by native methods.
    pub fn set_prop(&self, name: &str, value: Value) {
        self.props.borrow_mut().insert(name.to_string(), value);
    }

    /// Property access order: own property, then bound method, then bound
    /// getter (invoked immediately with zero arguments). Method and getter
    /// lookup walk the superclass chain.
    pub fn get(
        self: &Rc<Self>,
        interpreter: &mut Interpreter,
        name: &Token,
    ) -> Result<Value, Signal> {
        let existing: Option<Value> = self.prop(&name.lexeme);
        if let Some(value) = existing {
            return Ok(value);
        }

        if let Some(method) = self.class.find_method(self, &name.lexeme) {
            return Ok(method);
        }

        if let Some(getter) = self.class.find_getter(self, &name.lexeme) {
            return interpreter.call_callable(&getter, Vec::new(), name);
        }

        Err(Signal::Error(LoxError::runtime(
            name,
            format!("undefined property '{}'.", name.lexeme),
        )))
    }

    /// Property assignment: a setter anywhere on the superclass chain wins,
    /// otherwise the value lands in the property map.
    pub fn set(
        self: &Rc<Self>,
        interpreter: &mut Interpreter,
        name: &Token,
        value: Value,
    ) -> Result<Value, Signal> {
        if let Some(setter) = self.class.find_setter(self, &name.lexeme) {
            interpreter.call_callable(&setter, vec![value.clone()], name)?;
            return Ok(value);
        }

        self.set_prop(&name.lexeme, value.clone());
        Ok(value)
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxInstance")
            .field("class", &self.class.name())
            .finish()
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Arrays display their elements rather than the generic form.
        if self.class.name() == "Array" {
            if let Some(list @ Value::List(_)) = self.prop("list") {
                return write!(f, "{}", list);
            }
        }

        write!(f, "{} instance", self.class.name())
    }
}
