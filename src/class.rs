use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::instance::LoxInstance;
use crate::value::Value;

/// Runtime representation of a class. Each member map holds callables
/// ([`Value::Function`] or [`Value::Native`]) keyed by member name.
pub struct LoxClass {
    name: String,
    superclass: Option<Rc<LoxClass>>,
    statics: HashMap<String, Value>,
    methods: HashMap<String, Value>,
    getters: HashMap<String, Value>,
    setters: HashMap<String, Value>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        statics: HashMap<String, Value>,
        methods: HashMap<String, Value>,
        getters: HashMap<String, Value>,
        setters: HashMap<String, Value>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            statics,
            methods,
            getters,
            setters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Find a method on this class or its superclass chain, bound to
    /// `instance`.
    pub fn find_method(&self, instance: &Rc<LoxInstance>, name: &str) -> Option<Value> {
        self.find_bound(|class| &class.methods, instance, name)
    }

    /// Find a getter on this class or its superclass chain, bound to
    /// `instance`. The caller is responsible for invoking it.
    pub fn find_getter(&self, instance: &Rc<LoxInstance>, name: &str) -> Option<Value> {
        self.find_bound(|class| &class.getters, instance, name)
    }

    /// Find a setter on this class or its superclass chain, bound to
    /// `instance`.
    pub fn find_setter(&self, instance: &Rc<LoxInstance>, name: &str) -> Option<Value> {
        self.find_bound(|class| &class.setters, instance, name)
    }

    /// Statics live on the class itself; the superclass chain is never
    /// consulted, and no receiver is bound.
    pub fn find_static(&self, name: &str) -> Option<Value> {
        self.statics.get(name).cloned()
    }

    /// The `init` method, if declared, bound to `instance`.
    pub fn find_initializer(&self, instance: &Rc<LoxInstance>) -> Option<Value> {
        self.find_method(instance, "init")
    }

    fn find_bound(
        &self,
        select: fn(&LoxClass) -> &HashMap<String, Value>,
        instance: &Rc<LoxInstance>,
        name: &str,
    ) -> Option<Value> {
        if let Some(member) = select(self).get(name) {
            return Some(bind_callable(member, instance));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_bound(select, instance, name))
    }
}

fn bind_callable(member: &Value, instance: &Rc<LoxInstance>) -> Value {
    match member {
        Value::Function(function) => Value::Function(Rc::new(function.bind(instance))),

        Value::Native(native) => Value::Native(Rc::new(native.bind(instance))),

        // Member maps only ever hold callables.
        other => other.clone(),
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxClass").field("name", &self.name).finish()
    }
}

impl fmt::Display for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
