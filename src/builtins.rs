//! Native functions and classes pre-installed in the global environment.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use crate::class::LoxClass;
use crate::environment::Environment;
use crate::function::BuiltinFunction;
use crate::instance::LoxInstance;
use crate::value::Value;

/// Install `Array` and the native functions into `globals`. Returns the
/// Array class so array literals can construct instances directly.
pub fn install(globals: &Rc<RefCell<Environment>>) -> Rc<LoxClass> {
    info!("Installing built-in globals");

    let array: Rc<LoxClass> = array_class();

    globals
        .borrow_mut()
        .define("Array", Value::Class(array.clone()));

    globals.borrow_mut().define(
        "clock",
        Value::Native(Rc::new(BuiltinFunction::new("clock", 0, clock_native))),
    );

    array
}

/// Build an Array instance around already-evaluated elements, as array
/// literal syntax does.
pub fn make_array(class: &Rc<LoxClass>, elements: Vec<Value>) -> Rc<LoxInstance> {
    let instance = LoxInstance::new(class.clone());
    instance.set_prop("list", Value::List(Rc::new(RefCell::new(elements))));
    instance
}

fn array_class() -> Rc<LoxClass> {
    let mut statics: HashMap<String, Value> = HashMap::new();
    let mut methods: HashMap<String, Value> = HashMap::new();
    let mut getters: HashMap<String, Value> = HashMap::new();

    statics.insert(
        "isArray".to_string(),
        Value::Native(Rc::new(BuiltinFunction::new("isArray", 1, array_is_array))),
    );

    // Arity -1: the constructor accepts any number of elements.
    methods.insert(
        "init".to_string(),
        Value::Native(Rc::new(BuiltinFunction::new("init", -1, array_init))),
    );

    methods.insert(
        "append".to_string(),
        Value::Native(Rc::new(BuiltinFunction::new("append", 1, array_append))),
    );

    methods.insert(
        "pop".to_string(),
        Value::Native(Rc::new(BuiltinFunction::new("pop", 0, array_pop))),
    );

    getters.insert(
        "length".to_string(),
        Value::Native(Rc::new(BuiltinFunction::new("length", 0, array_length))),
    );

    Rc::new(LoxClass::new(
        "Array".to_string(),
        None,
        statics,
        methods,
        getters,
        HashMap::new(),
    ))
}

/// The receiver's backing vector. Every Array method needs it.
fn receiver_list(
    receiver: Option<&Rc<LoxInstance>>,
) -> Result<Rc<RefCell<Vec<Value>>>, String> {
    let instance = receiver.ok_or_else(|| "array method called without a receiver.".to_string())?;

    match instance.prop("list") {
        Some(Value::List(list)) => Ok(list),

        _ => Err("array storage is missing.".to_string()),
    }
}

fn array_init(receiver: Option<&Rc<LoxInstance>>, args: &[Value]) -> Result<Value, String> {
    let instance = receiver.ok_or_else(|| "array method called without a receiver.".to_string())?;

    instance.set_prop("list", Value::List(Rc::new(RefCell::new(args.to_vec()))));

    Ok(Value::Instance(instance.clone()))
}

fn array_append(receiver: Option<&Rc<LoxInstance>>, args: &[Value]) -> Result<Value, String> {
    let list = receiver_list(receiver)?;

    list.borrow_mut().push(args[0].clone());

    Ok(args[0].clone())
}

fn array_pop(receiver: Option<&Rc<LoxInstance>>, _args: &[Value]) -> Result<Value, String> {
    let list = receiver_list(receiver)?;

    let popped = list.borrow_mut().pop();

    popped.ok_or_else(|| "pop from an empty array.".to_string())
}

fn array_length(receiver: Option<&Rc<LoxInstance>>, _args: &[Value]) -> Result<Value, String> {
    let list = receiver_list(receiver)?;

    let length = list.borrow().len();

    Ok(Value::Int(length as i64))
}

fn array_is_array(_receiver: Option<&Rc<LoxInstance>>, args: &[Value]) -> Result<Value, String> {
    let is_array = match &args[0] {
        Value::Instance(instance) => instance.class().name() == "Array",

        _ => false,
    };

    Ok(Value::Bool(is_array))
}

fn clock_native(_receiver: Option<&Rc<LoxInstance>>, _args: &[Value]) -> Result<Value, String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Float(timestamp))
}
