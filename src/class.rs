use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::Ident;
use crate::callable::Callable;
use crate::error::{Result, ScriptError};
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Name of the method that runs when a class is called.
pub const CONSTRUCTOR: &str = "constructor";

pub struct Class {
    pub name: String,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(name: String, methods: HashMap<String, Rc<Function>>) -> Self {
        Class { name, methods }
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        self.methods.get(name).cloned()
    }

    /// Constructor arity, or 0 for a class without one.
    pub fn arity(&self) -> usize {
        self.find_method(CONSTRUCTOR)
            .map(|constructor| constructor.arity())
            .unwrap_or(0)
    }

    /// Create an instance and run the bound constructor on it, if any.
    pub fn instantiate(
        class: &Rc<Class>,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance = Rc::new(Instance::new(Rc::clone(class)));

        if let Some(constructor) = class.find_method(CONSTRUCTOR) {
            constructor
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name)
    }
}

/// An object created by calling a class. Fields live on the instance;
/// methods are looked up on the class.
pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    /// Fields shadow methods. A method comes back bound to this instance.
    pub fn get(self: &Rc<Self>, name: &Ident) -> Result<Value> {
        if let Some(value) = self.fields.borrow().get(&name.name) {
            return Ok(value.clone());
        }

        if let Some(method) = self.class.find_method(&name.name) {
            let bound = method.bind(Rc::clone(self));
            return Ok(Value::Callable(Callable::Function(Rc::new(bound))));
        }

        Err(ScriptError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.name),
        ))
    }

    pub fn set(&self, name: &Ident, value: Value) {
        self.fields.borrow_mut().insert(name.name.clone(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.class.name)
    }
}
