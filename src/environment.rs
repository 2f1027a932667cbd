use crate::error::{Result, ScriptError};
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope. Closures keep their defining scope alive through
/// one of these.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: a mutable name→value map plus an optional parent.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Defining '{}'", name);
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(ScriptError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Overwrite the nearest existing binding. Never creates one.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(ScriptError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Read `name` exactly `distance` scopes out from `env`.
    ///
    /// The resolver guarantees the binding exists there.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Value {
        let scope = Self::ancestor(env, distance);
        let value = scope.borrow().values.get(name).cloned();
        value.unwrap_or_else(|| {
            panic!(
                "resolved name '{}' missing at distance {}",
                name, distance
            )
        })
    }

    /// Write `name` exactly `distance` scopes out from `env`.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) {
        let scope = Self::ancestor(env, distance);
        scope.borrow_mut().values.insert(name.to_string(), value);
    }

    fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut scope: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let parent: EnvRef = scope
                .borrow()
                .enclosing
                .clone()
                .expect("resolved scope distance exceeds environment depth");
            scope = parent;
        }

        scope
    }
}
