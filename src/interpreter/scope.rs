use std::collections::HashMap;

use crate::value::{Scalar, Value};

/// One variable namespace: the globals, or a function call's frame
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.vars.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Scalar value of `name`; unset names and arrays read as empty
    pub fn scalar(&self, name: &str) -> Scalar {
        match self.vars.get(name) {
            Some(Value::Scalar(s)) => s.clone(),
            _ => Scalar::empty(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn set_scalar(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.vars.insert(name.into(), Value::Scalar(value.into()));
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
