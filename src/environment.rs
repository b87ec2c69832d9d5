use super::value::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Identifier bindings. Clones share the same underlying map, which is how a
/// local function call sees and mutates its caller's bindings.
#[derive(Clone, Debug)]
pub struct Environment {
    values: Rc<RefCell<BTreeMap<String, Value>>>,
}

impl Environment {
    /// A fresh environment holding the predefined constants.
    pub fn new() -> Environment {
        let environment = Environment::empty();
        environment.define("$NULL", Value::Null);
        environment.define("$TRUE", Value::Boolean(true));
        environment.define("$FALSE", Value::Boolean(false));
        environment.define("$ARRAY", Value::Array(Vec::new()));
        environment
    }
    pub fn empty() -> Environment {
        Environment {
            values: Rc::new(RefCell::new(BTreeMap::new())),
        }
    }
    pub fn define(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }
    pub fn contains(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
    pub fn equals(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
