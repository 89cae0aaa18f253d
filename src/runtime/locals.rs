//! Lookup of named values supplied at render time

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde_json::Value;

/// Source of local values for a render.
///
/// The caller owns the data; the evaluator only borrows it for the duration
/// of a single render.
pub trait Locals {
    fn lookup(&self, name: &str) -> Option<&Value>;
}

/// Locals with no bindings
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLocals;

impl Locals for EmptyLocals {
    fn lookup(&self, _name: &str) -> Option<&Value> {
        None
    }
}

impl<S: BuildHasher> Locals for HashMap<String, Value, S> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Locals for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Locals for serde_json::Map<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// Only objects bind names; any other value behaves like [`EmptyLocals`]
impl Locals for Value {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(name))
    }
}

impl<T: Locals + ?Sized> Locals for &T {
    fn lookup(&self, name: &str) -> Option<&Value> {
        (**self).lookup(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_value_lookup() {
        let locals = json!({"name": "World"});
        assert_eq!(locals.lookup("name"), Some(&json!("World")));
        assert_eq!(locals.lookup("missing"), None);
        assert_eq!(json!([1, 2]).lookup("name"), None);
    }

    #[test]
    fn test_map_lookup() {
        let mut locals = HashMap::new();
        locals.insert("a".to_string(), json!(1));
        assert_eq!(locals.lookup("a"), Some(&json!(1)));
        assert_eq!(EmptyLocals.lookup("a"), None);
    }
}
