//! Variable scope shared by the activities of one process instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::Vars;

/// Capability the runtime needs from the process variables:
/// read a variable, merge activity outputs back in.
///
/// A scope is owned by its process instance. Cloning it is a deep copy, so a
/// forked process never observes writes made by the original.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableScope {
    /// process variables
    variables: Vars,
    /// process environment, read-only after start
    #[serde(default)]
    env: HashMap<String, String>,
}

impl VariableScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variables(variables: Vars) -> Self {
        Self {
            variables,
            env: HashMap::new(),
        }
    }

    pub fn set_env(
        &mut self,
        env: HashMap<String, String>,
    ) {
        self.env = env;
    }

    pub fn env(
        &self,
        name: &str,
    ) -> Option<&String> {
        self.env.get(name)
    }

    /// Read a top-level variable.
    pub fn read(
        &self,
        name: &str,
    ) -> Option<&Value> {
        self.variables.get_value(name)
    }

    /// Resolve a dotted path such as `order.customer.name`.
    /// Numeric segments index into arrays.
    pub fn lookup(
        &self,
        path: &str,
    ) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.read(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn set<T: Serialize>(
        &mut self,
        name: &str,
        value: T,
    ) {
        self.variables.set(name, value);
    }

    /// Merge activity outputs into the scope; last writer wins.
    pub fn merge(
        &mut self,
        outputs: &Vars,
    ) {
        self.variables.extend(outputs);
    }

    pub fn variables(&self) -> &Vars {
        &self.variables
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_lookup_nested_path() {
        let scope = VariableScope::with_variables(Vars::from(json!({
            "order": {"items": [{"sku": "a1"}, {"sku": "b2"}], "total": 42}
        })));
        assert_eq!(scope.lookup("order.total"), Some(&json!(42)));
        assert_eq!(scope.lookup("order.items.1.sku"), Some(&json!("b2")));
        assert_eq!(scope.lookup("order.missing"), None);
        assert_eq!(scope.lookup("missing"), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = VariableScope::new();
        original.set("x", 1);
        let mut copy = original.clone();
        copy.merge(&Vars::new().with("x", 2).with("y", 3));
        assert_eq!(original.read("x"), Some(&json!(1)));
        assert_eq!(original.read("y"), None);
        assert_eq!(copy.read("x"), Some(&json!(2)));
    }
}
