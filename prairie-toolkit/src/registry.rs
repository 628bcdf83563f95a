//! Toolkit — the named-function registry field rules dispatch into.
//!
//! A registry maps function names to single-argument functions over JSON values.
//! Engines receive one explicitly, so a deliberately incomplete registry is all it
//! takes to exercise unknown-function handling.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::functions;

/// A toolkit function: one JSON argument in, one JSON value (or an error) out.
pub type ToolkitFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Registry of named toolkit functions.
#[derive(Clone, Default)]
pub struct Toolkit {
    functions: HashMap<String, ToolkitFn>,
}

impl Toolkit {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// A registry holding the default function set.
    ///
    /// ```rust
    /// use prairie_toolkit::Toolkit;
    /// use serde_json::json;
    ///
    /// let toolkit = Toolkit::with_defaults();
    /// let out = toolkit.call("toUpper", &json!("tree")).unwrap().unwrap();
    /// assert_eq!(out, json!("TREE"));
    /// ```
    pub fn with_defaults() -> Self {
        let mut toolkit = Self::new();
        functions::register_defaults(&mut toolkit);
        debug!(functions = toolkit.len(), "default toolkit built");
        toolkit
    }

    /// Add a function, builder style. Replaces any function with the same name.
    pub fn register<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.insert(name, f);
        self
    }

    /// Add a function in place. Returns the function it replaced, if any.
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F) -> Option<ToolkitFn>
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f))
    }

    /// Remove a function by name.
    pub fn remove(&mut self, name: &str) -> Option<ToolkitFn> {
        self.functions.remove(name)
    }

    /// Look up a function by name.
    pub fn get(&self, name: &str) -> Option<&ToolkitFn> {
        self.functions.get(name)
    }

    /// Whether a function with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Call a function by name. `None` when no such function exists.
    pub fn call(&self, name: &str, argument: &Value) -> Option<Result<Value>> {
        self.get(name).map(|f| f(argument))
    }

    /// Registered function names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolkit")
            .field("functions", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolkitError;
    use serde_json::json;

    #[test]
    fn test_empty_registry() {
        let toolkit = Toolkit::new();
        assert!(toolkit.is_empty());
        assert!(!toolkit.contains("toUpper"));
        assert!(toolkit.call("toUpper", &json!("x")).is_none());
    }

    #[test]
    fn test_register_and_call() {
        let toolkit = Toolkit::new().register("double", |v: &Value| {
            v.as_i64()
                .map(|n| json!(n * 2))
                .ok_or_else(|| ToolkitError::invalid_argument("double", "an integer", v))
        });
        assert_eq!(toolkit.call("double", &json!(21)).unwrap().unwrap(), json!(42));
        assert!(toolkit.call("double", &json!("x")).unwrap().is_err());
    }

    #[test]
    fn test_insert_replaces_and_remove() {
        let mut toolkit = Toolkit::new();
        assert!(toolkit.insert("f", |_: &Value| Ok(json!(1))).is_none());
        assert!(toolkit.insert("f", |_: &Value| Ok(json!(2))).is_some());
        assert_eq!(toolkit.call("f", &json!(null)).unwrap().unwrap(), json!(2));
        assert!(toolkit.remove("f").is_some());
        assert!(!toolkit.contains("f"));
    }

    #[test]
    fn test_defaults_include_engine_specials() {
        let toolkit = Toolkit::with_defaults();
        for name in ["token_replace", "join", "dirname", "dir_i", "toUpper", "first"] {
            assert!(toolkit.contains(name), "missing {name}");
        }
        let names = toolkit.names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_debug_lists_names() {
        let toolkit = Toolkit::new().register("a", |v: &Value| Ok(v.clone()));
        assert!(format!("{toolkit:?}").contains("\"a\""));
    }
}
