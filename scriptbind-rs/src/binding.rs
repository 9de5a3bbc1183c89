//! The shared variable store handed to every evaluation.
//!
//! A [`Binding`] is a single flat namespace.  The host creates it, seeds it,
//! lends it (`&mut`) to one evaluation after another, and reads the results
//! back out.  Nested evaluations receive the very same instance, so a name
//! written at any depth is visible everywhere else; collisions resolve by
//! last write.
//!
//! There is no internal locking.  `Binding` is `Send + Sync`, so a caller that
//! shares one instance between threads wraps it in a `Mutex` (or similar) and
//! serialises the evaluations itself.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::UndefinedVariable;
use crate::script::Value;

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid")
});

/// Returns `true` if `name` is a script identifier.
///
/// [`Binding::set`] accepts any name; this check is for hosts that take
/// names from untrusted input (e.g. the command line).
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Named-variable environment shared between a host and its scripts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    vars: HashMap<String, Value>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        tracing::trace!(%name, "binding set");
        self.vars.insert(name, value.into());
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Result<&Value, UndefinedVariable> {
        self.vars
            .get(name)
            .ok_or_else(|| UndefinedVariable::new(name))
    }

    /// Returns `true` if the variable is set.
    pub fn has(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Remove a variable, returning its last value.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    /// Names currently set, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Copy of the current contents as a map value with sorted keys.
    pub fn snapshot(&self) -> Value {
        let entries: BTreeMap<String, Value> = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Map(entries)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Binding {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut binding = Binding::new();
        binding.extend(iter);
        binding
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Binding {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
