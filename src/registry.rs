//! Open/extensible symbol registries.
//!
//! Task types and statuses are runtime-registered sets of named symbolic
//! values with one designated default each, not compiled enumerations.
//! Callers register values at session start and may extend the set at any
//! time. A registry maps compacted names to stable [`SymbolId`]s.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ScheduleError;
use crate::models::compact_name;

/// Index of a registered symbolic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub usize);

/// A runtime-registered, open set of named values with a designated default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRegistry {
    /// What this registry holds ("task type", "task status"); used in
    /// error messages.
    kind: String,
    names: Vec<String>,
    index: HashMap<String, SymbolId>,
    default: Option<SymbolId>,
}

impl SymbolRegistry {
    /// Creates an empty registry for the given kind of value.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            names: Vec::new(),
            index: HashMap::new(),
            default: None,
        }
    }

    /// Registers a value, returning its id. Re-registering an existing
    /// name (compared by compacted form) returns the existing id.
    pub fn register(&mut self, name: impl Into<String>) -> SymbolId {
        let name = name.into();
        let key = compact_name(&name);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = SymbolId(self.names.len());
        self.names.push(name);
        self.index.insert(key, id);
        id
    }

    /// Registers a value and designates it the default.
    pub fn register_default(&mut self, name: impl Into<String>) -> SymbolId {
        let id = self.register(name);
        self.default = Some(id);
        id
    }

    /// The designated default value, if one was set.
    pub fn default_value(&self) -> Option<SymbolId> {
        self.default
    }

    /// Looks up a registered value by name.
    ///
    /// Fails with `UnknownEnumValue` if the name is not registered.
    /// Unregistered names are surfaced immediately, never silently
    /// defaulted.
    pub fn resolve(&self, name: &str) -> Result<SymbolId, ScheduleError> {
        self.index
            .get(&compact_name(name))
            .copied()
            .ok_or_else(|| ScheduleError::UnknownEnumValue {
                registry: self.kind.clone(),
                name: name.to_string(),
            })
    }

    /// Resolves a possibly-empty name: empty means the designated default.
    pub fn resolve_or_default(&self, name: &str) -> Result<SymbolId, ScheduleError> {
        if name.is_empty() {
            self.default.ok_or_else(|| {
                ScheduleError::configuration(format!("no default {} registered", self.kind))
            })
        } else {
            self.resolve(name)
        }
    }

    /// The display name of a registered value.
    pub fn name(&self, id: SymbolId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    /// Number of registered values.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
