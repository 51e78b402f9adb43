//! Contact (resource) model.
//!
//! Contacts are the entities that perform work. Each contact may report to
//! a supervisor (forming a forest of reporting chains) and may carry an
//! explicitly assigned time-block template; without one, the collection's
//! default template applies.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::task::compact_name;

/// Index of a contact in the directory's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactId(pub usize);

/// A resource that can be allocated calendar time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Display name as given.
    pub name: String,
    /// Compacted comparison key derived from the name.
    pub ident: String,
    /// Contact address (e-mail or similar).
    pub address: String,
    /// Name of the assigned time-block template. `None` = use the
    /// collection default.
    pub time_block: Option<String>,
    /// Supervisor, if any. The relation must stay acyclic.
    pub supervisor: Option<ContactId>,
    /// Free-form properties.
    pub attributes: HashMap<String, String>,
}

impl Contact {
    /// Creates a contact with the given display name and address.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        let name = name.into();
        let ident = compact_name(&name);
        Self {
            name,
            ident,
            address: address.into(),
            time_block: None,
            supervisor: None,
            attributes: HashMap::new(),
        }
    }

    /// Assigns a time-block template by name.
    pub fn with_time_block(mut self, block_name: impl Into<String>) -> Self {
        self.time_block = Some(block_name.into());
        self
    }

    /// Adds a free-form property.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_builder() {
        let c = Contact::new("Dana Miller", "dana@example.com")
            .with_time_block("Office Hours")
            .with_attribute("role", "engineer");

        assert_eq!(c.ident, "danamiller");
        assert_eq!(c.address, "dana@example.com");
        assert_eq!(c.time_block.as_deref(), Some("Office Hours"));
        assert!(c.supervisor.is_none());
    }
}
