//! Contact directory.
//!
//! Registry of resources with a supervisor relation (a forest of reporting
//! chains) and per-contact calendar-template assignment. Resolution by
//! partial name works over the compacted identifier space: a fragment must
//! match exactly one contact, with ambiguity and absence reported as
//! distinct errors rather than defaulting to nothing.
//!
//! Iteration order is insertion order; the allocation engine relies on it
//! as the first-come/first-served tie-break.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ScheduleError;
use crate::models::{compact_name, Contact, ContactId, TimeBlock};

/// The registry of contacts (resources).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactDirectory {
    contacts: Vec<Contact>,
    index: HashMap<String, ContactId>,
}

impl ContactDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a contact. Fails if another contact compacts to the same
    /// identifier.
    pub fn add(&mut self, contact: Contact) -> Result<ContactId, ScheduleError> {
        if self.index.contains_key(&contact.ident) {
            return Err(ScheduleError::configuration(format!(
                "contact '{}' is already registered",
                contact.ident
            )));
        }
        let id = ContactId(self.contacts.len());
        self.index.insert(contact.ident.clone(), id);
        self.contacts.push(contact);
        Ok(id)
    }

    /// The contact for an id.
    pub fn get(&self, id: ContactId) -> &Contact {
        &self.contacts[id.0]
    }

    fn get_mut(&mut self, id: ContactId) -> &mut Contact {
        &mut self.contacts[id.0]
    }

    /// Number of registered contacts.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// All contacts, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ContactId, &Contact)> {
        self.contacts
            .iter()
            .enumerate()
            .map(|(i, c)| (ContactId(i), c))
    }

    /// All contact ids, in insertion order.
    pub fn ids(&self) -> Vec<ContactId> {
        (0..self.contacts.len()).map(ContactId).collect()
    }

    /// Resolves a name fragment to exactly one contact.
    ///
    /// The fragment is compacted and matched as a substring of each
    /// contact's compacted identifier. Exactly one contact must match:
    /// more than one is `AmbiguousMatch` even when the fragment equals
    /// one contact's full identifier, none is `NotFound`.
    pub fn resolve(&self, fragment: &str) -> Result<ContactId, ScheduleError> {
        let needle = compact_name(fragment);
        let mut matches = self
            .iter()
            .filter(|(_, c)| c.ident.contains(needle.as_str()));

        match (matches.next(), matches.next()) {
            (Some((id, _)), None) => Ok(id),
            (Some((_, first)), Some((_, second))) => Err(ScheduleError::AmbiguousMatch {
                fragment: fragment.to_string(),
                first: first.name.clone(),
                second: second.name.clone(),
            }),
            (None, _) => Err(ScheduleError::NotFound {
                fragment: fragment.to_string(),
            }),
        }
    }

    /// Assigns a time-block template to a contact resolved by fragment.
    pub fn assign_time_block(
        &mut self,
        fragment: &str,
        block_name: impl Into<String>,
    ) -> Result<(), ScheduleError> {
        let id = self.resolve(fragment)?;
        self.get_mut(id).time_block = Some(block_name.into());
        Ok(())
    }

    /// Sets a supervisor relation, both sides resolved by fragment.
    ///
    /// Rejects self-assignment and any assignment that would close a cycle
    /// in the reporting chain.
    pub fn set_supervisor(
        &mut self,
        report_fragment: &str,
        supervisor_fragment: &str,
    ) -> Result<(), ScheduleError> {
        let report = self.resolve(report_fragment)?;
        let supervisor = self.resolve(supervisor_fragment)?;

        if report == supervisor {
            return Err(ScheduleError::configuration(format!(
                "contact '{}' cannot supervise itself",
                self.get(report).ident
            )));
        }

        // Walking up from the proposed supervisor must not reach the report.
        let mut cursor = Some(supervisor);
        while let Some(id) = cursor {
            if id == report {
                return Err(ScheduleError::configuration(format!(
                    "supervisor cycle: '{}' already reports to '{}'",
                    self.get(supervisor).ident,
                    self.get(report).ident
                )));
            }
            cursor = self.get(id).supervisor;
        }

        self.get_mut(report).supervisor = Some(supervisor);
        Ok(())
    }

    /// The reporting chain above a contact, nearest supervisor first.
    pub fn supervisor_chain(&self, id: ContactId) -> Vec<ContactId> {
        let mut chain = Vec::new();
        let mut cursor = self.get(id).supervisor;
        while let Some(sup) = cursor {
            chain.push(sup);
            cursor = self.get(sup).supervisor;
        }
        chain
    }

    /// Resolves a contact's effective time-block template.
    ///
    /// The explicitly assigned template if present, else the template in
    /// `blocks` carrying the default flag, else a configuration error.
    /// A contact with no usable calendar cannot be allocated.
    pub fn effective_block<'a>(
        &self,
        id: ContactId,
        blocks: &'a [TimeBlock],
    ) -> Result<&'a TimeBlock, ScheduleError> {
        let contact = self.get(id);
        if let Some(name) = &contact.time_block {
            let key = compact_name(name);
            return blocks
                .iter()
                .find(|b| compact_name(&b.name) == key)
                .ok_or_else(|| {
                    ScheduleError::configuration(format!(
                        "contact '{}' references unknown time block '{}'",
                        contact.ident, name
                    ))
                });
        }
        blocks.iter().find(|b| b.is_default()).ok_or_else(|| {
            ScheduleError::configuration(format!(
                "no usable calendar for contact '{}': nothing assigned and no default time block",
                contact.ident
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Recurrence, TimeBlock};
    use chrono::NaiveTime;

    fn directory() -> ContactDirectory {
        let mut dir = ContactDirectory::new();
        dir.add(Contact::new("Dana Miller", "dana@example.com")).unwrap();
        dir.add(Contact::new("Omar Haddad", "omar@example.com")).unwrap();
        dir.add(Contact::new("Priya Nair", "priya@example.com")).unwrap();
        dir
    }

    #[test]
    fn test_duplicate_ident_rejected() {
        let mut dir = directory();
        let err = dir.add(Contact::new("dana miller", "other@example.com"));
        assert!(matches!(err, Err(ScheduleError::Configuration { .. })));
    }

    #[test]
    fn test_resolve_unique_fragment() {
        let dir = directory();
        let id = dir.resolve("omar").unwrap();
        assert_eq!(dir.get(id).name, "Omar Haddad");

        // Fragments span the compacted form, whitespace ignored.
        let id = dir.resolve("a mill").unwrap();
        assert_eq!(dir.get(id).name, "Dana Miller");
    }

    #[test]
    fn test_resolve_ambiguous_and_missing() {
        let dir = directory();
        // "a" appears in all three compacted names.
        match dir.resolve("a") {
            Err(ScheduleError::AmbiguousMatch { first, second, .. }) => {
                assert_eq!(first, "Dana Miller");
                assert_eq!(second, "Omar Haddad");
            }
            other => panic!("expected AmbiguousMatch, got {other:?}"),
        }

        assert!(matches!(
            dir.resolve("zz"),
            Err(ScheduleError::NotFound { .. })
        ));
    }

    #[test]
    fn test_full_ident_fragment_can_still_be_ambiguous() {
        let mut dir = ContactDirectory::new();
        dir.add(Contact::new("Dan", "dan@example.com")).unwrap();
        dir.add(Contact::new("Daniela", "daniela@example.com")).unwrap();

        // "dan" is Dan's whole identifier but also a substring of
        // Daniela's, so it does not resolve.
        match dir.resolve("Dan") {
            Err(ScheduleError::AmbiguousMatch { first, second, .. }) => {
                assert_eq!(first, "Dan");
                assert_eq!(second, "Daniela");
            }
            other => panic!("expected AmbiguousMatch, got {other:?}"),
        }

        // A longer fragment narrows it down.
        let id = dir.resolve("daniela").unwrap();
        assert_eq!(dir.get(id).name, "Daniela");
    }

    #[test]
    fn test_ambiguous_supervisor_assignment_rejected() {
        let mut dir = ContactDirectory::new();
        dir.add(Contact::new("Dan", "dan@example.com")).unwrap();
        dir.add(Contact::new("Daniela", "daniela@example.com")).unwrap();
        dir.add(Contact::new("Priya Nair", "priya@example.com")).unwrap();

        assert!(matches!(
            dir.set_supervisor("priya", "dan"),
            Err(ScheduleError::AmbiguousMatch { .. })
        ));
        let priya = dir.resolve("priya").unwrap();
        assert!(dir.get(priya).supervisor.is_none());
    }

    #[test]
    fn test_supervisor_chain() {
        let mut dir = directory();
        dir.set_supervisor("dana", "omar").unwrap();
        dir.set_supervisor("omar", "priya").unwrap();

        let dana = dir.resolve("dana").unwrap();
        let chain = dir.supervisor_chain(dana);
        assert_eq!(chain.len(), 2);
        assert_eq!(dir.get(chain[0]).name, "Omar Haddad");
        assert_eq!(dir.get(chain[1]).name, "Priya Nair");
    }

    #[test]
    fn test_supervisor_rejects_self_and_cycles() {
        let mut dir = directory();
        assert!(dir.set_supervisor("dana", "dana").is_err());

        dir.set_supervisor("dana", "omar").unwrap();
        dir.set_supervisor("omar", "priya").unwrap();
        // priya -> dana would close the loop
        assert!(dir.set_supervisor("priya", "dana").is_err());
    }

    #[test]
    fn test_effective_block_resolution() {
        let mut dir = directory();
        let t9 = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let t17 = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let blocks = vec![
            TimeBlock::new("Default Hours")
                .with_entry(Recurrence::Weekdays, t9, t17)
                .as_default(),
            TimeBlock::new("Night Shift").with_entry(Recurrence::Daily, t9, t17),
        ];

        let dana = dir.resolve("dana").unwrap();
        // Unassigned: falls back to the flagged default.
        assert_eq!(dir.effective_block(dana, &blocks).unwrap().name, "Default Hours");

        dir.assign_time_block("dana", "Night Shift").unwrap();
        assert_eq!(dir.effective_block(dana, &blocks).unwrap().name, "Night Shift");

        // Dangling assignment is a configuration error.
        dir.assign_time_block("dana", "Gone").unwrap();
        assert!(dir.effective_block(dana, &blocks).is_err());

        // No default flagged at all.
        let omar = dir.resolve("omar").unwrap();
        let no_default = vec![TimeBlock::new("Plain")];
        assert!(matches!(
            dir.effective_block(omar, &no_default),
            Err(ScheduleError::Configuration { .. })
        ));
    }
}
