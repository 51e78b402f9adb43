//! Task (work item) model.
//!
//! Tasks form a forest: each task exclusively owns its children, while
//! dependency edges are non-owning references into the same arena. Tasks
//! live in a flat arena held by the project context and refer to each other
//! by [`TaskId`], so traversal and cycle detection are plain graph
//! algorithms over indices rather than pointer-chasing.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::contact::ContactId;
use crate::registry::SymbolId;

/// Index of a task in the project context's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub usize);

/// Normalizes a display name into a comparison key: lowercased, all
/// whitespace stripped. Two names that compact to the same key refer to
/// the same task or contact.
pub fn compact_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Relationship semantics of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DependencyKind {
    /// The dependent task may start only after the target completes.
    #[default]
    FinishToStart,
}

/// A directed dependency edge to another task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Relationship semantics.
    pub kind: DependencyKind,
    /// The task this edge points at.
    pub target: TaskId,
}

impl Dependency {
    /// Creates a finish-to-start dependency on the given task.
    pub fn finish_to_start(target: TaskId) -> Self {
        Self {
            kind: DependencyKind::FinishToStart,
            target,
        }
    }
}

/// A work item in the project forest.
///
/// "Project" versus "Task" is purely a matter of the registered item type;
/// the engine enforces no structural distinction. A task's own effort
/// excludes its children's; children are scheduled independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskItem {
    /// Display name as given.
    pub name: String,
    /// Compacted comparison key derived from the name.
    pub ident: String,
    /// Free-text description.
    pub description: String,
    /// Registered item type (e.g. Project, Task).
    pub item_type: SymbolId,
    /// Registered status (e.g. Queued, Active, Closed).
    pub status: SymbolId,
    /// Estimated effort in whole minutes; never negative.
    pub effort_minutes: i64,
    /// Earliest-start hint. `None` = start whenever permitted.
    pub start_hint: Option<NaiveDateTime>,
    /// Whether the engine has produced output for this task in the
    /// current run. Reset across the forest before each run.
    pub calculated: bool,
    /// Start of the first allocated interval (engine output).
    pub computed_start: Option<NaiveDateTime>,
    /// End of the last allocated interval (engine output).
    pub computed_end: Option<NaiveDateTime>,
    /// Explicitly assigned resources. Empty = the whole directory is the
    /// candidate pool.
    pub resources: Vec<ContactId>,
    /// Owned children, in attachment order.
    pub children: Vec<TaskId>,
    /// Outgoing dependency edges, in insertion order.
    pub dependencies: Vec<Dependency>,
    /// Free-form properties.
    pub attributes: HashMap<String, String>,
}

impl TaskItem {
    /// Creates a task with the given name, type, and status.
    pub fn new(name: impl Into<String>, item_type: SymbolId, status: SymbolId) -> Self {
        let name = name.into();
        let ident = compact_name(&name);
        Self {
            name,
            ident,
            description: String::new(),
            item_type,
            status,
            effort_minutes: 0,
            start_hint: None,
            calculated: false,
            computed_start: None,
            computed_end: None,
            resources: Vec::new(),
            children: Vec::new(),
            dependencies: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the estimated effort in minutes (clamped at zero).
    pub fn with_effort_minutes(mut self, minutes: i64) -> Self {
        self.effort_minutes = minutes.max(0);
        self
    }

    /// Sets the estimated effort in whole hours.
    pub fn with_effort_hours(self, hours: i64) -> Self {
        self.with_effort_minutes(hours * 60)
    }

    /// Sets the earliest-start hint.
    pub fn with_start_hint(mut self, start: NaiveDateTime) -> Self {
        self.start_hint = Some(start);
        self
    }

    /// Adds a free-form property.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether a dependency edge with the same kind and target exists.
    pub fn has_dependency(&self, dep: &Dependency) -> bool {
        self.dependencies.contains(dep)
    }

    /// Clears engine output: calculated flag and computed instants.
    pub fn reset_calculated(&mut self) {
        self.calculated = false;
        self.computed_start = None;
        self.computed_end = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_name() {
        assert_eq!(compact_name("Requirements Gathering"), "requirementsgathering");
        assert_eq!(compact_name("  Design\tModule "), "designmodule");
        assert_eq!(compact_name("ALREADY"), "already");
        assert_eq!(compact_name(""), "");
    }

    #[test]
    fn test_task_builder() {
        let task = TaskItem::new("Design Module", SymbolId(0), SymbolId(1))
            .with_description("High-level design")
            .with_effort_hours(3)
            .with_attribute("team", "core");

        assert_eq!(task.ident, "designmodule");
        assert_eq!(task.effort_minutes, 180);
        assert_eq!(task.description, "High-level design");
        assert_eq!(task.attributes.get("team"), Some(&"core".to_string()));
        assert!(!task.calculated);
        assert!(task.children.is_empty());
    }

    #[test]
    fn test_effort_never_negative() {
        let task = TaskItem::new("T", SymbolId(0), SymbolId(0)).with_effort_minutes(-30);
        assert_eq!(task.effort_minutes, 0);
    }

    #[test]
    fn test_reset_calculated() {
        let mut task = TaskItem::new("T", SymbolId(0), SymbolId(0));
        task.calculated = true;
        task.computed_start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0);
        task.computed_end = task.computed_start;

        task.reset_calculated();
        assert!(!task.calculated);
        assert!(task.computed_start.is_none());
        assert!(task.computed_end.is_none());
    }

    #[test]
    fn test_dependency_identity() {
        let dep = Dependency::finish_to_start(TaskId(3));
        assert_eq!(dep.kind, DependencyKind::FinishToStart);

        let task = TaskItem::new("T", SymbolId(0), SymbolId(0));
        assert!(!task.has_dependency(&dep));
    }
}
