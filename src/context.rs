//! Project context: the root registry and scope for one unit of work.
//!
//! Holds the task forest (a flat arena indexed by [`TaskId`]), the open
//! type/status registries, the contact directory, the time-block
//! collection, and any connector feeds of pre-existing busy data. There is
//! no hidden process-wide instance. Callers construct a context and pass
//! it explicitly into configuration and engine calls.
//!
//! Configuration and scheduling are separate phases. All mutation here
//! must complete before a scheduling run starts; the context provides no
//! internal locking. Run independent contexts in parallel instead.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::directory::ContactDirectory;
use crate::error::ScheduleError;
use crate::models::{compact_name, Dependency, TaskId, TaskItem, TimeBlock};
use crate::registry::{SymbolId, SymbolRegistry};

/// An injectable source of pre-existing busy intervals per contact.
///
/// The allocation engine subtracts these from a contact's open calendar
/// windows exactly like bookings made earlier in the run; a feed can only
/// remove availability, never add it.
pub trait BusyConnector: Send + Sync + Debug {
    /// Busy intervals for the contact with the given compacted identifier.
    fn busy_intervals(&self, contact_ident: &str) -> Vec<(NaiveDateTime, NaiveDateTime)>;
}

/// A connector backed by a plain in-memory map.
#[derive(Debug, Clone, Default)]
pub struct StaticBusyFeed {
    intervals: HashMap<String, Vec<(NaiveDateTime, NaiveDateTime)>>,
}

impl StaticBusyFeed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a busy interval for a contact.
    pub fn add(&mut self, contact_ident: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) {
        self.intervals
            .entry(contact_ident.into())
            .or_default()
            .push((start, end));
    }
}

impl BusyConnector for StaticBusyFeed {
    fn busy_intervals(&self, contact_ident: &str) -> Vec<(NaiveDateTime, NaiveDateTime)> {
        self.intervals.get(contact_ident).cloned().unwrap_or_default()
    }
}

/// The root registry and scope for a scheduling session.
#[derive(Debug)]
pub struct ProjectContext {
    tasks: Vec<TaskItem>,
    task_index: HashMap<String, TaskId>,
    /// Registered item types. Seeded with Task (default) and Project.
    pub types: SymbolRegistry,
    /// Registered statuses. Seeded with Queued (default), Active, Closed.
    pub statuses: SymbolRegistry,
    /// The contact directory.
    pub directory: ContactDirectory,
    time_blocks: Vec<TimeBlock>,
    connectors: Vec<Box<dyn BusyConnector>>,
}

impl ProjectContext {
    /// Creates a context with the baseline type/status values registered.
    ///
    /// Both registries stay open: register more values or re-point the
    /// defaults at any time before scheduling.
    pub fn new() -> Self {
        let mut types = SymbolRegistry::new("task type");
        types.register_default("Task");
        types.register("Project");

        let mut statuses = SymbolRegistry::new("task status");
        statuses.register_default("Queued");
        statuses.register("Active");
        statuses.register("Closed");

        Self {
            tasks: Vec::new(),
            task_index: HashMap::new(),
            types,
            statuses,
            directory: ContactDirectory::new(),
            time_blocks: Vec::new(),
            connectors: Vec::new(),
        }
    }

    /// Hard reset: discards every task, contact, time block, and connector,
    /// including registered enum values. Equivalent to a fresh context.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // ---- task forest ----------------------------------------------------

    /// The task for an id.
    pub fn get(&self, id: TaskId) -> &TaskItem {
        &self.tasks[id.0]
    }

    /// Mutable access to a task.
    pub fn get_mut(&mut self, id: TaskId) -> &mut TaskItem {
        &mut self.tasks[id.0]
    }

    /// Number of tasks in the forest.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Looks up a task by name (compacted comparison).
    pub fn task_by_name(&self, name: &str) -> Option<TaskId> {
        self.task_index.get(&compact_name(name)).copied()
    }

    /// Gets the task with the given name, creating a placeholder with the
    /// default type and status if none exists. Idempotent: the same name
    /// (modulo case and whitespace) always yields the same task.
    pub fn task(&mut self, name: &str) -> TaskId {
        if let Some(id) = self.task_by_name(name) {
            return id;
        }
        // Baseline defaults are always registered; see `new`.
        let item_type = self.types.default_value().unwrap_or(SymbolId(0));
        let status = self.statuses.default_value().unwrap_or(SymbolId(0));
        self.insert(TaskItem::new(name, item_type, status))
    }

    /// Creates (or completes) a task with an explicit type name.
    pub fn new_task(&mut self, name: &str, type_name: &str) -> Result<TaskId, ScheduleError> {
        let item_type = self.types.resolve_or_default(type_name)?;
        let id = self.task(name);
        self.get_mut(id).item_type = item_type;
        Ok(id)
    }

    /// Bulk insertion from (name, description, type-name, status-name)
    /// tuples. Empty type/status names mean the registered defaults.
    ///
    /// Every tuple is validated against the registries before anything is
    /// inserted, so an `UnknownEnumValue` leaves the context untouched.
    pub fn insert_tasks(
        &mut self,
        rows: &[(&str, &str, &str, &str)],
    ) -> Result<Vec<TaskId>, ScheduleError> {
        let mut resolved = Vec::with_capacity(rows.len());
        for (_, _, type_name, status_name) in rows {
            resolved.push((
                self.types.resolve_or_default(type_name)?,
                self.statuses.resolve_or_default(status_name)?,
            ));
        }

        let mut ids = Vec::with_capacity(rows.len());
        for ((name, description, _, _), (item_type, status)) in rows.iter().zip(resolved) {
            let id = self.task(name);
            let task = self.get_mut(id);
            task.description = (*description).to_string();
            task.item_type = item_type;
            task.status = status;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Inserts a fully built task. Fails if the name collides with an
    /// existing task.
    pub fn insert_task(&mut self, task: TaskItem) -> Result<TaskId, ScheduleError> {
        if self.task_index.contains_key(&task.ident) {
            return Err(ScheduleError::configuration(format!(
                "task '{}' already exists",
                task.ident
            )));
        }
        Ok(self.insert(task))
    }

    fn insert(&mut self, task: TaskItem) -> TaskId {
        let id = TaskId(self.tasks.len());
        self.task_index.insert(task.ident.clone(), id);
        self.tasks.push(task);
        id
    }

    /// Tasks matching a predicate, in arena order.
    pub fn find_tasks(&self, predicate: impl Fn(&TaskItem) -> bool) -> Vec<TaskId> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| predicate(t))
            .map(|(i, _)| TaskId(i))
            .collect()
    }

    /// Adds a finish-to-start dependency on a task referenced by name,
    /// auto-creating a placeholder on first reference. Re-adding the same
    /// name binds to the already-created task and re-adding the same edge
    /// is a no-op.
    pub fn add_dependency(&mut self, task: TaskId, target_name: &str) -> TaskId {
        let target = self.task(target_name);
        self.add_dependency_to(task, Dependency::finish_to_start(target));
        target
    }

    /// Adds a dependency edge by direct reference; duplicate edges are
    /// dropped.
    pub fn add_dependency_to(&mut self, task: TaskId, dep: Dependency) {
        let item = self.get_mut(task);
        if !item.has_dependency(&dep) {
            item.dependencies.push(dep);
        }
    }

    /// Attaches tasks as children of a named parent, auto-creating parent
    /// and children as needed. Returns how many were actually attached:
    /// self-attachment, duplicates, and attachments that would make a task
    /// its own ancestor are skipped.
    pub fn associate(&mut self, parent_name: &str, child_names: &[&str]) -> usize {
        let parent = self.task(parent_name);
        let mut attached = 0;
        for name in child_names {
            let child = self.task(name);
            if child == parent
                || self.get(parent).children.contains(&child)
                || self.subtree_contains(child, parent)
            {
                continue;
            }
            self.get_mut(parent).children.push(child);
            attached += 1;
        }
        attached
    }

    /// Whether `descendant` is inside the containment subtree rooted at
    /// `root` (strictly below it).
    fn subtree_contains(&self, root: TaskId, descendant: TaskId) -> bool {
        let mut stack: Vec<TaskId> = self.get(root).children.clone();
        while let Some(id) = stack.pop() {
            if id == descendant {
                return true;
            }
            stack.extend(self.get(id).children.iter().copied());
        }
        false
    }

    /// Clears engine output across the whole forest. Required before every
    /// scheduling run; the engine treats a set flag as "already scheduled".
    pub fn reset_calculated(&mut self) {
        for task in &mut self.tasks {
            task.reset_calculated();
        }
    }

    // ---- time blocks ----------------------------------------------------

    /// Registers a time-block template, validating its entries: windows
    /// must be non-empty (`start < end`) and must not span midnight, and
    /// template names must be unique.
    pub fn add_time_block(&mut self, block: TimeBlock) -> Result<(), ScheduleError> {
        let key = compact_name(&block.name);
        if self
            .time_blocks
            .iter()
            .any(|b| compact_name(&b.name) == key)
        {
            return Err(ScheduleError::configuration(format!(
                "time block '{}' is already registered",
                block.name
            )));
        }
        for entry in &block.entries {
            if entry.window.start >= entry.window.end {
                return Err(ScheduleError::configuration(format!(
                    "time block '{}': window end must be after start",
                    block.name
                )));
            }
        }
        self.time_blocks.push(block);
        Ok(())
    }

    /// All registered templates, in registration order.
    pub fn time_blocks(&self) -> &[TimeBlock] {
        &self.time_blocks
    }

    /// Looks up a template by name (compacted comparison).
    pub fn time_block(&self, name: &str) -> Option<&TimeBlock> {
        let key = compact_name(name);
        self.time_blocks
            .iter()
            .find(|b| compact_name(&b.name) == key)
    }

    // ---- resource assignment & connectors -------------------------------

    /// Explicitly assigns resources to a task, resolved by fragment.
    pub fn assign_resources(
        &mut self,
        task: TaskId,
        fragments: &[&str],
    ) -> Result<(), ScheduleError> {
        let mut ids = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            ids.push(self.directory.resolve(fragment)?);
        }
        let item = self.get_mut(task);
        for id in ids {
            if !item.resources.contains(&id) {
                item.resources.push(id);
            }
        }
        Ok(())
    }

    /// Adds a connector feed of pre-existing busy data.
    pub fn add_connector(&mut self, connector: Box<dyn BusyConnector>) {
        self.connectors.push(connector);
    }

    /// Drops every connector feed. Call between runs when stale external
    /// busy data must not carry over.
    pub fn clear_connectors(&mut self) {
        self.connectors.clear();
    }

    /// The registered connector feeds.
    pub fn connectors(&self) -> &[Box<dyn BusyConnector>] {
        &self.connectors
    }
}

impl Default for ProjectContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contact, Recurrence};
    use chrono::{NaiveDate, NaiveTime};

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_task_get_or_create_is_idempotent() {
        let mut ctx = ProjectContext::new();
        let a = ctx.task("Requirements Gathering");
        let b = ctx.task("requirements gathering");
        let c = ctx.task("REQUIREMENTS   GATHERING");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(ctx.task_count(), 1);
    }

    #[test]
    fn test_placeholder_gets_defaults() {
        let mut ctx = ProjectContext::new();
        let id = ctx.task("Placeholder");
        let task = ctx.get(id);
        assert_eq!(ctx.types.name(task.item_type), Some("Task"));
        assert_eq!(ctx.statuses.name(task.status), Some("Queued"));
    }

    #[test]
    fn test_insert_tasks_bulk() {
        let mut ctx = ProjectContext::new();
        let ids = ctx
            .insert_tasks(&[
                ("Website Relaunch", "Ship the new site", "Project", "Active"),
                ("Design Module", "High-level design", "", ""),
            ])
            .unwrap();

        assert_eq!(ids.len(), 2);
        let project = ctx.get(ids[0]);
        assert_eq!(ctx.types.name(project.item_type), Some("Project"));
        assert_eq!(ctx.statuses.name(project.status), Some("Active"));

        let task = ctx.get(ids[1]);
        assert_eq!(ctx.types.name(task.item_type), Some("Task"));
        assert_eq!(task.description, "High-level design");
    }

    #[test]
    fn test_insert_tasks_unknown_enum_is_atomic() {
        let mut ctx = ProjectContext::new();
        let err = ctx
            .insert_tasks(&[
                ("Fine", "", "Task", "Queued"),
                ("Broken", "", "Milestone", ""),
            ])
            .unwrap_err();

        assert!(matches!(err, ScheduleError::UnknownEnumValue { .. }));
        // Nothing inserted, not even the valid first row.
        assert_eq!(ctx.task_count(), 0);
    }

    #[test]
    fn test_dependency_by_name_shares_placeholder() {
        let mut ctx = ProjectContext::new();
        let design = ctx.task("Design Module");
        let build = ctx.task("Build Module");

        let first = ctx.add_dependency(design, "Requirements Gathering");
        let second = ctx.add_dependency(build, "Requirements Gathering");
        assert_eq!(first, second); // one shared task, not two

        // Re-adding the same edge is a no-op.
        ctx.add_dependency(design, "Requirements Gathering");
        assert_eq!(ctx.get(design).dependencies.len(), 1);
    }

    #[test]
    fn test_associate_counts_and_guards() {
        let mut ctx = ProjectContext::new();
        let n = ctx.associate("Website Relaunch", &["Design Module", "Build Module"]);
        assert_eq!(n, 2);

        // Duplicate and self-attachment are skipped.
        let n = ctx.associate("Website Relaunch", &["Design Module", "Website Relaunch"]);
        assert_eq!(n, 0);

        // Attaching an ancestor would make the parent its own ancestor.
        let n = ctx.associate("Design Module", &["Website Relaunch"]);
        assert_eq!(n, 0);

        let parent = ctx.task_by_name("Website Relaunch").unwrap();
        assert_eq!(ctx.get(parent).children.len(), 2);
    }

    #[test]
    fn test_reset_calculated_covers_forest() {
        let mut ctx = ProjectContext::new();
        let a = ctx.task("A");
        let b = ctx.task("B");
        ctx.get_mut(a).calculated = true;
        ctx.get_mut(b).calculated = true;

        ctx.reset_calculated();
        assert!(!ctx.get(a).calculated);
        assert!(!ctx.get(b).calculated);
    }

    #[test]
    fn test_time_block_validation() {
        let mut ctx = ProjectContext::new();
        ctx.add_time_block(TimeBlock::new("Office").with_entry(Recurrence::Weekdays, t(8), t(17)))
            .unwrap();

        // Duplicate name.
        assert!(ctx.add_time_block(TimeBlock::new("office")).is_err());

        // Inverted window.
        let bad = TimeBlock::new("Bad").with_entry(Recurrence::Daily, t(17), t(8));
        assert!(ctx.add_time_block(bad).is_err());

        assert!(ctx.time_block("OFFICE").is_some());
    }

    #[test]
    fn test_assign_resources_by_fragment() {
        let mut ctx = ProjectContext::new();
        ctx.directory
            .add(Contact::new("Dana Miller", "dana@example.com"))
            .unwrap();
        let id = ctx.task("Design Module");
        ctx.assign_resources(id, &["dana"]).unwrap();
        ctx.assign_resources(id, &["dana"]).unwrap(); // no duplicate
        assert_eq!(ctx.get(id).resources.len(), 1);

        assert!(ctx.assign_resources(id, &["nobody"]).is_err());
    }

    #[test]
    fn test_clear_is_a_hard_reset() {
        let mut ctx = ProjectContext::new();
        ctx.types.register("Milestone");
        ctx.task("A");
        ctx.directory
            .add(Contact::new("Dana", "dana@example.com"))
            .unwrap();
        ctx.add_connector(Box::new(StaticBusyFeed::new()));

        ctx.clear();
        assert_eq!(ctx.task_count(), 0);
        assert!(ctx.directory.is_empty());
        assert!(ctx.connectors().is_empty());
        // Registered extras are gone too; only the baseline seed remains.
        assert!(ctx.types.resolve("Milestone").is_err());
    }

    #[test]
    fn test_static_busy_feed() {
        let mut feed = StaticBusyFeed::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        feed.add("dana", start, end);

        assert_eq!(feed.busy_intervals("dana").len(), 1);
        assert!(feed.busy_intervals("omar").is_empty());
    }
}
