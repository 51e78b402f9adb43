//! Free/busy output model.
//!
//! A free/busy item is one allocated, resource-bound calendar interval
//! produced by the allocation engine. Items are immutable once produced;
//! a run's output is ordered by allocation, not necessarily chronologically
//! across resources.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// One allocated interval binding a contact to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBusyItem {
    /// Compacted identifier of the owning contact.
    pub contact: String,
    /// Compacted identifier of the task the interval was allocated for.
    pub task: String,
    /// Interval start.
    pub start: NaiveDateTime,
    /// Interval end.
    pub end: NaiveDateTime,
}

impl FreeBusyItem {
    /// Creates a new item.
    pub fn new(
        contact: impl Into<String>,
        task: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            contact: contact.into(),
            task: task.into(),
            start,
            end,
        }
    }

    /// Interval length in whole minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// A per-task allocation failure recorded during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Compacted identifier of the task that could not be allocated.
    pub task: String,
    /// What went wrong.
    pub error: ScheduleError,
}

/// The outcome of one engine invocation.
///
/// Structural errors abort the run entirely; resourcing failures land in
/// `failures` so independent subtrees still yield their items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// Allocated intervals, in allocation order.
    pub items: Vec<FreeBusyItem>,
    /// Tasks the engine could not allocate, with the reason each.
    pub failures: Vec<TaskFailure>,
}

impl ScheduleResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every task in the run was allocated.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of allocated intervals.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// All items allocated to a contact.
    pub fn items_for_contact(&self, contact_ident: &str) -> Vec<&FreeBusyItem> {
        self.items
            .iter()
            .filter(|i| i.contact == contact_ident)
            .collect()
    }

    /// All items allocated for a task.
    pub fn items_for_task(&self, task_ident: &str) -> Vec<&FreeBusyItem> {
        self.items.iter().filter(|i| i.task == task_ident).collect()
    }

    /// Total allocated minutes for a task.
    pub fn allocated_minutes(&self, task_ident: &str) -> i64 {
        self.items_for_task(task_ident)
            .iter()
            .map(|i| i.duration_minutes())
            .sum()
    }
}
