//! Scheduling domain models.
//!
//! Core data types for the project/task scheduling domain: work items and
//! their dependency edges, contacts (resources), recurring-availability
//! time blocks, and the free/busy intervals the engine emits.
//!
//! Tasks and contacts live in flat arenas (owned by `ProjectContext` and
//! `ContactDirectory`) and reference each other through `TaskId` /
//! `ContactId` indices, never through owning pointers.

mod contact;
mod freebusy;
mod task;
mod timeblock;

pub use contact::{Contact, ContactId};
pub use freebusy::{FreeBusyItem, ScheduleResult, TaskFailure};
pub use task::{compact_name, Dependency, DependencyKind, TaskId, TaskItem};
pub use timeblock::{
    BlockEntry, Recurrence, TimeBlock, TimeWindow, DEFAULT_FLAG_KEY, DEFAULT_FLAG_VALUE,
};
