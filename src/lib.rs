//! Project/task scheduling engine.
//!
//! Builds a hierarchy of projects and tasks linked by finish-to-start
//! dependencies, registers contacts (resources) with recurring weekly
//! availability, and computes a feasible, deterministic sequence of
//! free/busy calendar intervals per task, honoring dependency order,
//! working-hour windows, and no double-booking, with first-come/
//! first-served resource selection.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `TaskItem`, `Dependency`, `Contact`,
//!   `TimeBlock`, `FreeBusyItem`, `ScheduleResult`
//! - **`registry`**: Open, runtime-registered task type/status values
//! - **`directory`**: Contact registry with fuzzy resolution and
//!   supervisor chains
//! - **`context`**: `ProjectContext`, the root scope passed explicitly
//!   into every operation, plus connector feeds of external busy data
//! - **`resolver`**: Dependency-order resolution with cycle detection
//! - **`engine`**: The greedy free/busy allocation engine
//! - **`error`**: The `ScheduleError` taxonomy
//!
//! # Architecture
//!
//! This is a feasibility/allocation engine, not a critical-path
//! optimizer: allocation is greedy and forward-only, never backtracking.
//! A single run is single-threaded and deterministic; configuration must
//! finish before scheduling starts, and unrelated work belongs in
//! separate contexts.
//!
//! # Example
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime};
//! use workplan::context::ProjectContext;
//! use workplan::engine::Scheduler;
//! use workplan::models::{Contact, Recurrence, TimeBlock};
//!
//! let mut ctx = ProjectContext::new();
//! ctx.add_time_block(
//!     TimeBlock::new("Office Hours")
//!         .with_entry(Recurrence::Weekdays, NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
//!                     NaiveTime::from_hms_opt(12, 0, 0).unwrap())
//!         .with_entry(Recurrence::Weekdays, NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
//!                     NaiveTime::from_hms_opt(17, 0, 0).unwrap())
//!         .as_default(),
//! ).unwrap();
//! ctx.directory.add(Contact::new("Dana Miller", "dana@example.com")).unwrap();
//!
//! let design = ctx.task("Design Module");
//! ctx.get_mut(design).effort_minutes = 3 * 60;
//! ctx.add_dependency(design, "Requirements Gathering");
//! let reqs = ctx.task_by_name("Requirements Gathering").unwrap();
//! ctx.get_mut(reqs).effort_minutes = 9 * 60;
//!
//! ctx.reset_calculated();
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let result = Scheduler::new().calculate_task(&mut ctx, design, start).unwrap();
//! assert_eq!(result.item_count(), 4);
//! ```

pub mod context;
pub mod directory;
pub mod engine;
pub mod error;
pub mod models;
pub mod registry;
pub mod resolver;
