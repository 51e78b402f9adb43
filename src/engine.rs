//! Allocation engine.
//!
//! Walks tasks in resolved dependency order and carves calendar time out of
//! each chosen resource's availability until the task's estimated effort is
//! consumed. Per task the engine moves through four phases:
//!
//! `Pending → Resourcing → Allocating → Scheduled`
//!
//! - **Resourcing**: the candidate pool is the task's explicit resource
//!   assignments, or the whole contact directory when none exist. The
//!   candidate whose calendar reaches open time earliest wins; ties go to
//!   the contact registered first (first-come/first-served).
//! - **Allocating**: a greedy, forward-only day-by-day walk. Each day the
//!   resource's open windows are clipped to the cursor, already-booked
//!   sub-intervals (this run's allocations plus connector busy data) are
//!   subtracted, and the remainder is consumed chronologically. Every
//!   consumed sub-interval becomes one free/busy item, so a task may span
//!   multiple non-contiguous items across windows and days.
//! - **Scheduled**: the task's calculated flag is set and its computed end
//!   instant recorded as the start bound for anything depending on it.
//!
//! The engine never retries or backtracks. Structural failures (dependency
//! cycles) abort the run; per-task resourcing failures are recorded in the
//! result so independent subtrees still produce output. Forward walking is
//! bounded by a lookahead horizon so a calendar with no future open time
//! cannot loop forever.
//!
//! Callers must reset the calculated flag across the forest before a run;
//! a set flag means "already scheduled" and the task is skipped.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use crate::context::ProjectContext;
use crate::error::ScheduleError;
use crate::models::{ContactId, FreeBusyItem, ScheduleResult, TaskFailure, TaskId, TimeBlock};
use crate::resolver::resolve_order;

/// Default forward-walking bound, in days (three years).
pub const DEFAULT_HORIZON_DAYS: i64 = 1096;

type Interval = (NaiveDateTime, NaiveDateTime);

/// The greedy free/busy allocation engine.
///
/// Stateless between runs; all scheduling state lives in the context and
/// the returned result. Two runs over an identical context produce
/// identical output.
#[derive(Debug, Clone)]
pub struct Scheduler {
    horizon_days: i64,
}

impl Scheduler {
    /// Creates a scheduler with the default lookahead horizon.
    pub fn new() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }

    /// Sets the maximum number of days the allocation walk may advance
    /// past a task's earliest permissible start.
    pub fn with_horizon_days(mut self, days: i64) -> Self {
        self.horizon_days = days.max(0);
        self
    }

    /// Computes the free/busy sequence for a root task.
    ///
    /// Orders the root, its dependency closure, and its subtree, then
    /// allocates each task in turn starting no earlier than `start`.
    /// Dependency cycles abort the run; per-task failures are reported in
    /// the result and poison only their dependents.
    pub fn calculate_task(
        &self,
        ctx: &mut ProjectContext,
        root: TaskId,
        start: NaiveDateTime,
    ) -> Result<ScheduleResult, ScheduleError> {
        let order = resolve_order(ctx, root)?;
        debug!(tasks = order.len(), %start, "allocation run started");

        let mut bookings = seed_bookings(ctx);
        let mut failed: HashSet<TaskId> = HashSet::new();
        let mut result = ScheduleResult::new();

        for id in order {
            if ctx.get(id).calculated {
                continue;
            }
            match self.allocate_one(ctx, id, start, &bookings, &failed) {
                Ok(allocation) => {
                    let task_ident = ctx.get(id).ident.clone();
                    if let Some((contact_id, contact_ident)) = &allocation.contact {
                        let booked = bookings.entry(*contact_id).or_default();
                        for &(s, e) in &allocation.intervals {
                            booked.push((s, e));
                            result
                                .items
                                .push(FreeBusyItem::new(contact_ident.clone(), task_ident.clone(), s, e));
                        }
                        booked.sort();
                    }
                    let task = ctx.get_mut(id);
                    task.calculated = true;
                    task.computed_start = Some(allocation.start_at);
                    task.computed_end = Some(allocation.end_at);
                    trace!(
                        task = task_ident.as_str(),
                        end = %allocation.end_at,
                        intervals = allocation.intervals.len(),
                        "task scheduled"
                    );
                }
                Err(error) => {
                    failed.insert(id);
                    let task = ctx.get(id).ident.clone();
                    debug!(task = task.as_str(), %error, "task allocation failed");
                    result.failures.push(TaskFailure { task, error });
                }
            }
        }
        Ok(result)
    }

    /// Runs the Resourcing and Allocating phases for one task.
    fn allocate_one(
        &self,
        ctx: &ProjectContext,
        id: TaskId,
        origin: NaiveDateTime,
        bookings: &HashMap<ContactId, Vec<Interval>>,
        failed: &HashSet<TaskId>,
    ) -> Result<Allocation, ScheduleError> {
        let task = ctx.get(id);
        let earliest = self.earliest_start(ctx, id, origin, failed)?;

        // Zero effort: immediately scheduled at the earliest permissible
        // start, consuming nothing.
        if task.effort_minutes == 0 {
            return Ok(Allocation {
                contact: None,
                intervals: Vec::new(),
                start_at: earliest,
                end_at: earliest,
            });
        }

        // Resourcing: explicit assignments, else the whole directory.
        let pool: Vec<ContactId> = if task.resources.is_empty() {
            ctx.directory.ids()
        } else {
            task.resources.clone()
        };
        if pool.is_empty() {
            return Err(ScheduleError::NoAvailableResource {
                task: task.ident.clone(),
            });
        }

        // Pick the candidate reaching open time first; insertion order
        // breaks ties because only a strictly earlier instant replaces the
        // current choice. Candidates without a usable calendar are skipped
        // as long as at least one usable candidate remains.
        let empty: Vec<Interval> = Vec::new();
        let mut chosen: Option<(ContactId, &TimeBlock, NaiveDateTime)> = None;
        let mut usable = 0usize;
        let mut calendar_error: Option<ScheduleError> = None;
        for contact_id in pool {
            let block = match ctx.directory.effective_block(contact_id, ctx.time_blocks()) {
                Ok(block) => block,
                Err(error) => {
                    trace!(
                        task = task.ident.as_str(),
                        contact = ctx.directory.get(contact_id).ident.as_str(),
                        %error,
                        "candidate skipped"
                    );
                    calendar_error.get_or_insert(error);
                    continue;
                }
            };
            usable += 1;
            let busy = bookings.get(&contact_id).unwrap_or(&empty);
            if let Some(first) = self.first_free_instant(block, busy, earliest) {
                match chosen {
                    Some((_, _, best)) if first >= best => {}
                    _ => chosen = Some((contact_id, block, first)),
                }
            }
        }
        let (contact_id, block, _) = match chosen {
            Some(choice) => choice,
            // No candidate had a usable calendar: surface the broken
            // configuration instead of a misleading horizon message.
            None if usable == 0 => {
                return Err(calendar_error.unwrap_or_else(|| {
                    ScheduleError::NoAvailableResource {
                        task: task.ident.clone(),
                    }
                }))
            }
            None => {
                return Err(ScheduleError::configuration(format!(
                    "no open calendar time within {} days for task '{}'",
                    self.horizon_days, task.ident
                )))
            }
        };

        // Allocating: consume open sub-intervals forward from the earliest
        // permissible start until the effort is gone.
        let busy = bookings.get(&contact_id).unwrap_or(&empty);
        let intervals = self.consume(block, busy, earliest, task.effort_minutes)?;
        let start_at = intervals[0].0;
        let end_at = intervals[intervals.len() - 1].1;

        Ok(Allocation {
            contact: Some((contact_id, ctx.directory.get(contact_id).ident.clone())),
            intervals,
            start_at,
            end_at,
        })
    }

    /// The later of the run origin, the task's own start hint, and every
    /// finish-to-start dependency target's computed end.
    fn earliest_start(
        &self,
        ctx: &ProjectContext,
        id: TaskId,
        origin: NaiveDateTime,
        failed: &HashSet<TaskId>,
    ) -> Result<NaiveDateTime, ScheduleError> {
        let task = ctx.get(id);
        let mut earliest = origin;
        if let Some(hint) = task.start_hint {
            earliest = earliest.max(hint);
        }
        for dep in &task.dependencies {
            if failed.contains(&dep.target) {
                return Err(ScheduleError::configuration(format!(
                    "task '{}': dependency '{}' was not scheduled",
                    task.ident,
                    ctx.get(dep.target).ident
                )));
            }
            if let Some(end) = ctx.get(dep.target).computed_end {
                earliest = earliest.max(end);
            }
        }
        Ok(earliest)
    }

    /// First open, unbooked instant at or after `from`, within the horizon.
    fn first_free_instant(
        &self,
        block: &TimeBlock,
        busy: &[Interval],
        from: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        let mut date = from.date();
        let mut cursor = from;
        for _ in 0..=self.horizon_days {
            if let Some(&(start, _)) = day_free_segments(block, busy, date, cursor).first() {
                return Some(start);
            }
            date = date.succ_opt()?;
            cursor = date.and_time(NaiveTime::MIN);
        }
        None
    }

    /// Greedy forward walk consuming `effort_minutes` of open time.
    /// Returns the consumed sub-intervals in chronological order.
    fn consume(
        &self,
        block: &TimeBlock,
        busy: &[Interval],
        from: NaiveDateTime,
        effort_minutes: i64,
    ) -> Result<Vec<Interval>, ScheduleError> {
        let mut remaining = effort_minutes;
        let mut consumed: Vec<Interval> = Vec::new();
        let mut date = from.date();
        let mut cursor = from;

        for _ in 0..=self.horizon_days {
            for (seg_start, seg_end) in day_free_segments(block, busy, date, cursor) {
                let available = (seg_end - seg_start).num_minutes();
                if available <= 0 {
                    continue;
                }
                let take = available.min(remaining);
                let end = seg_start + Duration::minutes(take);
                trace!(start = %seg_start, %end, minutes = take, "interval consumed");
                consumed.push((seg_start, end));
                remaining -= take;
                if remaining == 0 {
                    return Ok(consumed);
                }
            }
            date = date
                .succ_opt()
                .ok_or_else(|| ScheduleError::configuration("calendar date overflow"))?;
            cursor = date.and_time(NaiveTime::MIN);
        }

        Err(ScheduleError::configuration(format!(
            "horizon of {} days exhausted with {} minutes unallocated",
            self.horizon_days, remaining
        )))
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of allocating a single task.
#[derive(Debug)]
struct Allocation {
    /// Chosen resource; `None` for zero-effort tasks.
    contact: Option<(ContactId, String)>,
    /// Consumed sub-intervals in chronological order.
    intervals: Vec<Interval>,
    start_at: NaiveDateTime,
    end_at: NaiveDateTime,
}

/// Pre-existing busy intervals per contact, gathered from every connector.
fn seed_bookings(ctx: &ProjectContext) -> HashMap<ContactId, Vec<Interval>> {
    let mut bookings: HashMap<ContactId, Vec<Interval>> = HashMap::new();
    for (id, contact) in ctx.directory.iter() {
        let mut busy: Vec<Interval> = Vec::new();
        for connector in ctx.connectors() {
            busy.extend(connector.busy_intervals(&contact.ident));
        }
        if !busy.is_empty() {
            busy.sort();
            bookings.insert(id, busy);
        }
    }
    bookings
}

/// Open sub-intervals of a contact's calendar on one date, at or after
/// `cursor`, with booked intervals subtracted. Ordered chronologically.
fn day_free_segments(
    block: &TimeBlock,
    busy: &[Interval],
    date: NaiveDate,
    cursor: NaiveDateTime,
) -> Vec<Interval> {
    let mut free = Vec::new();
    for window in block.windows_on(date) {
        let window_start = date.and_time(window.start);
        let window_end = date.and_time(window.end);
        if window_end <= cursor {
            continue;
        }
        subtract_busy(window_start.max(cursor), window_end, busy, &mut free);
    }
    free
}

/// Appends the parts of [start, end) not covered by `busy` (sorted by
/// start) onto `free`.
fn subtract_busy(start: NaiveDateTime, end: NaiveDateTime, busy: &[Interval], free: &mut Vec<Interval>) {
    let mut cursor = start;
    for &(busy_start, busy_end) in busy {
        if busy_end <= cursor || busy_start >= end {
            continue;
        }
        if busy_start > cursor {
            free.push((cursor, busy_start));
        }
        cursor = cursor.max(busy_end);
        if cursor >= end {
            return;
        }
    }
    if cursor < end {
        free.push((cursor, end));
    }
}
