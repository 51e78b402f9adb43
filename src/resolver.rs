//! Dependency resolver.
//!
//! Produces the total allocation order for a root task: the root, its
//! transitive dependency closure, and its descendant subtree, such that
//! every finish-to-start target precedes its dependent. Children carry no
//! implicit ordering against their parent's own allocation; only explicit
//! dependency edges order them.
//!
//! # Algorithm
//! Depth-first traversal with a three-state visit marker per task
//! (unvisited / in-progress / done). A back edge onto an in-progress task
//! is a cycle; because children are visited inside their parent's
//! in-progress span, containment edges participate in cycle detection. A
//! parent may depend on its own child (the child is simply emitted first);
//! a child depending on its own parent closes a cycle.
//!
//! Tasks whose calculated flag is already set are treated as scheduled by
//! a prior run: they are neither re-ordered nor re-entered.

use tracing::debug;

use crate::context::ProjectContext;
use crate::error::ScheduleError;
use crate::models::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Orders a root task, its dependency closure, and its subtree for
/// allocation. Fails with `CyclicDependency` naming the cycle members.
pub fn resolve_order(ctx: &ProjectContext, root: TaskId) -> Result<Vec<TaskId>, ScheduleError> {
    let mut state = vec![Visit::Unvisited; ctx.task_count()];
    let mut stack: Vec<TaskId> = Vec::new();
    let mut order: Vec<TaskId> = Vec::new();

    visit(ctx, root, &mut state, &mut stack, &mut order)?;

    debug!(
        root = ctx.get(root).ident.as_str(),
        tasks = order.len(),
        "dependency order resolved"
    );
    Ok(order)
}

fn visit(
    ctx: &ProjectContext,
    id: TaskId,
    state: &mut [Visit],
    stack: &mut Vec<TaskId>,
    order: &mut Vec<TaskId>,
) -> Result<(), ScheduleError> {
    let task = ctx.get(id);
    if task.calculated {
        return Ok(()); // scheduled in a prior run
    }
    match state[id.0] {
        Visit::Done => return Ok(()),
        Visit::InProgress => {
            // Back edge: the stack from the first occurrence of `id` is
            // exactly the cycle.
            let pos = stack.iter().position(|t| *t == id).unwrap_or(0);
            let cycle = stack[pos..]
                .iter()
                .map(|t| ctx.get(*t).ident.clone())
                .collect();
            return Err(ScheduleError::CyclicDependency { cycle });
        }
        Visit::Unvisited => {}
    }

    state[id.0] = Visit::InProgress;
    stack.push(id);

    for dep in &task.dependencies {
        visit(ctx, dep.target, state, stack, order)?;
    }
    order.push(id);
    for child in &task.children {
        visit(ctx, *child, state, stack, order)?;
    }

    stack.pop();
    state[id.0] = Visit::Done;
    Ok(())
}
