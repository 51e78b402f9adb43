//! Error taxonomy for the scheduling crate.
//!
//! One crate-wide enum; every variant carries the identifiers needed to act
//! on the failure without re-deriving state. Structural errors (cycles,
//! unregistered enum values) abort a scheduling run; resourcing errors are
//! reported per task so independent subtrees still produce output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by configuration, resolution, and allocation.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ScheduleError {
    /// A named task type or status was given but never registered.
    #[error("unknown {registry} '{name}'")]
    UnknownEnumValue {
        /// Which registry was consulted ("task type" or "task status").
        registry: String,
        /// The unregistered name as given.
        name: String,
    },

    /// A fuzzy contact fragment matched more than one contact.
    #[error("contact fragment '{fragment}' is ambiguous: matches '{first}' and '{second}'")]
    AmbiguousMatch {
        fragment: String,
        first: String,
        second: String,
    },

    /// A fuzzy contact fragment matched nothing.
    #[error("no contact matches '{fragment}'")]
    NotFound { fragment: String },

    /// The dependency graph (including parent/child containment) has a cycle.
    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// Compacted identifiers of the cycle members, in traversal order.
        cycle: Vec<String>,
    },

    /// A task's candidate resource pool is empty.
    #[error("no available resource for task '{task}'")]
    NoAvailableResource { task: String },

    /// Broken setup: missing calendars, supervisor cycles, exhausted
    /// lookahead horizons. The message names the entity involved.
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl ScheduleError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_joins_members() {
        let err = ScheduleError::CyclicDependency {
            cycle: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency: a -> b");
    }

    #[test]
    fn test_errors_carry_identifiers() {
        let err = ScheduleError::NoAvailableResource {
            task: "designmodule".into(),
        };
        assert!(err.to_string().contains("designmodule"));

        let err = ScheduleError::UnknownEnumValue {
            registry: "task status".into(),
            name: "Parked".into(),
        };
        assert_eq!(err.to_string(), "unknown task status 'Parked'");
    }
}
