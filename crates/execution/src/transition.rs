//! State machine transition validation for execution status.
//!
//! Mirrors the teacher's `nebula-execution::transition` module: a small,
//! table-driven predicate plus a validating wrapper, kept separate from the
//! [`crate::execution::Execution`] type itself.

use crate::error::ExecutionError;
use crate::status::ExecutionStatus;

/// `true` if the execution-level transition from `from` to `to` is legal.
///
/// Per `spec.md` §4.1 state machine: only forward transitions; terminal
/// states are sinks. `Waiting` is reachable only from `Running` (step-debug
/// pause) and returns only to `Running`.
#[must_use]
pub fn can_transition(from: ExecutionStatus, to: ExecutionStatus) -> bool {
    use ExecutionStatus::{Cancelled, Failed, Pending, Running, Success, Waiting};
    matches!(
        (from, to),
        (Pending, Running)
            | (Running, Waiting)
            | (Waiting, Running)
            | (Running, Success)
            | (Running, Failed)
            | (Running, Cancelled)
            | (Waiting, Cancelled)
    )
}

/// Validate a transition, returning [`ExecutionError::InvalidTransition`] if
/// illegal.
pub fn validate_transition(
    from: ExecutionStatus,
    to: ExecutionStatus,
) -> Result<(), ExecutionError> {
    if from == to || can_transition(from, to) {
        Ok(())
    } else {
        Err(ExecutionError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ExecutionStatus::{Cancelled, Failed, Pending, Running, Success, Waiting};

    #[test]
    fn pending_to_running_allowed() {
        assert!(can_transition(Pending, Running));
    }

    #[test]
    fn running_to_each_terminal_allowed() {
        assert!(can_transition(Running, Success));
        assert!(can_transition(Running, Failed));
        assert!(can_transition(Running, Cancelled));
    }

    #[test]
    fn terminal_states_are_sinks() {
        assert!(!can_transition(Success, Running));
        assert!(!can_transition(Failed, Running));
        assert!(!can_transition(Cancelled, Running));
    }

    #[test]
    fn waiting_round_trips_to_running_only() {
        assert!(can_transition(Running, Waiting));
        assert!(can_transition(Waiting, Running));
        assert!(!can_transition(Waiting, Success));
        assert!(can_transition(Waiting, Cancelled));
    }

    #[test]
    fn backward_transition_rejected() {
        assert!(validate_transition(Running, Pending).is_err());
    }
}
