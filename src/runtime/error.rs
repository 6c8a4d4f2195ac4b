//! Error taxonomy for the runtime/controller (§7): reconcile errors and
//! the carryover errors threaded between dispatches.

use thiserror::Error;

/// An error returned by a precondition, task, or postcondition (§4.G),
/// or surfaced from a failed topology rebuild (§4.F step 3).
#[derive(Debug, Error, Clone)]
pub enum ReconcileError {
    #[error("topology rebuild failed: {0}")]
    TopologyRebuild(String),
    #[error("{0}")]
    Task(String),
    #[error("joined errors: {0:?}")]
    Joined(Vec<ReconcileError>),
}

impl ReconcileError {
    /// Join a carryover error (if any) with a freshly raised one, per the
    /// error-handler contract (§4.G: "the join of any carried-over error
    /// and the just-raised error").
    pub fn join(carryover: Option<ReconcileError>, fresh: Option<ReconcileError>) -> Option<ReconcileError> {
        match (carryover, fresh) {
            (None, None) => None,
            (Some(e), None) | (None, Some(e)) => Some(e),
            (Some(a), Some(b)) => Some(ReconcileError::Joined(vec![a, b])),
        }
    }

    /// Join a list of task errors (possibly empty), per workflow
    /// conflation (§4.G, §8 scenario 7): "all tasks run to completion";
    /// their errors, if any, are joined in encounter order.
    pub fn join_all(errors: Vec<ReconcileError>) -> Option<ReconcileError> {
        match errors.len() {
            0 => None,
            1 => errors.into_iter().next(),
            _ => Some(ReconcileError::Joined(errors)),
        }
    }
}
