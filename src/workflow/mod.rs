//! Workflow composition and event-filtered subscriptions (§4.G).

pub mod subscription;
pub mod workflow;

pub use subscription::Subscription;
pub use workflow::{ErrorHandlerFn, ReconcileClosure, Workflow, WorkflowOutcome};
