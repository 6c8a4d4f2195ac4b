//! The controller loop: cache-backed runnables feeding topology rebuilds
//! and reconcile dispatch (§4.F).

pub mod channel_runnable;
pub mod controller;
pub mod error;
pub mod runnable;

pub use channel_runnable::{IncrementalInformer, IncrementalMessage, StateBatch, StateReconciler};
pub use controller::{Controller, ControllerConfig, ReconcileContext, ReconcileFn, StartError, TopologyBuilderFn};
pub use error::ReconcileError;
pub use runnable::{Runnable, SyncFlag};
