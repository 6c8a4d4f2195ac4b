//! # policy-graph-kernel
//!
//! A policy-attachment engine for a graph of networking resources.
//!
//! > Given a networking resource (a route, a listener, a service port),
//! > which policies are effective on it, and through which chain of
//! > attachment?
//!
//! ## Core Contract
//!
//! 1. Admit targetables, policies, and free objects into a [`Topology`]
//! 2. Resolve structural edges via pluggable link functions (§4.C/§4.D)
//! 3. Query parent/child/path relationships and merge attached policies
//!    along a path into one effective [`Policy`] (§4.B/§4.C)
//! 4. Keep the topology current as a [`runtime::Controller`] observes a
//!    live cache of resources and re-derives it on every admitted mutation
//!
//! ## Architecture
//!
//! ```text
//! Runnable(s) -> Cache -> Controller -> GatewayApiBuilder -> Topology -> Workflow/Subscription
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Policy attachment order per targetable: creation timestamp, then
//!   `namespace/name` (§5)
//! - Locator grammar is canonical and total: every admitted object has
//!   exactly one locator (§2)
//! - DOT projection renders nodes and edges in locator-sorted order

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod cache;
pub mod config;
pub mod gateway;
pub mod policy;
pub mod runtime;
pub mod topology;
pub mod types;
pub mod workflow;

#[cfg(feature = "service")]
pub mod service;

pub use cache::{Cache, CacheError, InMemoryCache, Snapshot};
pub use config::RuntimeConfig;
pub use gateway::GatewayApiBuilder;
pub use policy::merge;
pub use runtime::{Controller, ControllerConfig, ReconcileContext, ReconcileError, Runnable};
pub use topology::{ConstructionError, LinkFunction, Topology, TopologyOptions, TopologyWarning};
pub use types::{
    attachment_order_key, EventKind, EventMatcher, GroupKind, Locator, MergeStrategy, Object, Policy, ResourceEvent,
    ResourceMeta, Rule, TargetRef, Targetable,
};
pub use workflow::{Subscription, Workflow, WorkflowOutcome};

#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Schema version for the locator grammar and merge algebra. Increment on
/// breaking changes to either.
pub const POLICY_GRAPH_SCHEMA_VERSION: &str = "1.0.0";
