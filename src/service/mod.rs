//! Policy Graph Kernel demonstration REST service (`service` feature).
//!
//! Exposes the topology builder and query surface over HTTP for manual
//! exploration; not the embedding API (that's [`crate::runtime::Controller`]
//! plus [`crate::gateway::GatewayApiBuilder`] directly).
//!
//! ## Endpoints
//!
//! - `POST /api/topology/rebuild` - rebuild the topology from a posted set
//!   of targetables and policies
//! - `GET /api/topology/paths?from=&to=` - enumerate paths between two
//!   locators
//! - `GET /api/topology/dot` - render the current topology as DOT
//! - `GET /health/live`, `GET /health/ready` - liveness/readiness probes

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{RawPolicy, RawTargetable, RebuildRequest, ServiceState, TargetableRole};
