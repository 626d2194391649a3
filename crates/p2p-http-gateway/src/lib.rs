//! p2p-http gateway library entry.
//!
//! Wires the core primitives (log sink, stats poller, peer projection) into an
//! axum control surface: config loading, per-route access policy, the ops
//! handlers, and an in-memory runtime used by the binary and integration tests.

pub mod config;
pub mod error;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod runtime;
pub mod surface;

pub use error::ApiError;
pub use surface::ControlSurface;
