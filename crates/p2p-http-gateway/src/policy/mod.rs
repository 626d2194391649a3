//! Route access policy (auth gate, heavy tag).
//!
//! A route's `{heavy, require_auth}` flags resolve once into an ordered list
//! of stages; a [`RoutePipeline`] then turns that list into an axum route,
//! either as middleware layers or inline inside the handler.

pub mod bearer;
pub mod hooks;
pub mod pipeline;
pub mod route;

pub use hooks::{AccessHooks, AuthContext, AuthHook, LegacyAuthHook, ResponseWriter};
pub use pipeline::{endpoint, install, pipeline_for, Endpoint, InlinePipeline, MiddlewarePipeline, RoutePipeline};
pub use route::{RoutePolicy, Stage, HEAVY_HEADER};
