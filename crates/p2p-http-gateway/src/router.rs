//! Axum router wiring for the standalone binary.
//!
//! Hosts embedding the control surface call `ControlSurface::register` on
//! their own router instead.

use axum::{routing::get, Router};

use p2p_http_core::error::Result;

use crate::surface::ControlSurface;

pub fn build_router(surface: &ControlSurface) -> Result<Router> {
    let router = Router::new().route("/healthz", get(|| async { "ok" }));
    surface.register(router)
}
