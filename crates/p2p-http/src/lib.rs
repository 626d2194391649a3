//! Top-level facade crate for p2p-http.
//!
//! Re-exports core primitives and the axum control surface so hosts can depend on a single crate.

pub mod core {
    pub use p2p_http_core::*;
}

pub mod gateway {
    pub use p2p_http_gateway::*;
}
