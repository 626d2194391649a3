//! p2p-http core: transport-agnostic observability primitives for a P2P runtime.
//!
//! This crate holds the pieces the HTTP control surface is built from: the
//! error surface, the stats snapshot and its change-only poller, the bounded
//! log sink, and the read-only peer projection. It carries no HTTP or async
//! runtime dependencies so it can be embedded by any host.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Request handlers and the poller thread share these types, so a poisoned
//! lock or a failed stats read must never take the host process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod log_sink;
pub mod peer;
pub mod poller;
pub mod stats;

pub use error::{P2pHttpError, Result};
pub use log_sink::{LineForwarder, LogSink};
pub use poller::StatsPoller;
pub use stats::{StatsProvider, StatsSnapshot};
