//! Log forwarding helpers for live log consumers.

pub mod live;

pub use live::channel_forwarder;
