//! Read-only peer projection.
//!
//! `PeerInfo` is what the runtime hands out; `PeerView` is what goes over the
//! wire. Key material never leaves this module, only its length.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::Result;

/// Connection lifecycle of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerState {
    Disconnected,
    Connecting,
    Handshaking,
    Connected,
    Stale,
    Closed,
}

/// Security handshake progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeStage {
    #[default]
    None,
    HelloSent,
    HelloReceived,
    AckSent,
    AckReceived,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerEndpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

/// Runtime-side peer state (consumed, never mutated here).
#[derive(Debug, Clone)]
pub struct PeerInfo {
    pub state: PeerState,
    pub endpoint: Option<PeerEndpoint>,
    pub handshake: HandshakeStage,
    /// When the current handshake stage was entered.
    pub handshake_since: Option<Instant>,
    pub public_key: Vec<u8>,
    pub session_key: Option<Vec<u8>>,
    pub capabilities: Vec<String>,
    pub last_seen: Option<Instant>,
}

impl PeerInfo {
    pub fn new(state: PeerState) -> Self {
        Self {
            state,
            endpoint: None,
            handshake: HandshakeStage::None,
            handshake_since: None,
            public_key: Vec::new(),
            session_key: None,
            capabilities: Vec::new(),
            last_seen: None,
        }
    }
}

/// Point-in-time mapping of peer id to state, as exposed by the runtime.
pub type PeerTable = HashMap<String, PeerInfo>;

/// Read-only access to the runtime's peer table.
///
/// Returns `P2pHttpError::Unavailable` while the node is not ready.
pub trait PeerRegistry: Send + Sync {
    fn peers(&self) -> Result<PeerTable>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandshakeView {
    pub stage: HandshakeStage,
    pub age_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerMetaView {
    pub public_key_len: usize,
    pub session_key_len: usize,
    pub capabilities: usize,
    pub last_seen_ms: Option<u64>,
}

/// Wire shape of one peer in `/peers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerView {
    pub id: String,
    pub state: PeerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<PeerEndpoint>,
    pub handshake: HandshakeView,
    pub meta: PeerMetaView,
}

impl PeerView {
    pub fn project(id: &str, info: &PeerInfo, now: Instant) -> Self {
        Self {
            id: id.to_string(),
            state: info.state,
            endpoint: info.endpoint.clone(),
            handshake: HandshakeView {
                stage: info.handshake,
                age_ms: info.handshake_since.map(|t| millis_since(t, now)).unwrap_or(0),
            },
            meta: PeerMetaView {
                public_key_len: info.public_key.len(),
                session_key_len: info.session_key.as_ref().map(Vec::len).unwrap_or(0),
                capabilities: info.capabilities.len(),
                last_seen_ms: info.last_seen.map(|t| millis_since(t, now)),
            },
        }
    }
}

/// Project a whole table, sorted by peer id ascending.
pub fn project_sorted(table: &PeerTable, now: Instant) -> Vec<PeerView> {
    let mut ids: Vec<&String> = table.keys().collect();
    ids.sort();
    ids.into_iter()
        .filter_map(|id| table.get(id).map(|info| PeerView::project(id, info, now)))
        .collect()
}

// Instants from the future (clock skew between snapshot and request) clamp to zero.
fn millis_since(t: Instant, now: Instant) -> u64 {
    let d = now.checked_duration_since(t).unwrap_or(Duration::ZERO);
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
