//! In-memory P2P runtime stand-in.
//!
//! Implements both read-side seams the control surface consumes. The binary
//! uses it as a placeholder node; integration tests drive it directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;

use p2p_http_core::error::{P2pHttpError, Result};
use p2p_http_core::peer::{PeerInfo, PeerRegistry, PeerTable};
use p2p_http_core::stats::{StatsProvider, StatsSnapshot};

pub struct MemoryRuntime {
    ready: AtomicBool,
    stats: Mutex<StatsSnapshot>,
    peers: DashMap<String, PeerInfo>,
}

impl Default for MemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(true),
            stats: Mutex::new(StatsSnapshot::default()),
            peers: DashMap::new(),
        }
    }

    /// While not ready, the peer registry reports `Unavailable`.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    pub fn set_stats(&self, stats: StatsSnapshot) {
        *self.stats.lock().unwrap_or_else(|p| p.into_inner()) = stats;
    }

    pub fn upsert_peer(&self, id: impl Into<String>, info: PeerInfo) {
        self.peers.insert(id.into(), info);
    }

    pub fn remove_peer(&self, id: &str) -> Option<PeerInfo> {
        self.peers.remove(id).map(|(_, v)| v)
    }
}

impl StatsProvider for MemoryRuntime {
    fn stats(&self) -> Result<StatsSnapshot> {
        Ok(*self.stats.lock().unwrap_or_else(|p| p.into_inner()))
    }
}

impl PeerRegistry for MemoryRuntime {
    fn peers(&self) -> Result<PeerTable> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(P2pHttpError::Unavailable("p2p node not ready".into()));
        }
        Ok(self
            .peers
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect())
    }
}
