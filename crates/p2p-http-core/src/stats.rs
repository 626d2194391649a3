//! Runtime statistics snapshot and the provider seam.
//!
//! The P2P runtime owns its counters; this module only defines the immutable
//! point-in-time view handed to the control surface and the poller.

use std::fmt::Write;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// Point-in-time read of the P2P runtime counters.
///
/// Equality is field-wise over every counter, which is what the poller uses
/// to decide whether a sample is worth a log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub peers_total: u64,
    pub peers_connected: u64,
    pub handshakes_started: u64,
    pub handshakes_completed: u64,
    pub connect_attempts: u64,
    pub connect_deduped: u64,
    pub connect_failures: u64,
    pub backoff_skips: u64,
    pub tracked_endpoints: u64,
}

impl StatsSnapshot {
    /// Stable one-line summary used by the poller.
    ///
    /// Labels and order are scraped by operators; do not reorder.
    pub fn summary_line(&self) -> String {
        let mut out = String::with_capacity(160);
        let _ = write!(
            out,
            "[p2p] peers={} connected={} hs_started={} hs_completed={} \
             connect_attempts={} connect_deduped={} connect_failures={} \
             backoff_skips={} tracked_endpoints={}",
            self.peers_total,
            self.peers_connected,
            self.handshakes_started,
            self.handshakes_completed,
            self.connect_attempts,
            self.connect_deduped,
            self.connect_failures,
            self.backoff_skips,
            self.tracked_endpoints,
        );
        out
    }

    /// Counters as a JSON object, for merging into endpoint bodies.
    pub fn to_json_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Read-only access to the runtime counters.
///
/// Implementations must be cheap and non-blocking; the poller calls this on
/// its own thread and request handlers call it inline.
pub trait StatsProvider: Send + Sync {
    fn stats(&self) -> Result<StatsSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_is_stable() {
        let s = StatsSnapshot {
            peers_total: 3,
            peers_connected: 2,
            handshakes_started: 5,
            handshakes_completed: 4,
            connect_attempts: 9,
            connect_deduped: 1,
            connect_failures: 2,
            backoff_skips: 0,
            tracked_endpoints: 7,
        };
        assert_eq!(
            s.summary_line(),
            "[p2p] peers=3 connected=2 hs_started=5 hs_completed=4 connect_attempts=9 \
             connect_deduped=1 connect_failures=2 backoff_skips=0 tracked_endpoints=7"
        );
    }

    #[test]
    fn json_map_carries_every_counter() {
        let map = StatsSnapshot { peers_total: 1, ..Default::default() }.to_json_map();
        assert_eq!(map.len(), 9);
        assert_eq!(map.get("peers_total"), Some(&Value::from(1u64)));
        assert_eq!(map.get("tracked_endpoints"), Some(&Value::from(0u64)));
    }
}
