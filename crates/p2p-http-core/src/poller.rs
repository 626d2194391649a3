//! Background change-detector for runtime statistics.
//!
//! One worker thread samples a [`StatsProvider`] on an interval and pushes a
//! summary line into the [`LogSink`] only when the sample differs from the
//! last one it emitted. The poller is an owned object: `start` is idempotent
//! (compare-and-set on `started`), `stop` wakes the worker, joins it, and
//! re-arms the poller for a later `start`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{P2pHttpError, Result};
use crate::log_sink::LogSink;
use crate::stats::{StatsProvider, StatsSnapshot};

/// Interval used when the configured one is non-positive.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Clamp a configured interval; `<= 0` falls back to [`DEFAULT_INTERVAL_MS`].
pub fn effective_interval(interval_ms: i64) -> Duration {
    match u64::try_from(interval_ms) {
        Ok(ms) if ms > 0 => Duration::from_millis(ms),
        _ => Duration::from_millis(DEFAULT_INTERVAL_MS),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running,
    StopRequested,
}

/// Last-emitted snapshot plus the comparison rule.
///
/// Starts from an all-zero snapshot, so a runtime with no activity yet
/// produces no line.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: StatsSnapshot,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the summary line when `sample` differs from the retained one.
    pub fn observe(&mut self, sample: StatsSnapshot) -> Option<String> {
        if sample == self.last {
            return None;
        }
        self.last = sample;
        Some(sample.summary_line())
    }

    pub fn last(&self) -> &StatsSnapshot {
        &self.last
    }
}

/// Stop flag plus a condvar so the inter-sample wait is cancellable.
#[derive(Default)]
struct StopSignal {
    stop: AtomicBool,
    lock: Mutex<()>,
    cv: Condvar,
}

impl StopSignal {
    fn requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.stop.store(false, Ordering::Release);
    }

    fn request(&self) {
        self.stop.store(true, Ordering::Release);
        // take the lock so a worker between its flag check and its wait cannot miss the notify
        let _g = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.cv.notify_all();
    }

    /// Sleep up to `d`; returns true when stop was requested.
    fn wait(&self, d: Duration) -> bool {
        let g = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let _ = self
            .cv
            .wait_timeout_while(g, d, |_| !self.requested())
            .unwrap_or_else(|p| p.into_inner());
        self.requested()
    }
}

pub struct StatsPoller {
    started: AtomicBool,
    signal: Arc<StopSignal>,
    worker: Mutex<Option<JoinHandle<()>>>,
    samples: Arc<AtomicU64>,
}

impl Default for StatsPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsPoller {
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            signal: Arc::new(StopSignal::default()),
            worker: Mutex::new(None),
            samples: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start the worker unless one is already active.
    ///
    /// Returns `Ok(true)` if this call started the loop, `Ok(false)` if a loop
    /// was already running. Never waits on the loop itself.
    pub fn start(
        &self,
        provider: Arc<dyn StatsProvider>,
        interval_ms: i64,
        sink: Arc<LogSink>,
    ) -> Result<bool> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        let interval = effective_interval(interval_ms);
        let mut slot = self.worker_slot();
        self.signal.reset();

        let signal = Arc::clone(&self.signal);
        let samples = Arc::clone(&self.samples);
        let spawned = thread::Builder::new()
            .name("p2p-stats-poller".to_string())
            .spawn(move || run_loop(provider, interval, sink, signal, samples));

        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                info!(interval_ms = interval.as_millis() as u64, "stats poller started");
                Ok(true)
            }
            Err(e) => {
                self.started.store(false, Ordering::Release);
                Err(P2pHttpError::Internal(format!("spawn stats poller failed: {e}")))
            }
        }
    }

    /// Stop and join the worker. No-op when nothing is running.
    pub fn stop(&self) {
        let mut slot = self.worker_slot();
        let Some(handle) = slot.take() else { return };

        self.signal.request();
        if handle.join().is_err() {
            warn!("stats poller thread panicked");
        }
        self.started.store(false, Ordering::Release);
        info!("stats poller stopped");
    }

    pub fn state(&self) -> PollerState {
        if !self.started.load(Ordering::Acquire) {
            PollerState::Idle
        } else if self.signal.requested() {
            PollerState::StopRequested
        } else {
            PollerState::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == PollerState::Running
    }

    /// Loop-body entries across every run of this poller.
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    fn worker_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.worker.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for StatsPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    provider: Arc<dyn StatsProvider>,
    interval: Duration,
    sink: Arc<LogSink>,
    signal: Arc<StopSignal>,
    samples: Arc<AtomicU64>,
) {
    let mut detector = ChangeDetector::new();

    loop {
        if signal.requested() {
            break;
        }
        samples.fetch_add(1, Ordering::Relaxed);

        match sample(provider.as_ref()) {
            Ok(snapshot) => {
                if let Some(line) = detector.observe(snapshot) {
                    sink.push(line);
                }
            }
            Err(e) => {
                warn!(error = %e, "stats sample failed, treating as unchanged");
            }
        }

        if signal.wait(interval) {
            break;
        }
    }

    debug!("stats poller loop exited");
}

/// One provider read; a panicking provider counts as a failed sample.
fn sample(provider: &dyn StatsProvider) -> Result<StatsSnapshot> {
    panic::catch_unwind(AssertUnwindSafe(|| provider.stats())).unwrap_or_else(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(P2pHttpError::Internal(format!("stats provider panicked: {msg}")))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};
    use std::thread::ThreadId;
    use std::time::Instant;

    fn wait_until(mut f: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if f() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn peers(n: u64) -> StatsSnapshot {
        StatsSnapshot { peers_total: n, ..Default::default() }
    }

    /// Plays back a fixed script, then repeats the last entry.
    struct Scripted {
        script: Mutex<VecDeque<Result<StatsSnapshot>>>,
        last: Mutex<StatsSnapshot>,
        remaining: AtomicU64,
    }

    impl Scripted {
        fn new(script: Vec<Result<StatsSnapshot>>) -> Arc<Self> {
            Arc::new(Self {
                remaining: AtomicU64::new(script.len() as u64),
                script: Mutex::new(script.into()),
                last: Mutex::new(StatsSnapshot::default()),
            })
        }

        fn drained(&self) -> bool {
            self.remaining.load(Ordering::SeqCst) == 0
        }
    }

    impl StatsProvider for Scripted {
        fn stats(&self) -> Result<StatsSnapshot> {
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(r) => {
                    if let Ok(s) = &r {
                        *self.last.lock().unwrap() = *s;
                    }
                    self.remaining.fetch_sub(1, Ordering::SeqCst);
                    r
                }
                None => Ok(*self.last.lock().unwrap()),
            }
        }
    }

    /// Records which threads sampled it.
    #[derive(Default)]
    struct ThreadTracker {
        seen: Mutex<HashSet<ThreadId>>,
        calls: AtomicU64,
    }

    impl StatsProvider for ThreadTracker {
        fn stats(&self) -> Result<StatsSnapshot> {
            self.seen.lock().unwrap().insert(thread::current().id());
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(peers(n + 1))
        }
    }

    /// Panics on its first `failures` reads, then reports `peers(7)`.
    struct Flaky {
        failures: u64,
        calls: AtomicU64,
    }

    impl StatsProvider for Flaky {
        #[allow(clippy::panic)]
        fn stats(&self) -> Result<StatsSnapshot> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                panic!("stats backend exploded");
            }
            Ok(peers(7))
        }
    }

    #[test]
    fn interval_floor() {
        assert_eq!(effective_interval(0), Duration::from_millis(1000));
        assert_eq!(effective_interval(-25), Duration::from_millis(1000));
        assert_eq!(effective_interval(250), Duration::from_millis(250));
    }

    #[test]
    fn detector_emits_only_on_change() {
        let mut d = ChangeDetector::new();
        assert!(d.observe(StatsSnapshot::default()).is_none());

        let mut emitted = 0;
        for s in [peers(1), peers(1), peers(1), peers(2), peers(2), peers(1)] {
            if d.observe(s).is_some() {
                emitted += 1;
            }
        }
        // 0->1, 1->2, 2->1
        assert_eq!(emitted, 3);
        assert_eq!(d.last(), &peers(1));
    }

    #[test]
    fn identical_samples_emit_at_most_one_line() {
        let sink = Arc::new(LogSink::new(100));
        let provider = Scripted::new((0..6).map(|_| Ok(peers(4))).collect());
        let poller = StatsPoller::new();

        assert!(poller.start(provider.clone(), 1, Arc::clone(&sink)).unwrap());
        assert!(wait_until(|| provider.drained()));
        poller.stop();

        assert_eq!(sink.len(), 1);
        assert!(sink.dump().starts_with("[p2p] peers=4 "));
    }

    #[test]
    fn one_line_per_transition() {
        let sink = Arc::new(LogSink::new(100));
        let script = vec![Ok(peers(1)), Ok(peers(1)), Ok(peers(2)), Ok(peers(2)), Ok(peers(3))];
        let provider = Scripted::new(script);
        let poller = StatsPoller::new();

        poller.start(provider.clone(), 1, Arc::clone(&sink)).unwrap();
        assert!(wait_until(|| provider.drained()));
        assert!(wait_until(|| sink.len() == 3));
        poller.stop();

        let lines = sink.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[p2p] peers=1 "));
        assert!(lines[1].starts_with("[p2p] peers=2 "));
        assert!(lines[2].starts_with("[p2p] peers=3 "));
    }

    #[test]
    fn failed_sample_does_not_stop_the_loop() {
        let sink = Arc::new(LogSink::new(100));
        let script = vec![
            Err(P2pHttpError::Unavailable("booting".into())),
            Err(P2pHttpError::Unavailable("booting".into())),
            Ok(peers(5)),
        ];
        let provider = Scripted::new(script);
        let poller = StatsPoller::new();

        poller.start(provider.clone(), 1, Arc::clone(&sink)).unwrap();
        assert!(wait_until(|| sink.len() == 1));
        assert!(poller.is_running());
        poller.stop();
        assert!(sink.dump().starts_with("[p2p] peers=5 "));
    }

    #[test]
    fn panicking_provider_does_not_kill_the_loop() {
        let sink = Arc::new(LogSink::new(100));
        let provider = Arc::new(Flaky { failures: 3, calls: AtomicU64::new(0) });
        let poller = StatsPoller::new();

        assert!(poller.start(provider.clone(), 1, Arc::clone(&sink)).unwrap());
        assert!(wait_until(|| sink.len() == 1));
        assert!(provider.calls.load(Ordering::SeqCst) > 3);
        assert_eq!(poller.state(), PollerState::Running);
        assert!(!poller.start(provider.clone(), 1, Arc::clone(&sink)).unwrap());

        poller.stop();
        assert_eq!(poller.state(), PollerState::Idle);
        assert!(sink.dump().starts_with("[p2p] peers=7 "));
        assert!(poller.start(provider, 1, Arc::clone(&sink)).unwrap());
    }

    #[test]
    fn concurrent_start_runs_one_loop() {
        let sink = Arc::new(LogSink::new(1000));
        let tracker = Arc::new(ThreadTracker::default());
        let poller = Arc::new(StatsPoller::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let poller = Arc::clone(&poller);
                let tracker: Arc<dyn StatsProvider> = tracker.clone();
                let sink = Arc::clone(&sink);
                thread::spawn(move || poller.start(tracker, 2, sink).unwrap())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|started| *started)
            .count();
        assert_eq!(winners, 1);

        assert!(wait_until(|| tracker.calls.load(Ordering::SeqCst) >= 5));
        poller.stop();

        assert_eq!(tracker.seen.lock().unwrap().len(), 1);
        // single stream: one sample per loop-body entry
        assert_eq!(tracker.calls.load(Ordering::SeqCst), poller.samples());
    }

    #[test]
    fn stop_is_prompt_and_restart_rearms() {
        let sink = Arc::new(LogSink::new(10));
        let tracker = Arc::new(ThreadTracker::default());
        let poller = StatsPoller::new();

        // never started
        poller.stop();
        assert_eq!(poller.state(), PollerState::Idle);

        poller.start(tracker.clone(), 60_000, Arc::clone(&sink)).unwrap();
        assert!(!poller.start(tracker.clone(), 60_000, Arc::clone(&sink)).unwrap());
        assert!(wait_until(|| poller.samples() == 1));

        let t0 = Instant::now();
        poller.stop();
        assert!(t0.elapsed() < Duration::from_secs(5));
        assert_eq!(poller.state(), PollerState::Idle);

        assert!(poller.start(tracker.clone(), 60_000, Arc::clone(&sink)).unwrap());
        assert!(wait_until(|| poller.samples() == 2));
        assert!(poller.is_running());
        drop(poller);
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 2);
    }
}
