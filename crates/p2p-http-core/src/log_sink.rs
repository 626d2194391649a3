//! Bounded in-memory log buffer.
//!
//! Request handlers and the stats poller append lines; `/logs` reads the whole
//! buffer. When full, the oldest line is evicted before the new one lands.
//! An optional forwarder receives every pushed line after the lock is
//! released, so a slow consumer never stretches the critical section.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Default number of retained lines.
pub const DEFAULT_CAPACITY: usize = 800;

/// Callback receiving each pushed line (live streaming, external shipping).
/// Must return quickly; it runs on the pushing thread.
pub type LineForwarder = Arc<dyn Fn(&str) + Send + Sync>;

pub struct LogSink {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
    forwarder: RwLock<Option<LineForwarder>>,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LogSink {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            forwarder: RwLock::new(None),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one line, evicting the oldest when at capacity.
    pub fn push(&self, line: impl Into<String>) {
        let line = line.into();
        let forwarder = self.forwarder();

        match forwarder {
            Some(fwd) => {
                {
                    let mut g = self.guard();
                    Self::push_locked(&mut g, self.capacity, line.clone());
                }
                fwd(&line);
            }
            None => {
                let mut g = self.guard();
                Self::push_locked(&mut g, self.capacity, line);
            }
        }
    }

    /// All held lines in insertion order, each terminated by `\n`.
    pub fn dump(&self) -> String {
        let g = self.guard();
        let mut out = String::with_capacity(g.iter().map(|l| l.len() + 1).sum());
        for l in g.iter() {
            out.push_str(l);
            out.push('\n');
        }
        out
    }

    /// Snapshot of the held lines.
    pub fn lines(&self) -> Vec<String> {
        self.guard().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Install (or clear, with `None`) the live forwarder.
    pub fn set_forwarder(&self, forwarder: Option<LineForwarder>) {
        match self.forwarder.write() {
            Ok(mut g) => *g = forwarder,
            Err(poisoned) => *poisoned.into_inner() = forwarder,
        }
    }

    fn forwarder(&self) -> Option<LineForwarder> {
        match self.forwarder.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push_locked(buf: &mut VecDeque<String>, capacity: usize, line: String) {
        while buf.len() >= capacity {
            buf.pop_front();
        }
        buf.push_back(line);
    }

    // push_back is the last step of a push; a poisoned guard never holds a partial entry.
    fn guard(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn capacity_three_keeps_last_three() {
        let sink = LogSink::new(3);
        for l in ["1", "2", "3", "4"] {
            sink.push(l);
        }
        assert_eq!(sink.dump(), "2\n3\n4\n");
    }

    #[test]
    fn bounded_fifo_for_many_lengths() {
        for n in [0usize, 1, 4, 5, 6, 50] {
            let sink = LogSink::new(5);
            for i in 0..n {
                sink.push(i.to_string());
            }
            let expect: Vec<String> = (n.saturating_sub(5)..n).map(|i| i.to_string()).collect();
            assert_eq!(sink.lines(), expect, "n={n}");
            assert_eq!(sink.len(), n.min(5));
        }
    }

    #[test]
    fn empty_dump_is_empty_string() {
        let sink = LogSink::default();
        assert_eq!(sink.capacity(), DEFAULT_CAPACITY);
        assert!(sink.is_empty());
        assert_eq!(sink.dump(), "");
    }

    #[test]
    fn concurrent_writers_never_exceed_capacity() {
        let sink = Arc::new(LogSink::new(64));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..500 {
                        sink.push(format!("t{t}-{i}"));
                        assert!(sink.len() <= 64);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let lines = sink.lines();
        assert_eq!(lines.len(), 64);
        // per-writer order survives interleaving
        for t in 0..8 {
            let prefix = format!("t{t}-");
            let seq: Vec<usize> = lines
                .iter()
                .filter_map(|l| l.strip_prefix(&prefix))
                .filter_map(|n| n.parse().ok())
                .collect();
            assert!(seq.windows(2).all(|w| w[0] < w[1]), "writer {t} reordered");
        }
    }

    #[test]
    fn forwarder_sees_each_line_once() {
        let sink = LogSink::new(2);
        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        sink.set_forwarder(Some(Arc::new(move |_line: &str| {
            s.fetch_add(1, Ordering::Relaxed);
        })));

        for i in 0..5 {
            sink.push(format!("line {i}"));
        }
        assert_eq!(seen.load(Ordering::Relaxed), 5);
        assert_eq!(sink.len(), 2);

        sink.set_forwarder(None);
        sink.push("quiet");
        assert_eq!(seen.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn forwarder_may_read_the_sink() {
        let sink = Arc::new(LogSink::new(4));
        let inner = Arc::clone(&sink);
        let observed = Arc::new(AtomicUsize::new(0));
        let o = Arc::clone(&observed);
        sink.set_forwarder(Some(Arc::new(move |_line: &str| {
            // lock is released before forwarding
            o.store(inner.len(), Ordering::Relaxed);
        })));
        sink.push("a");
        assert_eq!(observed.load(Ordering::Relaxed), 1);
        sink.set_forwarder(None);
    }
}
