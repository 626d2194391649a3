//! Control surface: the set of ops endpoints plus the resources they share.
//!
//! Owns the log sink, the stats poller and the route pipeline. Registration
//! installs the enabled endpoints under the configured prefix and, when live
//! logs are on, starts the poller (idempotent). `shutdown` stops and joins it.

use std::sync::Arc;

use axum::{routing::MethodFilter, Router};

use p2p_http_core::error::Result;
use p2p_http_core::log_sink::{LineForwarder, LogSink};
use p2p_http_core::peer::PeerRegistry;
use p2p_http_core::poller::StatsPoller;
use p2p_http_core::stats::StatsProvider;

use crate::config::ControlSection;
use crate::ops;
use crate::policy::{endpoint, install, pipeline_for, AccessHooks, RoutePipeline, RoutePolicy};

pub const DEFAULT_PREFIX: &str = "/p2p";

/// Policy of the admin placeholder route.
pub const ADMIN_POLICY: RoutePolicy = RoutePolicy { heavy: true, require_auth: true };

#[derive(Clone)]
pub struct ControlSurface {
    inner: Arc<SurfaceInner>,
}

struct SurfaceInner {
    cfg: ControlSection,
    stats: Arc<dyn StatsProvider>,
    peers: Arc<dyn PeerRegistry>,
    sink: Arc<LogSink>,
    poller: StatsPoller,
    pipeline: Box<dyn RoutePipeline>,
}

impl ControlSurface {
    /// Build from a runtime exposing both stats and peers.
    pub fn new<R>(cfg: ControlSection, hooks: AccessHooks, runtime: Arc<R>) -> Self
    where
        R: StatsProvider + PeerRegistry + 'static,
    {
        let stats: Arc<dyn StatsProvider> = runtime.clone();
        let peers: Arc<dyn PeerRegistry> = runtime;
        Self::with_parts(cfg, hooks, stats, peers)
    }

    pub fn with_parts(
        cfg: ControlSection,
        hooks: AccessHooks,
        stats: Arc<dyn StatsProvider>,
        peers: Arc<dyn PeerRegistry>,
    ) -> Self {
        let sink = Arc::new(LogSink::new(cfg.log_capacity));
        let pipeline = pipeline_for(cfg.pipeline, hooks);
        Self {
            inner: Arc::new(SurfaceInner {
                cfg,
                stats,
                peers,
                sink,
                poller: StatsPoller::new(),
                pipeline,
            }),
        }
    }

    pub fn cfg(&self) -> &ControlSection {
        &self.inner.cfg
    }

    pub fn log_sink(&self) -> Arc<LogSink> {
        Arc::clone(&self.inner.sink)
    }

    pub fn poller(&self) -> &StatsPoller {
        &self.inner.poller
    }

    /// Stream every new log line to `forwarder` (`None` detaches).
    pub fn set_live_log_forwarder(&self, forwarder: Option<LineForwarder>) {
        self.inner.sink.set_forwarder(forwarder);
    }

    /// Full path for an endpoint suffix under the configured prefix.
    pub fn path(&self, suffix: &str) -> String {
        route_path(&self.inner.cfg.prefix, suffix)
    }

    /// Install the enabled endpoints on `router`.
    pub fn register(&self, router: Router) -> Result<Router> {
        let inner = &self.inner;
        let cfg = &inner.cfg;
        let pipeline = inner.pipeline.as_ref();
        let mut router = router;

        if cfg.enable_ping {
            let stats = Arc::clone(&inner.stats);
            router = install(
                router,
                pipeline,
                MethodFilter::GET,
                &self.path("/ping"),
                RoutePolicy::OPEN,
                endpoint(move |_req| {
                    let stats = Arc::clone(&stats);
                    async move { ops::ping(stats.as_ref()) }
                }),
            );
        }

        if cfg.enable_status {
            let stats = Arc::clone(&inner.stats);
            router = install(
                router,
                pipeline,
                MethodFilter::GET,
                &self.path("/status"),
                RoutePolicy::OPEN,
                endpoint(move |_req| {
                    let stats = Arc::clone(&stats);
                    async move { ops::status(stats.as_ref()) }
                }),
            );
        }

        if cfg.enable_peers {
            let peers = Arc::clone(&inner.peers);
            router = install(
                router,
                pipeline,
                MethodFilter::GET,
                &self.path("/peers"),
                RoutePolicy::OPEN,
                endpoint(move |_req| {
                    let peers = Arc::clone(&peers);
                    async move { ops::peers(peers.as_ref()) }
                }),
            );
        }

        if cfg.enable_logs {
            let sink = Arc::clone(&inner.sink);
            router = install(
                router,
                pipeline,
                MethodFilter::GET,
                &self.path("/logs"),
                RoutePolicy::OPEN,
                endpoint(move |_req| {
                    let sink = Arc::clone(&sink);
                    async move { ops::logs(&sink) }
                }),
            );
        }

        router = install(
            router,
            pipeline,
            MethodFilter::POST,
            &self.path("/admin/hook"),
            ADMIN_POLICY,
            endpoint(|_req| async { ops::admin_hook() }),
        );

        if cfg.live_logs_active() {
            inner.poller.start(
                Arc::clone(&inner.stats),
                cfg.stats_every_ms,
                Arc::clone(&inner.sink),
            )?;
        }

        let base = self.path("");
        inner.sink.push(format!(
            "[{}] routes registered at {} ({:?} pipeline)",
            ops::MODULE,
            base,
            pipeline.mode()
        ));
        tracing::info!(prefix = %base, mode = ?pipeline.mode(), "control surface registered");

        Ok(router)
    }

    /// `register` onto a fresh router.
    pub fn routes(&self) -> Result<Router> {
        self.register(Router::new())
    }

    /// Stop the poller; a later `register` may start it again.
    pub fn shutdown(&self) {
        self.inner.poller.stop();
    }
}

/// Normalize and join `base` and `path`.
///
/// Both get a leading `/` and lose trailing `/` (except a bare `/`). An empty
/// base yields the path alone; an empty or `/` path yields the base.
pub fn join_prefix(base: &str, path: &str) -> String {
    let base = normalize(base);
    let path = normalize(path);

    if base.is_empty() {
        return if path.is_empty() { "/".to_string() } else { path };
    }
    if path.is_empty() || path == "/" {
        return base;
    }
    if base == "/" {
        return path;
    }
    base + &path
}

/// Join under `prefix`, falling back to [`DEFAULT_PREFIX`] when it is empty.
pub fn route_path(prefix: &str, suffix: &str) -> String {
    let base = if prefix.is_empty() { DEFAULT_PREFIX } else { prefix };
    join_prefix(base, suffix)
}

fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 1);
    if !s.is_empty() && !s.starts_with('/') {
        out.push('/');
    }
    out.push_str(s);
    while out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_normalization() {
        assert_eq!(route_path("", "/ping"), "/p2p/ping");
        assert_eq!(route_path("/p2p/", "/ping"), "/p2p/ping");
        assert_eq!(join_prefix("/", ""), "/");
        assert_eq!(join_prefix("p2p", "ping/"), "/p2p/ping");
        assert_eq!(join_prefix("/ops//", "/admin/hook"), "/ops/admin/hook");
        assert_eq!(join_prefix("/", "/ping"), "/ping");
        assert_eq!(join_prefix("", ""), "/");
        assert_eq!(join_prefix("/p2p", "/"), "/p2p");
    }
}
