//! Control-surface HTTP handlers.
//!
//! - `ping`       : liveness + current counters
//! - `status`     : current counters
//! - `peers`      : sorted peer projection (503 when the node is not ready)
//! - `logs`       : plain-text dump of the log sink
//! - `admin_hook` : placeholder (501) behind auth + heavy tag

use std::time::Instant;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use p2p_http_core::error::P2pHttpError;
use p2p_http_core::log_sink::LogSink;
use p2p_http_core::peer::{project_sorted, PeerRegistry};
use p2p_http_core::stats::StatsProvider;

use crate::error::ApiError;

pub const MODULE: &str = "p2p_http";

pub fn ping(stats: &dyn StatsProvider) -> Response {
    let mut body = Map::new();
    body.insert("ok".into(), Value::Bool(true));
    body.insert("pong".into(), Value::Bool(true));
    body.insert("module".into(), Value::from(MODULE));
    merge_stats(&mut body, stats);
    Json(Value::Object(body)).into_response()
}

pub fn status(stats: &dyn StatsProvider) -> Response {
    let mut body = Map::new();
    body.insert("ok".into(), Value::Bool(true));
    body.insert("module".into(), Value::from(MODULE));
    merge_stats(&mut body, stats);
    Json(Value::Object(body)).into_response()
}

pub fn peers(registry: &dyn PeerRegistry) -> Response {
    let table = match registry.peers() {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(error = %e, "peer registry unavailable");
            let e = match e {
                P2pHttpError::Unavailable(_) => e,
                other => P2pHttpError::Unavailable(other.to_string()),
            };
            return ApiError(e).into_response();
        }
    };

    let views = project_sorted(&table, Instant::now());
    let peers = match serde_json::to_value(&views) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "peer projection failed to serialize");
            Value::Array(Vec::new())
        }
    };

    Json(json!({
        "ok": true,
        "module": MODULE,
        "total": views.len(),
        "peers": peers,
    }))
    .into_response()
}

pub fn logs(sink: &LogSink) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        sink.dump(),
    )
        .into_response()
}

pub fn admin_hook() -> Response {
    ApiError(P2pHttpError::NotImplemented(
        "p2p_http: admin endpoint planned".into(),
    ))
    .into_response()
}

// A failed stats read degrades to the bare body instead of failing the request.
fn merge_stats(body: &mut Map<String, Value>, stats: &dyn StatsProvider) {
    match stats.stats() {
        Ok(s) => body.extend(s.to_json_map()),
        Err(e) => tracing::warn!(error = %e, "stats read failed"),
    }
}
