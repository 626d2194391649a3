//! p2p-http standalone gateway.
//!
//! Serves the control surface for an in-memory runtime:
//! - GET  {prefix}/ping, /status, /peers, /logs
//! - POST {prefix}/admin/hook (bearer auth, heavy)
//!
//! Config path: first argument, default `p2p-http.yaml`.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use p2p_http_gateway::policy::{bearer::bearer_hooks, AccessHooks};
use p2p_http_gateway::runtime::MemoryRuntime;
use p2p_http_gateway::{config, router, ControlSurface};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "p2p-http.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .expect("gateway.listen must be a valid SocketAddr");

    let hooks = match &cfg.auth.bearer_token {
        Some(token) => bearer_hooks(token.clone()),
        None => {
            tracing::warn!("auth.bearer_token not set; protected routes will always return 401");
            AccessHooks::none()
        }
    };

    let runtime = Arc::new(MemoryRuntime::new());
    let surface = ControlSurface::new(cfg.control.clone(), hooks, runtime);
    let app = router::build_router(&surface).expect("control surface registration failed");

    tracing::info!(%listen, "p2p-http gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .expect("server failed");

    surface.shutdown();
}
