use serde::Deserialize;
use p2p_http_core::error::{P2pHttpError, Result};
use p2p_http_core::log_sink::DEFAULT_CAPACITY;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub control: ControlSection,

    #[serde(default)]
    pub auth: AuthSection,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(P2pHttpError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.control.validate()?;
        self.auth.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

/// How route access stages are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// axum middleware layers per route.
    #[default]
    Middleware,
    /// Stages run inline inside the handler.
    Legacy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlSection {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_true")]
    pub enable_ping: bool,
    #[serde(default = "default_true")]
    pub enable_status: bool,
    #[serde(default = "default_true")]
    pub enable_logs: bool,
    #[serde(default = "default_true")]
    pub enable_live_logs: bool,
    #[serde(default = "default_true")]
    pub enable_peers: bool,

    /// Non-positive values fall back to 1000 ms.
    #[serde(default = "default_stats_every_ms")]
    pub stats_every_ms: i64,

    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    #[serde(default)]
    pub pipeline: PipelineMode,
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            enable_ping: true,
            enable_status: true,
            enable_logs: true,
            enable_live_logs: true,
            enable_peers: true,
            stats_every_ms: default_stats_every_ms(),
            log_capacity: default_log_capacity(),
            pipeline: PipelineMode::default(),
        }
    }
}

impl ControlSection {
    pub fn validate(&self) -> Result<()> {
        if self.log_capacity == 0 {
            return Err(P2pHttpError::BadRequest(
                "control.log_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Live polling only makes sense when the log endpoint exists.
    pub fn live_logs_active(&self) -> bool {
        self.enable_logs && self.enable_live_logs
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// Static bearer token for protected routes. Absent => always 401.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.bearer_token, Some(t) if t.trim().is_empty()) {
            return Err(P2pHttpError::BadRequest(
                "auth.bearer_token must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_prefix() -> String {
    "/p2p".into()
}
fn default_true() -> bool {
    true
}
fn default_stats_every_ms() -> i64 {
    1000
}
fn default_log_capacity() -> usize {
    DEFAULT_CAPACITY
}
