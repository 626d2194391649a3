//! Control-surface config loader (strict parsing).

pub mod schema;

use std::fs;

use p2p_http_core::error::{P2pHttpError, Result};

pub use schema::{AppConfig, AuthSection, ControlSection, GatewaySection, PipelineMode};

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| P2pHttpError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<AppConfig> {
    let cfg: AppConfig = serde_yaml::from_str(s)
        .map_err(|e| P2pHttpError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
