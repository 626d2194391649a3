//! HTTP rendering of the shared error type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use p2p_http_core::error::P2pHttpError;

/// Wrapper so core errors can be returned straight from axum handlers.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub P2pHttpError);

impl ApiError {
    /// JSON body: `{ok:false, error:<code>}` plus per-kind detail.
    pub fn body(&self) -> Value {
        let code = self.0.client_code().as_str();
        match &self.0 {
            P2pHttpError::Unauthorized => json!({
                "ok": false,
                "error": code,
                "hint": "auth required",
            }),
            P2pHttpError::Unavailable(_) => json!({
                "ok": false,
                "error": code,
            }),
            P2pHttpError::NotImplemented(msg) => json!({
                "ok": false,
                "status": self.0.status(),
                "error": code,
                "message": msg,
            }),
            P2pHttpError::BadRequest(msg) | P2pHttpError::Internal(msg) => json!({
                "ok": false,
                "error": code,
                "message": msg,
            }),
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// The fixed 401 used whenever no auth hook is configured.
pub fn unauthorized() -> Response {
    ApiError(P2pHttpError::Unauthorized).into_response()
}
