//! Static bearer-token hooks.
//!
//! Builds a matching pair (middleware + legacy) so the two pipeline modes
//! stay interchangeable. Token verification beyond a constant comparison is
//! left to the host application's own hooks.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
};

use p2p_http_core::error::P2pHttpError;

use crate::error::ApiError;

use super::hooks::{AccessHooks, AuthContext, ResponseWriter};

/// Hooks accepting `Authorization: Bearer <token>`.
pub fn bearer_hooks(token: impl Into<String>) -> AccessHooks {
    let token: Arc<str> = Arc::from(token.into());

    let ctx_token = Arc::clone(&token);
    let legacy_token = token;

    AccessHooks::none()
        .with_auth(Arc::new(move |ctx: &mut AuthContext<'_>| {
            if presented(ctx.request_headers()) == Some(&*ctx_token) {
                return true;
            }
            let denied = ApiError(P2pHttpError::Unauthorized);
            ctx.insert_header(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            ctx.respond((denied.status(), axum::Json(denied.body())));
            false
        }))
        .with_legacy(Arc::new(move |req: &Request, res: &mut ResponseWriter| {
            if presented(req.headers()) == Some(&*legacy_token) {
                return true;
            }
            let denied = ApiError(P2pHttpError::Unauthorized);
            res.status(denied.status())
                .header(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))
                .json(denied.body());
            false
        }))
}

fn presented(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}
