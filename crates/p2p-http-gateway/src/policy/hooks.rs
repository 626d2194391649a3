//! Auth hook contracts for both pipeline modes.
//!
//! Middleware mode hands the hook an [`AuthContext`]; legacy mode hands it the
//! raw request and a [`ResponseWriter`]. In both, `false` means "stop here";
//! whatever the hook wrote becomes the response, and a hook that wrote
//! nothing yields an empty 401.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{Extensions, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

pub type AuthHook = Arc<dyn Fn(&mut AuthContext<'_>) -> bool + Send + Sync>;

pub type LegacyAuthHook = Arc<dyn Fn(&Request, &mut ResponseWriter) -> bool + Send + Sync>;

/// Hooks available to protected routes.
///
/// `auth` serves middleware mode, `auth_legacy` serves legacy mode. A missing
/// hook for the active mode denies every protected request.
#[derive(Clone, Default)]
pub struct AccessHooks {
    pub auth: Option<AuthHook>,
    pub auth_legacy: Option<LegacyAuthHook>,
}

impl AccessHooks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_auth(mut self, hook: AuthHook) -> Self {
        self.auth = Some(hook);
        self
    }

    pub fn with_legacy(mut self, hook: LegacyAuthHook) -> Self {
        self.auth_legacy = Some(hook);
        self
    }
}

/// What a middleware-mode hook sees.
pub struct AuthContext<'a> {
    request: &'a mut Request,
    response: Option<Response>,
    headers: HeaderMap,
}

impl<'a> AuthContext<'a> {
    pub(crate) fn new(request: &'a mut Request) -> Self {
        Self {
            request,
            response: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn request(&self) -> &Request {
        &*self.request
    }

    pub fn request_headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Attach data (e.g. a principal) for downstream handlers.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        self.request.extensions_mut()
    }

    /// Response to send if the hook denies.
    pub fn respond(&mut self, res: impl IntoResponse) {
        self.response = Some(res.into_response());
    }

    /// Header added to the final response, allowed or denied.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub(crate) fn finish(self) -> (Option<Response>, HeaderMap) {
        (self.response, self.headers)
    }
}

enum WriterBody {
    Json(Value),
    Text(String),
}

/// Minimal response builder handed to legacy hooks.
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<WriterBody>,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = Some(status);
        self
    }

    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json(&mut self, body: Value) -> &mut Self {
        self.body = Some(WriterBody::Json(body));
        self
    }

    pub fn text(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = Some(WriterBody::Text(body.into()));
        self
    }

    /// Whether a status or body was produced.
    pub fn is_written(&self) -> bool {
        self.status.is_some() || self.body.is_some()
    }

    pub(crate) fn take_headers(&mut self) -> HeaderMap {
        std::mem::take(&mut self.headers)
    }

    /// Render as a denial: an unwritten writer becomes an empty 401.
    pub(crate) fn into_denied(self) -> Response {
        if self.is_written() {
            return self.into_response();
        }
        let mut res = denied_without_body();
        res.headers_mut().extend(self.headers);
        res
    }
}

impl IntoResponse for ResponseWriter {
    fn into_response(self) -> Response {
        let mut res = match self.body {
            Some(WriterBody::Json(v)) => Json(v).into_response(),
            Some(WriterBody::Text(t)) => t.into_response(),
            None => Response::new(Body::empty()),
        };
        *res.status_mut() = self.status.unwrap_or(StatusCode::OK);
        res.headers_mut().extend(self.headers);
        res
    }
}

/// Response for a hook that denied without writing anything.
pub(crate) fn denied_without_body() -> Response {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = StatusCode::UNAUTHORIZED;
    res
}
