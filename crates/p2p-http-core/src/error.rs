//! Shared error type across p2p-http crates.

use thiserror::Error;

/// Client-facing error codes (stable API, rendered into JSON `error` fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Missing or failing auth hook.
    Unauthorized,
    /// P2P node / peer registry not ready.
    NodeUnavailable,
    /// Placeholder endpoint.
    NotImplemented,
    /// Invalid input or configuration.
    BadRequest,
    /// Internal failure.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::Unauthorized => "unauthorized",
            ClientCode::NodeUnavailable => "p2p_node_unavailable",
            ClientCode::NotImplemented => "not_implemented",
            ClientCode::BadRequest => "bad_request",
            ClientCode::Internal => "internal",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, P2pHttpError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum P2pHttpError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("p2p node unavailable: {0}")]
    Unavailable(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl P2pHttpError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            P2pHttpError::Unauthorized => ClientCode::Unauthorized,
            P2pHttpError::Unavailable(_) => ClientCode::NodeUnavailable,
            P2pHttpError::NotImplemented(_) => ClientCode::NotImplemented,
            P2pHttpError::BadRequest(_) => ClientCode::BadRequest,
            P2pHttpError::Internal(_) => ClientCode::Internal,
        }
    }

    /// HTTP status code this error surfaces as.
    pub fn status(&self) -> u16 {
        match self {
            P2pHttpError::Unauthorized => 401,
            P2pHttpError::Unavailable(_) => 503,
            P2pHttpError::NotImplemented(_) => 501,
            P2pHttpError::BadRequest(_) => 400,
            P2pHttpError::Internal(_) => 500,
        }
    }
}
