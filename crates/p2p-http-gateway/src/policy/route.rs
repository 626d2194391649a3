use axum::{http::HeaderValue, response::Response};

/// Response header marking resource-intensive routes.
pub const HEAVY_HEADER: &str = "x-vix-route-heavy";

/// Per-route flags, fixed at registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    pub heavy: bool,
    pub require_auth: bool,
}

impl RoutePolicy {
    pub const OPEN: RoutePolicy = RoutePolicy { heavy: false, require_auth: false };

    pub fn new(heavy: bool, require_auth: bool) -> Self {
        Self { heavy, require_auth }
    }

    /// Ordered stages for this route. Auth always precedes the heavy tag;
    /// an empty list means the raw handler is installed as-is.
    pub fn stages(&self) -> Vec<Stage> {
        let mut out = Vec::with_capacity(2);
        if self.require_auth {
            out.push(Stage::Auth);
        }
        if self.heavy {
            out.push(Stage::HeavyTag);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Auth,
    HeavyTag,
}

/// Set the heavy header unless the handler already chose a value.
pub(crate) fn tag_heavy(res: &mut Response) {
    res.headers_mut()
        .entry(HEAVY_HEADER)
        .or_insert(HeaderValue::from_static("1"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_resolution() {
        assert!(RoutePolicy::OPEN.stages().is_empty());
        assert_eq!(RoutePolicy::new(true, false).stages(), [Stage::HeavyTag]);
        assert_eq!(RoutePolicy::new(false, true).stages(), [Stage::Auth]);
        assert_eq!(RoutePolicy::new(true, true).stages(), [Stage::Auth, Stage::HeavyTag]);
    }
}
