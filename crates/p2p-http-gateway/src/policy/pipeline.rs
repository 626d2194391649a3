//! Pipeline strategies that turn resolved stages into an axum route.
//!
//! Both strategies consume the same stage list from [`RoutePolicy::stages`]
//! and must be indistinguishable on the wire: same status, headers and body
//! for the same hooks and request.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use futures_util::future::{BoxFuture, FutureExt};

use crate::config::PipelineMode;
use crate::error::unauthorized;

use super::hooks::{AccessHooks, AuthContext, ResponseWriter};
use super::route::{tag_heavy, RoutePolicy, Stage};

/// Type-erased request handler shared by both strategies.
pub type Endpoint = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Box an async handler as an [`Endpoint`].
pub fn endpoint<F, Fut>(f: F) -> Endpoint
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| f(req).boxed())
}

pub trait RoutePipeline: Send + Sync {
    fn mode(&self) -> PipelineMode;

    /// Build a route for a non-empty stage list.
    fn build(&self, filter: MethodFilter, endpoint: Endpoint, stages: &[Stage]) -> MethodRouter;
}

/// Choose the strategy once, at construction time.
pub fn pipeline_for(mode: PipelineMode, hooks: AccessHooks) -> Box<dyn RoutePipeline> {
    match mode {
        PipelineMode::Middleware => Box::new(MiddlewarePipeline::new(hooks)),
        PipelineMode::Legacy => Box::new(InlinePipeline::new(hooks)),
    }
}

/// Register `endpoint` at `path`, wrapped per `policy`.
///
/// Open routes get the raw handler with no wrapper at all.
pub fn install(
    router: Router,
    pipeline: &dyn RoutePipeline,
    filter: MethodFilter,
    path: &str,
    policy: RoutePolicy,
    endpoint: Endpoint,
) -> Router {
    let stages = policy.stages();
    let route = if stages.is_empty() {
        raw(filter, endpoint)
    } else {
        pipeline.build(filter, endpoint, &stages)
    };
    tracing::debug!(
        %path,
        mode = ?pipeline.mode(),
        heavy = policy.heavy,
        require_auth = policy.require_auth,
        "route installed"
    );
    router.route(path, route)
}

fn raw(filter: MethodFilter, endpoint: Endpoint) -> MethodRouter {
    on(filter, move |req: Request| {
        let endpoint = Arc::clone(&endpoint);
        async move { endpoint(req).await }
    })
}

// --------------------
// Middleware mode
// --------------------

/// Stages as `axum::middleware` layers; the first stage is the outermost.
pub struct MiddlewarePipeline {
    hooks: AccessHooks,
}

impl MiddlewarePipeline {
    pub fn new(hooks: AccessHooks) -> Self {
        Self { hooks }
    }
}

impl RoutePipeline for MiddlewarePipeline {
    fn mode(&self) -> PipelineMode {
        PipelineMode::Middleware
    }

    fn build(&self, filter: MethodFilter, endpoint: Endpoint, stages: &[Stage]) -> MethodRouter {
        let mut route = raw(filter, endpoint);
        // each layer wraps the previous one, so apply innermost first.
        // route_layer: unmatched methods get the plain 405, as in inline mode.
        for stage in stages.iter().rev() {
            route = match stage {
                Stage::Auth => route.route_layer(middleware::from_fn_with_state(
                    self.hooks.clone(),
                    auth_stage,
                )),
                Stage::HeavyTag => route.route_layer(middleware::from_fn(heavy_stage)),
            };
        }
        route
    }
}

async fn auth_stage(State(hooks): State<AccessHooks>, mut req: Request, next: Next) -> Response {
    let Some(hook) = hooks.auth.clone() else {
        return unauthorized();
    };

    let mut ctx = AuthContext::new(&mut req);
    let allowed = hook(&mut ctx);
    let (response, headers) = ctx.finish();

    if !allowed {
        let mut res = response.unwrap_or_else(super::hooks::denied_without_body);
        res.headers_mut().extend(headers);
        return res;
    }

    let mut res = next.run(req).await;
    res.headers_mut().extend(headers);
    res
}

async fn heavy_stage(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    tag_heavy(&mut res);
    res
}

// --------------------
// Legacy (inline) mode
// --------------------

/// Stages run inside the handler itself, using the legacy hook.
pub struct InlinePipeline {
    hooks: AccessHooks,
}

impl InlinePipeline {
    pub fn new(hooks: AccessHooks) -> Self {
        Self { hooks }
    }
}

impl RoutePipeline for InlinePipeline {
    fn mode(&self) -> PipelineMode {
        PipelineMode::Legacy
    }

    fn build(&self, filter: MethodFilter, endpoint: Endpoint, stages: &[Stage]) -> MethodRouter {
        let hooks = self.hooks.clone();
        let stages: Arc<[Stage]> = stages.into();

        let wrapped: Endpoint = Arc::new(move |req: Request| {
            let hooks = hooks.clone();
            let stages = Arc::clone(&stages);
            let endpoint = Arc::clone(&endpoint);
            async move { run_inline(&hooks, &stages, endpoint, req).await }.boxed()
        });
        raw(filter, wrapped)
    }
}

async fn run_inline(
    hooks: &AccessHooks,
    stages: &[Stage],
    endpoint: Endpoint,
    req: Request,
) -> Response {
    let mut carried = HeaderMap::new();
    let mut heavy = false;

    for stage in stages {
        match stage {
            Stage::Auth => match legacy_auth_or_401(hooks, &req) {
                Ok(headers) => carried.extend(headers),
                Err(denied) => return denied,
            },
            Stage::HeavyTag => heavy = true,
        }
    }

    let mut res = endpoint(req).await;
    if heavy {
        tag_heavy(&mut res);
    }
    res.headers_mut().extend(carried);
    res
}

/// Ok carries headers the hook wants on the final response.
fn legacy_auth_or_401(hooks: &AccessHooks, req: &Request) -> Result<HeaderMap, Response> {
    let Some(hook) = hooks.auth_legacy.as_ref() else {
        return Err(unauthorized());
    };

    let mut writer = ResponseWriter::new();
    if hook(req, &mut writer) {
        Ok(writer.take_headers())
    } else {
        Err(writer.into_denied())
    }
}
