//! Axum integration: request scope middleware and extractors.

use super::request::RequestHandle;
use super::resolver::AuthResolver;
use super::types::{AuthContext, AuthorizedContext};
use crate::error::PinpointError;
use axum::extract::{FromRequestParts, Request};
use axum::http::HeaderName;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

/// Middleware that opens a request scope.
///
/// Creates the [`RequestHandle`] for each incoming request and stores it, along
/// with the resolver, in the request extensions. Must wrap every route that
/// uses [`CurrentAuth`], [`Authorized`] or [`RequestHandle`] as an extractor.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, extract::Request, middleware::{self, Next}, routing::get};
/// use pinpoint_auth::context::RequestScopeLayer;
///
/// let scope = RequestScopeLayer::new(resolver);
///
/// let app = Router::new()
///     .route("/issues", get(list_issues))
///     .layer(middleware::from_fn(move |req: Request, next: Next| {
///         let scope = scope.clone();
///         async move { scope.middleware(req, next).await }
///     }));
/// ```
#[derive(Clone)]
pub struct RequestScopeLayer {
    resolver: Arc<AuthResolver>,
    override_header: HeaderName,
}

impl RequestScopeLayer {
    /// Uses the override header from the resolver's configuration, falling
    /// back to `x-organization-id` if that name is not a valid header.
    pub fn new(resolver: Arc<AuthResolver>) -> Self {
        let override_header =
            HeaderName::from_bytes(resolver.config().org_override_header.as_bytes())
                .unwrap_or_else(|_| HeaderName::from_static("x-organization-id"));
        Self {
            resolver,
            override_header,
        }
    }

    pub fn resolver(&self) -> &Arc<AuthResolver> {
        &self.resolver
    }

    /// Middleware function that opens the scope for one request
    pub async fn middleware(&self, mut request: Request, next: Next) -> Response {
        let handle = RequestHandle::from_headers(request.headers(), &self.override_header);
        request.extensions_mut().insert(handle);
        request.extensions_mut().insert(Arc::clone(&self.resolver));
        next.run(request).await
    }
}

fn scope_from_parts(parts: &Parts) -> Result<(RequestHandle, Arc<AuthResolver>), PinpointError> {
    let handle = parts
        .extensions
        .get::<RequestHandle>()
        .cloned()
        .ok_or_else(|| PinpointError::internal("RequestHandle not found in request extensions"))?;
    let resolver = parts
        .extensions
        .get::<Arc<AuthResolver>>()
        .cloned()
        .ok_or_else(|| PinpointError::internal("AuthResolver not found in request extensions"))?;
    Ok((handle, resolver))
}

impl<S> FromRequestParts<S> for RequestHandle
where
    S: Send + Sync,
{
    type Rejection = PinpointError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let handle = parts.extensions.get::<RequestHandle>().cloned();
        async move {
            handle.ok_or_else(|| {
                PinpointError::internal("RequestHandle not found in request extensions")
            })
        }
    }
}

/// The resolved auth context for the current request, whatever its variant.
///
/// # Example
///
/// ```rust,ignore
/// use pinpoint_auth::context::CurrentAuth;
///
/// async fn nav(CurrentAuth(ctx): CurrentAuth) -> Json<Nav> {
///     Json(Nav::for_context(&ctx))
/// }
/// ```
#[derive(Clone, Debug)]
pub struct CurrentAuth(pub Arc<AuthContext>);

impl Deref for CurrentAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentAuth
where
    S: Send + Sync,
{
    type Rejection = PinpointError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let scope = scope_from_parts(parts);
        Box::pin(async move {
            let (handle, resolver) = scope?;
            Ok(CurrentAuth(resolver.resolve(&handle).await))
        })
    }
}

/// A fully authorized caller. Rejects with 401, 404, 403 or 503 otherwise.
///
/// # Example
///
/// ```rust,ignore
/// use pinpoint_auth::context::Authorized;
///
/// async fn list_issues(Authorized(ctx): Authorized) -> Json<Vec<Issue>> {
///     Json(issues_for(&ctx.org.id).await)
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Authorized(pub AuthorizedContext);

impl Deref for Authorized {
    type Target = AuthorizedContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Authorized
where
    S: Send + Sync,
{
    type Rejection = PinpointError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let scope = scope_from_parts(parts);
        Box::pin(async move {
            let (handle, resolver) = scope?;
            let ctx = resolver.require_authorized(&handle).await?;
            Ok(Authorized(ctx))
        })
    }
}
