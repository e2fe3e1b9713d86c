//! Request handles.
//!
//! A [`RequestHandle`] identifies one logical request and owns that request's
//! memoization cell. Clones share the same scope, so every call site that
//! receives a clone sees the same resolution. The cell is dropped together
//! with the last clone when the request finishes.

use super::types::AuthContext;
use axum::http::header::HOST;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::OnceCell;
use uuid::Uuid;

struct RequestScope {
    id: Uuid,
    headers: HeaderMap,
    org_override: Option<String>,
    auth: OnceCell<Arc<AuthContext>>,
    org_reads: AtomicU32,
    membership_reads: AtomicU32,
}

/// Handle for one logical request.
///
/// # Example
///
/// ```rust
/// use pinpoint_auth::context::RequestHandle;
///
/// let request = RequestHandle::builder()
///     .host("acme.pinpoint.app")
///     .build();
///
/// let same_request = request.clone();
/// assert!(request.same_request(&same_request));
/// assert!(!request.same_request(&RequestHandle::new()));
/// ```
#[derive(Clone)]
pub struct RequestHandle {
    scope: Arc<RequestScope>,
}

/// Store reads issued on behalf of one request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestQueryCounts {
    pub org_reads: u32,
    pub membership_reads: u32,
}

impl RequestHandle {
    /// Create a handle with no request metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RequestHandleBuilder {
        RequestHandleBuilder::new()
    }

    /// Build a handle from incoming request headers.
    ///
    /// `override_header` names the header carrying an explicit organization
    /// ID selection; blank values are ignored.
    pub fn from_headers(headers: &HeaderMap, override_header: &HeaderName) -> Self {
        let org_override = headers
            .get(override_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let mut builder = Self::builder().headers(headers.clone());
        if let Some(org_id) = org_override {
            builder = builder.org_override(org_id);
        }
        builder.build()
    }

    /// Unique ID of this request, used in logs.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.scope.id
    }

    /// Request headers captured when the handle was created.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.scope.headers
    }

    /// A header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.scope
            .headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// The `Host` header.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.header(HOST.as_str())
    }

    /// Explicitly selected organization ID, if any.
    #[must_use]
    pub fn org_override(&self) -> Option<&str> {
        self.scope.org_override.as_deref()
    }

    /// Whether the auth context has already been computed for this request.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.scope.auth.initialized()
    }

    /// The computed auth context, without triggering resolution.
    #[must_use]
    pub fn resolved(&self) -> Option<Arc<AuthContext>> {
        self.scope.auth.get().cloned()
    }

    /// Whether two handles belong to the same request.
    #[must_use]
    pub fn same_request(&self, other: &RequestHandle) -> bool {
        Arc::ptr_eq(&self.scope, &other.scope)
    }

    /// Store reads issued for this request so far.
    #[must_use]
    pub fn query_counts(&self) -> RequestQueryCounts {
        RequestQueryCounts {
            org_reads: self.scope.org_reads.load(Ordering::Relaxed),
            membership_reads: self.scope.membership_reads.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn auth_cell(&self) -> &OnceCell<Arc<AuthContext>> {
        &self.scope.auth
    }

    pub(crate) fn record_org_read(&self) {
        self.scope.org_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_membership_read(&self) {
        self.scope.membership_reads.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for RequestHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("id", &self.scope.id)
            .field("host", &self.host())
            .field("org_override", &self.scope.org_override)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Builder for [`RequestHandle`].
#[must_use = "builder does nothing until you call build()"]
pub struct RequestHandleBuilder {
    id: Option<Uuid>,
    headers: HeaderMap,
    org_override: Option<String>,
}

impl RequestHandleBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            headers: HeaderMap::new(),
            org_override: None,
        }
    }

    /// Use a specific request ID instead of a random one.
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Replace all captured headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set a single header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the `Host` header.
    pub fn host(self, host: &str) -> Self {
        self.header(HOST.as_str(), host)
    }

    /// Explicitly select an organization by ID.
    pub fn org_override(mut self, org_id: impl Into<String>) -> Self {
        self.org_override = Some(org_id.into());
        self
    }

    pub fn build(self) -> RequestHandle {
        RequestHandle {
            scope: Arc::new(RequestScope {
                id: self.id.unwrap_or_else(Uuid::new_v4),
                headers: self.headers,
                org_override: self.org_override,
                auth: OnceCell::new(),
                org_reads: AtomicU32::new(0),
                membership_reads: AtomicU32::new(0),
            }),
        }
    }
}

impl Default for RequestHandleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
