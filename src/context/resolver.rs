//! Request-scoped auth context resolution.

use super::config::ResolverConfig;
use super::error::{AuthorizationError, ResolutionStep};
use super::hint::{OrgHintExtractor, SubdomainHintExtractor};
use super::request::RequestHandle;
use super::resolvers::{
    MembershipResolution, MembershipResolver, OrgCandidate, OrgResolution, OrganizationResolver,
    bounded_read,
};
use super::session::{Identity, IdentityNormalizer, SessionProvider};
use super::storage::{MembershipStore, OrganizationStore};
use super::types::{AuthContext, AuthorizedContext, StoreFault};
use crate::error::{PinpointError, Result};
use crate::metrics::ResolutionMetrics;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, instrument};

/// Resolves the [`AuthContext`] for a request, at most once per request.
///
/// The first `resolve` call for a [`RequestHandle`] runs the chain
/// session -> identity -> organization -> membership. Concurrent calls for the
/// same request wait for that computation and share its result. Later calls
/// return the stored value without touching any store.
///
/// If the computing call is cancelled before it finishes, nothing is stored and
/// the next caller starts over.
///
/// # Example
///
/// ```rust,ignore
/// use pinpoint_auth::context::{AuthResolver, RequestHandle};
///
/// let resolver = AuthResolver::builder()
///     .session_provider(sessions)
///     .stores(db)
///     .build()?;
///
/// let request = RequestHandle::builder().host("acme.pinpoint.app").build();
/// let ctx = resolver.resolve(&request).await;
/// let again = resolver.resolve(&request).await;
/// assert!(Arc::ptr_eq(&ctx, &again));
/// ```
pub struct AuthResolver {
    sessions: Arc<dyn SessionProvider>,
    hints: Arc<dyn OrgHintExtractor>,
    organizations: OrganizationResolver,
    memberships: MembershipResolver,
    metrics: Arc<ResolutionMetrics>,
    config: ResolverConfig,
}

impl AuthResolver {
    pub fn builder() -> AuthResolverBuilder {
        AuthResolverBuilder::new()
    }

    /// Configuration this resolver was built with.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Metrics collector this resolver records into.
    pub fn metrics(&self) -> &Arc<ResolutionMetrics> {
        &self.metrics
    }

    /// Resolve the auth context for `request`.
    ///
    /// Never fails: infrastructure problems produce a non-authorized variant
    /// with its `fault` set.
    #[instrument(skip_all, fields(request_id = %request.id()))]
    pub async fn resolve(&self, request: &RequestHandle) -> Arc<AuthContext> {
        let cell = request.auth_cell();

        if let Some(ctx) = cell.get() {
            self.metrics.resolutions_served_from_cache.inc();
            return Arc::clone(ctx);
        }

        let computed = AtomicBool::new(false);
        let ctx = cell
            .get_or_init(|| {
                let computed = &computed;
                async move {
                    computed.store(true, Ordering::Relaxed);
                    self.metrics.resolutions_started.inc();
                    Arc::new(self.compute(request).await)
                }
            })
            .await;

        if !computed.load(Ordering::Relaxed) {
            self.metrics.resolutions_served_from_cache.inc();
        }

        Arc::clone(ctx)
    }

    /// Resolve and require a fully authorized context.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthorizationError`] matching the non-authorized outcome.
    /// Storage faults are reported as such, never as a missing organization
    /// or membership.
    pub async fn require_authorized(
        &self,
        request: &RequestHandle,
    ) -> std::result::Result<AuthorizedContext, AuthorizationError> {
        self.resolve(request).await.to_authorization_result()
    }

    async fn compute(&self, request: &RequestHandle) -> AuthContext {
        let identity = match self.load_identity(request).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                debug!("No valid session, request is unauthenticated");
                return AuthContext::Unauthenticated { fault: None };
            }
            Err(fault) => {
                debug!(%fault, "Session read failed, request is unauthenticated");
                return AuthContext::Unauthenticated { fault: Some(fault) };
            }
        };
        let Identity {
            user,
            default_org_id,
        } = identity;

        let candidate = OrgCandidate::select(
            request.org_override(),
            self.hints.extract_org_hint(request),
            default_org_id.as_deref(),
        );

        let org = match self
            .organizations
            .resolve(request, candidate, &self.metrics)
            .await
        {
            OrgResolution::Found(org) => org,
            OrgResolution::Missing { fault } => {
                debug!(user_id = %user.id, ?fault, "Organization not resolved");
                return AuthContext::OrgMissing { user, fault };
            }
        };

        match self
            .memberships
            .resolve(request, &user.id, &org.id, &self.metrics)
            .await
        {
            MembershipResolution::Found(grant) => {
                debug!(
                    user_id = %user.id,
                    org_id = %org.id,
                    role = %grant.role.name,
                    "Request authorized"
                );
                AuthContext::Authorized(AuthorizedContext {
                    user,
                    org,
                    membership: grant.membership,
                    role: grant.role,
                })
            }
            MembershipResolution::Missing { fault } => {
                debug!(user_id = %user.id, org_id = %org.id, ?fault, "No membership");
                AuthContext::NoMembership {
                    user,
                    org_id: org.id,
                    fault,
                }
            }
        }
    }

    async fn load_identity(
        &self,
        request: &RequestHandle,
    ) -> std::result::Result<Option<Identity>, StoreFault> {
        let read = bounded_read(
            self.config.store_timeout(),
            ResolutionStep::Session,
            &self.metrics,
            self.sessions.current_session(request),
        )
        .await?;

        let Some(raw) = read else {
            return Ok(None);
        };

        let identity = IdentityNormalizer::normalize(&raw);
        if identity.is_none() {
            debug!("Session rejected during normalization");
        }
        Ok(identity)
    }
}

impl std::fmt::Debug for AuthResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AuthResolver`].
#[must_use = "builder does nothing until you call build()"]
pub struct AuthResolverBuilder {
    sessions: Option<Arc<dyn SessionProvider>>,
    hints: Option<Arc<dyn OrgHintExtractor>>,
    organizations: Option<Arc<dyn OrganizationStore>>,
    memberships: Option<Arc<dyn MembershipStore>>,
    metrics: Option<Arc<ResolutionMetrics>>,
    config: ResolverConfig,
}

impl AuthResolverBuilder {
    pub fn new() -> Self {
        Self {
            sessions: None,
            hints: None,
            organizations: None,
            memberships: None,
            metrics: None,
            config: ResolverConfig::default(),
        }
    }

    pub fn session_provider(mut self, provider: impl SessionProvider + 'static) -> Self {
        self.sessions = Some(Arc::new(provider));
        self
    }

    /// Replace the default [`SubdomainHintExtractor`].
    pub fn hint_extractor(mut self, extractor: impl OrgHintExtractor + 'static) -> Self {
        self.hints = Some(Arc::new(extractor));
        self
    }

    pub fn organization_store(mut self, store: impl OrganizationStore + 'static) -> Self {
        self.organizations = Some(Arc::new(store));
        self
    }

    pub fn membership_store(mut self, store: impl MembershipStore + 'static) -> Self {
        self.memberships = Some(Arc::new(store));
        self
    }

    /// Use one backend for both organization and membership reads.
    pub fn stores<S>(self, store: S) -> Self
    where
        S: OrganizationStore + MembershipStore + Clone + 'static,
    {
        self.organization_store(store.clone()).membership_store(store)
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Record into a dedicated collector instead of the process-wide one.
    pub fn metrics(mut self, metrics: Arc<ResolutionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// # Errors
    ///
    /// Fails when the session provider or a store is missing, or the store
    /// timeout is zero.
    pub fn build(self) -> Result<AuthResolver> {
        let sessions = self
            .sessions
            .ok_or_else(|| PinpointError::internal("AuthResolver requires a session provider"))?;
        let organizations = self
            .organizations
            .ok_or_else(|| PinpointError::internal("AuthResolver requires an organization store"))?;
        let memberships = self
            .memberships
            .ok_or_else(|| PinpointError::internal("AuthResolver requires a membership store"))?;

        if self.config.store_timeout_ms == 0 {
            return Err(PinpointError::bad_request("Store timeout must be greater than zero"));
        }

        let timeout = self.config.store_timeout();
        let hints = self
            .hints
            .unwrap_or_else(|| Arc::new(SubdomainHintExtractor::from_config(&self.config)));

        Ok(AuthResolver {
            sessions,
            hints,
            organizations: OrganizationResolver::new(organizations, timeout),
            memberships: MembershipResolver::new(memberships, timeout),
            metrics: self.metrics.unwrap_or_else(ResolutionMetrics::global),
            config: self.config,
        })
    }
}

impl Default for AuthResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
