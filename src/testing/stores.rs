//! In-memory stores and session providers for tests.

use crate::context::{
    MembershipGrant, MembershipStore, Organization, OrganizationStore, RawSession, RequestHandle,
    SessionProvider,
};
use crate::error::{PinpointError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

#[derive(Default)]
struct Inner {
    orgs: DashMap<String, Organization>,
    grants: DashMap<(String, String), MembershipGrant>,
    org_reads: AtomicU32,
    membership_reads: AtomicU32,
    org_latency_ms: AtomicU64,
    membership_latency_ms: AtomicU64,
    failing: AtomicBool,
}

/// In-memory organization and membership store.
///
/// Counts reads, and can be made slow or failing to exercise timeouts and
/// fault handling. Clones share the same data.
///
/// # Example
///
/// ```rust
/// use pinpoint_auth::testing::{InMemoryOrgStore, sample};
///
/// let store = InMemoryOrgStore::new();
/// store.insert_org(sample::org("org_acme", "acme"));
/// store.insert_grant(sample::grant("m1", "u1", "org_acme", sample::admin_role()));
///
/// assert_eq!(store.org_reads(), 0);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryOrgStore {
    inner: Arc<Inner>,
}

impl InMemoryOrgStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_org(&self, org: Organization) {
        self.inner.orgs.insert(org.id.clone(), org);
    }

    pub fn insert_grant(&self, grant: MembershipGrant) {
        let key = (
            grant.membership.user_id.clone(),
            grant.membership.organization_id.clone(),
        );
        self.inner.grants.insert(key, grant);
    }

    pub fn remove_grant(&self, user_id: &str, org_id: &str) {
        self.inner
            .grants
            .remove(&(user_id.to_string(), org_id.to_string()));
    }

    /// Delay every read by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.set_org_latency(latency);
        self.set_membership_latency(latency);
    }

    pub fn set_org_latency(&self, latency: Duration) {
        self.inner
            .org_latency_ms
            .store(millis(latency), Ordering::Relaxed);
    }

    pub fn set_membership_latency(&self, latency: Duration) {
        self.inner
            .membership_latency_ms
            .store(millis(latency), Ordering::Relaxed);
    }

    /// Make every read return an error.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::Relaxed);
    }

    /// Organization reads served so far, including failed ones.
    pub fn org_reads(&self) -> u32 {
        self.inner.org_reads.load(Ordering::Relaxed)
    }

    /// Membership reads served so far, including failed ones.
    pub fn membership_reads(&self) -> u32 {
        self.inner.membership_reads.load(Ordering::Relaxed)
    }

    async fn simulate(&self, latency_ms: &AtomicU64) -> Result<()> {
        let delay = latency_ms.load(Ordering::Relaxed);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.inner.failing.load(Ordering::Relaxed) {
            return Err(PinpointError::service_unavailable("In-memory store set to fail"));
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationStore for InMemoryOrgStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>> {
        self.inner.org_reads.fetch_add(1, Ordering::Relaxed);
        self.simulate(&self.inner.org_latency_ms).await?;
        Ok(self.inner.orgs.get(id).map(|org| org.clone()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>> {
        self.inner.org_reads.fetch_add(1, Ordering::Relaxed);
        self.simulate(&self.inner.org_latency_ms).await?;
        Ok(self
            .inner
            .orgs
            .iter()
            .find(|entry| entry.slug == slug)
            .map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl MembershipStore for InMemoryOrgStore {
    async fn find_membership(
        &self,
        user_id: &str,
        org_id: &str,
    ) -> Result<Option<MembershipGrant>> {
        self.inner.membership_reads.fetch_add(1, Ordering::Relaxed);
        self.simulate(&self.inner.membership_latency_ms).await?;
        Ok(self
            .inner
            .grants
            .get(&(user_id.to_string(), org_id.to_string()))
            .map(|grant| grant.clone()))
    }
}

/// Session provider that returns the same session for every request.
#[derive(Clone, Debug)]
pub struct StaticSessionProvider {
    session: Option<RawSession>,
    error: Option<String>,
    latency: Duration,
    calls: Arc<AtomicU32>,
}

impl StaticSessionProvider {
    pub fn new(session: RawSession) -> Self {
        Self {
            session: Some(session),
            error: None,
            latency: Duration::ZERO,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Provider with no session.
    pub fn anonymous() -> Self {
        Self {
            session: None,
            error: None,
            latency: Duration::ZERO,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Provider whose every call errors with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            session: None,
            error: Some(message.into()),
            latency: Duration::ZERO,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Delay every session read by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of times the session was requested.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn current_session(&self, _request: &RequestHandle) -> Result<Option<RawSession>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.error {
            Some(message) => Err(PinpointError::internal(message.clone())),
            None => Ok(self.session.clone()),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
