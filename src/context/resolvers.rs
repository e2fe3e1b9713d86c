//! Organization and membership resolution steps.
//!
//! These are crate-private on purpose: only the orchestrator in
//! [`resolver`](super::resolver) may drive them, so every store read happens
//! inside the request's single resolution.

use super::error::ResolutionStep;
use super::request::RequestHandle;
use super::storage::{MembershipStore, OrganizationStore};
use super::types::{MembershipGrant, Organization, StoreFault};
use crate::error::Result;
use crate::metrics::ResolutionMetrics;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Where the organization for a request comes from, in precedence order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum OrgCandidate {
    /// Explicit organization ID chosen by the caller.
    Override(String),
    /// Slug derived from the request (subdomain or hint header).
    Hint(String),
    /// The identity's stored default organization ID.
    Default(String),
}

impl OrgCandidate {
    /// Pick the highest-precedence candidate. Lower ones are discarded, never
    /// kept as fallbacks.
    pub(crate) fn select(
        override_id: Option<&str>,
        hint: Option<String>,
        default_id: Option<&str>,
    ) -> Option<Self> {
        if let Some(id) = override_id {
            return Some(Self::Override(id.to_string()));
        }
        if let Some(slug) = hint {
            return Some(Self::Hint(slug));
        }
        default_id.map(|id| Self::Default(id.to_string()))
    }

    fn source(&self) -> &'static str {
        match self {
            Self::Override(_) => "override",
            Self::Hint(_) => "hint",
            Self::Default(_) => "default",
        }
    }

    fn value(&self) -> &str {
        match self {
            Self::Override(v) | Self::Hint(v) | Self::Default(v) => v,
        }
    }
}

/// Result of the organization step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum OrgResolution {
    Found(Organization),
    Missing { fault: Option<StoreFault> },
}

/// Result of the membership step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MembershipResolution {
    Found(MembershipGrant),
    Missing { fault: Option<StoreFault> },
}

pub(crate) struct OrganizationResolver {
    store: Arc<dyn OrganizationStore>,
    timeout: Duration,
}

impl OrganizationResolver {
    pub(crate) fn new(store: Arc<dyn OrganizationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Load the organization for `candidate` with at most one store read.
    pub(crate) async fn resolve(
        &self,
        request: &RequestHandle,
        candidate: Option<OrgCandidate>,
        metrics: &ResolutionMetrics,
    ) -> OrgResolution {
        let Some(candidate) = candidate else {
            debug!("No organization candidate for request");
            return OrgResolution::Missing { fault: None };
        };

        metrics.org_queries.inc();
        request.record_org_read();

        let read = match &candidate {
            OrgCandidate::Hint(slug) => {
                let read = self.store.find_by_slug(slug);
                bounded_read(self.timeout, ResolutionStep::Organization, metrics, read).await
            }
            OrgCandidate::Override(id) | OrgCandidate::Default(id) => {
                let read = self.store.find_by_id(id);
                bounded_read(self.timeout, ResolutionStep::Organization, metrics, read).await
            }
        };

        match read {
            Ok(Some(org)) => OrgResolution::Found(org),
            Ok(None) => {
                debug!(
                    source = candidate.source(),
                    candidate = candidate.value(),
                    "Organization candidate matched nothing"
                );
                OrgResolution::Missing { fault: None }
            }
            Err(fault) => OrgResolution::Missing { fault: Some(fault) },
        }
    }
}

pub(crate) struct MembershipResolver {
    store: Arc<dyn MembershipStore>,
    timeout: Duration,
}

impl MembershipResolver {
    pub(crate) fn new(store: Arc<dyn MembershipStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Load membership and role with one joined read.
    pub(crate) async fn resolve(
        &self,
        request: &RequestHandle,
        user_id: &str,
        org_id: &str,
        metrics: &ResolutionMetrics,
    ) -> MembershipResolution {
        metrics.membership_queries.inc();
        request.record_membership_read();

        let read = bounded_read(
            self.timeout,
            ResolutionStep::Membership,
            metrics,
            self.store.find_membership(user_id, org_id),
        )
        .await;

        match read {
            Ok(Some(grant)) if grant.membership.organization_id == org_id
                && grant.membership.user_id == user_id =>
            {
                MembershipResolution::Found(grant)
            }
            Ok(Some(grant)) => {
                warn!(
                    user_id,
                    org_id,
                    membership_id = %grant.membership.id,
                    "Membership store returned a row for a different user or organization"
                );
                MembershipResolution::Missing { fault: None }
            }
            Ok(None) => MembershipResolution::Missing { fault: None },
            Err(fault) => MembershipResolution::Missing { fault: Some(fault) },
        }
    }
}

/// Run a store read under `timeout`, folding errors into a [`StoreFault`].
pub(crate) async fn bounded_read<T, F>(
    timeout: Duration,
    step: ResolutionStep,
    metrics: &ResolutionMetrics,
    read: F,
) -> std::result::Result<Option<T>, StoreFault>
where
    F: Future<Output = Result<Option<T>>>,
{
    match tokio::time::timeout(timeout, read).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(step = %step, error = %e, "Store read failed");
            Err(StoreFault::Unavailable)
        }
        Err(_) => {
            metrics.store_timeouts.inc();
            warn!(
                step = %step,
                timeout_ms = timeout.as_millis() as u64,
                "Store read timed out"
            );
            Err(StoreFault::Timeout)
        }
    }
}
