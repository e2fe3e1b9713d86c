#![allow(deprecated)]

use pinpoint_auth::context::{AuthResolver, RequestHandle, ResolverConfig};
use pinpoint_auth::legacy::{DeprecationNotices, LegacyAdapters, LegacyConfig, LegacyError};
use pinpoint_auth::metrics::ResolutionMetrics;
use pinpoint_auth::testing::{InMemoryOrgStore, StaticSessionProvider, sample};
use std::sync::Arc;

fn legacy(store: &InMemoryOrgStore) -> LegacyAdapters {
    let resolver = AuthResolver::builder()
        .session_provider(StaticSessionProvider::new(sample::session("u1")))
        .stores(store.clone())
        .config(ResolverConfig::builder().base_domain("pinpoint.app").build())
        .metrics(Arc::new(ResolutionMetrics::new().unwrap()))
        .build()
        .unwrap();

    LegacyAdapters::new(Arc::new(resolver)).with_notices(Arc::new(DeprecationNotices::new()))
}

fn store() -> InMemoryOrgStore {
    let store = InMemoryOrgStore::new();
    store.insert_org(sample::org("org1", "acme"));
    store.insert_grant(sample::grant("m1", "u1", "org1", sample::member_role()));
    store
}

fn acme() -> RequestHandle {
    RequestHandle::builder().host("acme.pinpoint.app").build()
}

#[tokio::test]
async fn test_adapter_called_five_times_warns_once() {
    let store = store();
    let legacy = legacy(&store);

    for _ in 0..5 {
        let role = legacy.get_user_role(&acme()).await.unwrap();
        assert_eq!(role.as_deref(), Some("Member"));
    }

    assert_eq!(legacy.notices().emitted(), 1);
    assert_eq!(legacy.notices().calls("get_user_role"), 5);
}

#[tokio::test]
async fn test_legacy_and_new_call_sites_share_resolution() {
    let store = store();
    let legacy = legacy(&store);
    let request = acme();

    let state = legacy.get_auth_state(&request).await.unwrap();
    assert!(state.has_access);
    assert_eq!(state.role.as_deref(), Some("Member"));

    assert!(!legacy.check_permission(&request, "issues:write").await.unwrap());
    assert!(legacy.check_permission(&request, "issues:read").await.unwrap());

    assert_eq!(store.org_reads(), 1);
    assert_eq!(store.membership_reads(), 1);
    assert!(request.is_resolved());
}

#[tokio::test]
async fn test_strict_mode_surfaces_every_call() {
    let store = store();
    let legacy = legacy(&store).with_config(LegacyConfig::default().with_strict(true));

    for _ in 0..3 {
        let err = legacy.get_current_organization(&acme()).await.unwrap_err();
        assert!(matches!(
            err,
            LegacyError::StrictMode {
                adapter: "get_current_organization",
                ..
            }
        ));
    }

    assert_eq!(legacy.notices().emitted(), 1);
    assert_eq!(store.org_reads(), 0);
}

#[tokio::test]
async fn test_strict_mode_error_response() {
    use axum::response::IntoResponse;

    let err = LegacyError::StrictMode {
        adapter: "get_current_user",
        replacement: "AuthResolver::resolve(..).user()",
    };
    assert_eq!(
        err.to_string(),
        "get_current_user is deprecated; use AuthResolver::resolve(..).user()"
    );

    let response = err.into_response();
    assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
}
