use axum::{Router, routing::get};
use pinpoint_auth::context::{AuthResolver, RequestHandle};
use pinpoint_auth::metrics::{ResolutionMetrics, get_resolution_metrics, metrics_handler};
use pinpoint_auth::testing::{self, InMemoryOrgStore, StaticSessionProvider, sample};
use std::sync::Arc;

fn resolver(metrics: Option<Arc<ResolutionMetrics>>) -> (AuthResolver, InMemoryOrgStore) {
    let store = InMemoryOrgStore::new();
    store.insert_org(sample::org("org1", "acme"));
    store.insert_grant(sample::grant("m1", "u1", "org1", sample::admin_role()));

    let mut builder = AuthResolver::builder()
        .session_provider(StaticSessionProvider::new(
            sample::session("u1").with_default_org("org1"),
        ))
        .stores(store.clone());
    if let Some(metrics) = metrics {
        builder = builder.metrics(metrics);
    }
    (builder.build().unwrap(), store)
}

#[tokio::test]
async fn test_dedicated_collector_counts_one_request() {
    let metrics = Arc::new(ResolutionMetrics::new().unwrap());
    let (resolver, _) = resolver(Some(Arc::clone(&metrics)));
    let request = RequestHandle::new();

    for _ in 0..10 {
        resolver.resolve(&request).await;
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.resolutions_started, 1);
    assert_eq!(snapshot.resolutions_served_from_cache, 9);
    assert_eq!(snapshot.org_queries, 1);
    assert_eq!(snapshot.membership_queries, 1);
    assert_eq!(snapshot.store_timeouts, 0);
    assert!((snapshot.cache_hit_ratio() - 0.9).abs() < 1e-9);

    metrics.reset();
    assert_eq!(metrics.snapshot().total_calls(), 0);
}

#[tokio::test]
async fn test_global_collector_is_default() {
    let (resolver, _) = resolver(None);
    assert!(Arc::ptr_eq(resolver.metrics(), &ResolutionMetrics::global()));

    // Other tests may record into the global collector concurrently, so only
    // check lower bounds on the delta.
    let before = get_resolution_metrics();
    resolver.resolve(&RequestHandle::new()).await;
    let delta = get_resolution_metrics().since(&before);

    assert!(delta.resolutions_started >= 1);
    assert!(delta.org_queries >= 1);
    assert!(delta.membership_queries >= 1);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let metrics = Arc::new(ResolutionMetrics::new().unwrap());
    let (resolver, _) = resolver(Some(Arc::clone(&metrics)));
    resolver.resolve(&RequestHandle::new()).await;

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics);

    let body = testing::get(app, "/metrics")
        .execute()
        .await
        .assert_ok()
        .body_string()
        .await;

    assert!(body.contains("# TYPE pinpoint_auth_resolutions_started_total counter"));
    assert!(body.contains("pinpoint_auth_resolutions_started_total 1"));
    assert!(body.contains("pinpoint_auth_org_queries_total 1"));
}
