use async_trait::async_trait;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::{Json, Router, http::StatusCode, routing::get};
use pinpoint_auth::context::{
    AuthResolver, Authorized, CurrentAuth, RawSession, RequestHandle, RequestScopeLayer,
    ResolverConfig, SessionProvider,
};
use pinpoint_auth::metrics::ResolutionMetrics;
use pinpoint_auth::testing::{self, InMemoryOrgStore, sample};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// Reads the caller's user ID from `x-user-id`. The ID `down` simulates a
/// session store outage.
struct HeaderSessions;

#[async_trait]
impl SessionProvider for HeaderSessions {
    async fn current_session(
        &self,
        request: &RequestHandle,
    ) -> pinpoint_auth::Result<Option<RawSession>> {
        match request.header("x-user-id") {
            Some("down") => Err(pinpoint_auth::PinpointError::service_unavailable(
                "session store unreachable",
            )),
            user_id => Ok(user_id.map(sample::session)),
        }
    }
}

fn store() -> InMemoryOrgStore {
    let store = InMemoryOrgStore::new();
    store.insert_org(sample::org("org1", "acme"));
    store.insert_org(sample::org("org2", "globex"));
    store.insert_grant(sample::grant("m1", "u1", "org1", sample::admin_role()));
    store
}

fn app(store: &InMemoryOrgStore) -> Router {
    let resolver = AuthResolver::builder()
        .session_provider(HeaderSessions)
        .stores(store.clone())
        .config(
            ResolverConfig::builder()
                .base_domain("pinpoint.app")
                .store_timeout(Duration::from_millis(100))
                .build(),
        )
        .metrics(Arc::new(ResolutionMetrics::new().unwrap()))
        .build()
        .unwrap();
    let scope = RequestScopeLayer::new(Arc::new(resolver));

    Router::new()
        .route("/whoami", get(whoami))
        .route("/issues", get(issues).post(create_issue))
        .route("/both", get(both))
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            let scope = scope.clone();
            async move { scope.middleware(req, next).await }
        }))
}

async fn whoami(CurrentAuth(ctx): CurrentAuth) -> Json<Value> {
    Json(serde_json::to_value(&*ctx).unwrap())
}

async fn issues(Authorized(ctx): Authorized) -> Json<Value> {
    Json(json!({ "org": ctx.org.slug, "role": ctx.role.name }))
}

async fn create_issue(Authorized(ctx): Authorized) -> Result<StatusCode, StatusCode> {
    if ctx.role.has_permission("issues:write") {
        Ok(StatusCode::CREATED)
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

// Three independent call sites in one handler.
async fn both(
    request: RequestHandle,
    CurrentAuth(ctx): CurrentAuth,
    Authorized(authorized): Authorized,
) -> Json<Value> {
    Json(json!({
        "kind": ctx.kind().as_str(),
        "org": authorized.org.id,
        "org_reads": request.query_counts().org_reads,
        "membership_reads": request.query_counts().membership_reads,
    }))
}

#[tokio::test]
async fn test_current_auth_without_session() {
    let body: Value = testing::get(app(&store()), "/whoami")
        .host("acme.pinpoint.app")
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    assert_eq!(body, json!({"kind": "unauthenticated"}));
}

#[tokio::test]
async fn test_authorized_member() {
    let body: Value = testing::get(app(&store()), "/issues")
        .host("acme.pinpoint.app")
        .header("x-user-id", "u1")
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    assert_eq!(body["org"], "acme");
    assert_eq!(body["role"], "Admin");
}

#[tokio::test]
async fn test_authorized_rejections() {
    testing::get(app(&store()), "/issues")
        .host("acme.pinpoint.app")
        .execute()
        .await
        .assert_unauthorized();

    testing::get(app(&store()), "/issues")
        .host("globex.pinpoint.app")
        .header("x-user-id", "u1")
        .execute()
        .await
        .assert_forbidden();

    testing::get(app(&store()), "/issues")
        .host("initech.pinpoint.app")
        .header("x-user-id", "u1")
        .execute()
        .await
        .assert_not_found();
}

#[tokio::test]
async fn test_storage_fault_is_service_unavailable() {
    let store = store();
    store.set_membership_latency(Duration::from_millis(500));

    let body: Value = testing::get(app(&store), "/issues")
        .host("acme.pinpoint.app")
        .header("x-user-id", "u1")
        .execute()
        .await
        .assert_service_unavailable()
        .json()
        .await;

    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn test_session_outage_is_service_unavailable() {
    let body: Value = testing::get(app(&store()), "/issues")
        .host("acme.pinpoint.app")
        .header("x-user-id", "down")
        .execute()
        .await
        .assert_service_unavailable()
        .json()
        .await;

    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn test_write_requires_role_permission() {
    let store = store();
    store.insert_grant(sample::grant("m2", "u2", "org1", sample::member_role()));

    testing::post(app(&store), "/issues")
        .host("acme.pinpoint.app")
        .header("x-user-id", "u1")
        .execute()
        .await
        .assert_status(StatusCode::CREATED);

    testing::post(app(&store), "/issues")
        .host("acme.pinpoint.app")
        .header("x-user-id", "u2")
        .execute()
        .await
        .assert_forbidden();
}

#[tokio::test]
async fn test_override_header() {
    let store = store();
    store.insert_grant(sample::grant("m2", "u1", "org2", sample::member_role()));

    let body: Value = testing::get(app(&store), "/issues")
        .host("acme.pinpoint.app")
        .header("x-user-id", "u1")
        .header("x-organization-id", "org2")
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    assert_eq!(body["org"], "globex");
    assert_eq!(body["role"], "Member");
}

#[tokio::test]
async fn test_extractors_share_one_resolution() {
    let store = store();

    let body: Value = testing::get(app(&store), "/both")
        .host("acme.pinpoint.app")
        .header("x-user-id", "u1")
        .execute()
        .await
        .assert_ok()
        .json()
        .await;

    assert_eq!(body["kind"], "authorized");
    assert_eq!(body["org"], "org1");
    assert_eq!(body["org_reads"], 1);
    assert_eq!(body["membership_reads"], 1);
    assert_eq!(store.org_reads(), 1);
}

#[tokio::test]
async fn test_each_request_gets_its_own_scope() {
    let store = store();
    let app = app(&store);

    for _ in 0..3 {
        testing::get(app.clone(), "/issues")
            .host("acme.pinpoint.app")
            .header("x-user-id", "u1")
            .execute()
            .await
            .assert_ok();
    }

    assert_eq!(store.org_reads(), 3);
    assert_eq!(store.membership_reads(), 3);
}

#[tokio::test]
async fn test_missing_scope_layer_is_server_error() {
    let app = Router::new().route("/whoami", get(whoami));

    let status = testing::get(app, "/whoami").execute().await.status();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
