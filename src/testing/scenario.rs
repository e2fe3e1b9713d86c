//! Request scenarios for exercising Axum routers without a server.
//!
//! # Example
//!
//! ```rust,ignore
//! use pinpoint_auth::testing;
//!
//! testing::get(app, "/issues")
//!     .host("acme.pinpoint.app")
//!     .execute()
//!     .await
//!     .assert_forbidden();
//! ```

use axum::{
    Router,
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode, header},
};
use serde::Deserialize;
use tower::ServiceExt;

/// Test scenario builder for one request against a router
pub struct Scenario {
    app: Router,
    request: Request<Body>,
}

impl Scenario {
    /// Create a new test scenario with the given app
    pub fn new(app: Router) -> Self {
        let mut request = Request::new(Body::empty());
        *request.method_mut() = Method::GET;
        Self { app, request }
    }

    pub fn method(mut self, method: Method) -> Self {
        *self.request.method_mut() = method;
        self
    }

    /// Set the URI/path
    pub fn uri(mut self, uri: &str) -> Self {
        *self.request.uri_mut() = uri.parse().expect("invalid scenario URI");
        self
    }

    /// Add a header
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.request.headers_mut().insert(
            HeaderName::from_bytes(key.as_bytes()).expect("invalid header name"),
            HeaderValue::from_str(value).expect("invalid header value"),
        );
        self
    }

    /// Set the `Host` header, which drives subdomain organization hints
    pub fn host(self, host: &str) -> Self {
        self.header(header::HOST.as_str(), host)
    }

    /// Execute the request and get an assertion builder
    pub async fn execute(self) -> ScenarioAssert {
        let response = self
            .app
            .oneshot(self.request)
            .await
            .expect("router is infallible");
        ScenarioAssert { response }
    }
}

/// Assertion builder for test responses
pub struct ScenarioAssert {
    response: axum::response::Response,
}

impl ScenarioAssert {
    /// Assert the response status code
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.response.status(),
            expected,
            "Expected status {}, got {}",
            expected,
            self.response.status()
        );
        self
    }

    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_unauthorized(self) -> Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    pub fn assert_forbidden(self) -> Self {
        self.assert_status(StatusCode::FORBIDDEN)
    }

    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    pub fn assert_service_unavailable(self) -> Self {
        self.assert_status(StatusCode::SERVICE_UNAVAILABLE)
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Get the response body as bytes
    pub async fn body_bytes(self) -> Vec<u8> {
        axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body")
            .to_vec()
    }

    /// Get the response body as a string
    pub async fn body_string(self) -> String {
        String::from_utf8(self.body_bytes().await).expect("response body is not UTF-8")
    }

    /// Parse the JSON response body into a type
    pub async fn json<T: for<'de> Deserialize<'de>>(self) -> T {
        let bytes = self.body_bytes().await;
        serde_json::from_slice(&bytes).expect("Failed to parse JSON response")
    }

    /// Get the underlying response for custom assertions
    pub fn response(self) -> axum::response::Response {
        self.response
    }
}

/// Convenience function to create a GET request scenario
pub fn get(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::GET).uri(uri)
}

/// Convenience function to create a POST request scenario
pub fn post(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::POST).uri(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, routing::get as axum_get};
    use serde_json::json;

    async fn host_handler(headers: axum::http::HeaderMap) -> Json<serde_json::Value> {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(json!({ "host": host }))
    }

    #[tokio::test]
    async fn test_basic_get_with_host() {
        let app = Router::new().route("/host", axum_get(host_handler));

        let body: serde_json::Value = get(app, "/host")
            .host("acme.pinpoint.app")
            .execute()
            .await
            .assert_ok()
            .json()
            .await;

        assert_eq!(body["host"], "acme.pinpoint.app");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = Router::new().route("/host", axum_get(host_handler));
        get(app, "/missing").execute().await.assert_not_found();
    }
}
