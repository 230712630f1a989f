#![allow(clippy::unused_async, unused_must_use)]
//! Routing-level tests: the health probe, the 404 envelope, and the session
//! gates in front of protected subtrees.
//!
//! Nothing here needs a database; these run against the bare service.

use salvo::http::StatusCode;

use super::helpers::*;

// ============================================================================
// Healthcheck
// ============================================================================

/// ## Summary
/// Test that the health probe answers with a plain OK body.
#[test_log::test(tokio::test)]
async fn healthcheck_returns_plain_ok() {
    let service = create_test_service();

    let response = TestRequest::get("/healthcheck").send(service).await;

    let response = response.assert_status(StatusCode::OK);
    assert_eq!(response.body_string(), "OK");
}

// ============================================================================
// Unmatched Routes
// ============================================================================

/// ## Summary
/// Test that an unknown path answers 404 with the failure envelope.
#[test_log::test(tokio::test)]
async fn unknown_route_gets_envelope_404() {
    let service = create_test_service();

    let response = TestRequest::get("/no-such-route").send(service).await;

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_body_contains("\"success\":false")
        .assert_body_contains("Route not found");
}

/// ## Summary
/// Test that a known path with the wrong method falls through to the 404
/// envelope instead of reaching a handler.
#[test_log::test(tokio::test)]
async fn wrong_method_gets_envelope_404() {
    let service = create_test_service();

    let response = TestRequest::put("/healthcheck").send(service).await;

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_body_contains("Route not found");
}

// ============================================================================
// Session Gates
// ============================================================================

/// ## Summary
/// Test that the profile route rejects a tokenless request before touching
/// any backing service.
#[test_log::test(tokio::test)]
async fn profile_requires_bearer_token() {
    let service = create_test_service();

    let response = TestRequest::get("/user").send(service).await;

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_body_contains("Not authenticated");
}

/// ## Summary
/// Test that every protected subtree demands a session.
#[test_log::test(tokio::test)]
async fn protected_subtrees_require_a_token() {
    let service = create_test_service();

    for (method, path) in [
        ("GET", "/user/logout"),
        ("PUT", "/user/profile"),
        ("GET", "/admin/dashboard"),
        ("GET", "/admin/users"),
        ("GET", "/admin/attorneys"),
        ("POST", "/clio/activities"),
        ("GET", "/clio/contacts"),
        ("GET", "/clio/point-value"),
        ("GET", "/document"),
        ("POST", "/document"),
        ("PUT", "/document/uploaded"),
    ] {
        let request = match method {
            "GET" => TestRequest::get(path),
            "PUT" => TestRequest::put(path),
            _ => TestRequest::post(path),
        };
        let response = request.send(service).await;
        assert_eq!(
            response.status,
            StatusCode::UNAUTHORIZED,
            "{method} {path} should demand a session, got {} with body:\n{}",
            response.status,
            response.body_string()
        );
    }
}

/// ## Summary
/// Test that the admin login route sits outside the session gate: an
/// unreadable body is a 400, not a 401.
#[test_log::test(tokio::test)]
async fn admin_login_is_not_behind_the_gate() {
    let service = create_test_service();

    let response = TestRequest::post("/admin/login")
        .content_type("application/json")
        .body("{")
        .send(service)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Body Parsing
// ============================================================================

/// ## Summary
/// Test that an unreadable JSON body answers 400 before any work happens.
#[test_log::test(tokio::test)]
async fn malformed_json_body_answers_400() {
    let service = create_test_service();

    let response = TestRequest::post("/user")
        .content_type("application/json")
        .body("{not json")
        .send(service)
        .await;

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("Invalid request body");
}
