#![allow(clippy::unused_async, unused_must_use)]
//! Tests for the point conversion rate and activity booking.
//!
//! The remote practice-management host in the test config points at a
//! closed port, so every path that actually reaches the network is expected
//! to answer 502. Everything that fails before the network is asserted
//! precisely.

use salvo::Service;
use salvo::http::StatusCode;
use serde_json::json;

use gavel_test::component::db::query::account as account_query;

use super::helpers::*;

/// Seeds an admin under the given email and logs it in.
async fn admin_token(test_db: &TestDb, service: &Service, email: &str) -> String {
    test_db
        .seed_admin(email, "admin password")
        .await
        .expect("Failed to seed admin");
    let response = TestRequest::post("/admin/login")
        .json_body(&json!({"email": email, "password": "admin password"}))
        .send(service)
        .await;
    response.assert_status(StatusCode::OK).data()["token"]
        .as_str()
        .expect("token in response")
        .to_string()
}

/// Seeds a user under the given email and logs it in.
async fn user_token(test_db: &TestDb, service: &Service, email: &str) -> (uuid::Uuid, String) {
    let account_id = test_db
        .seed_user(email, "password")
        .await
        .expect("Failed to seed user");
    let response = TestRequest::post("/user/login")
        .json_body(&json!({"email": email, "password": "password"}))
        .send(service)
        .await;
    let token = response.assert_status(StatusCode::OK).data()["token"]
        .as_str()
        .expect("token in response")
        .to_string();
    (account_id, token)
}

/// Links an account to a contact and matter directly in the database.
async fn link_account(test_db: &TestDb, account_id: uuid::Uuid) {
    let mut conn = test_db.get_conn().await.expect("Failed to get connection");
    account_query::claim_clio_contact(&mut conn, account_id, 100)
        .await
        .expect("Failed to claim contact");
    account_query::set_clio_matter(&mut conn, account_id, 200)
        .await
        .expect("Failed to set matter");
}

// ============================================================================
// Point Value
// ============================================================================

/// ## Summary
/// Test that the stored rate starts as `null`, takes an update, and reads
/// back.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn point_value_round_trip() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let token = admin_token(&test_db, &service, "admin@gavel.test").await;

    let response = TestRequest::get("/clio/point-value")
        .bearer(&token)
        .send(&service)
        .await;
    let response = response.assert_status(StatusCode::OK);
    assert_eq!(response.data(), json!({"point_value": null}));

    let response = TestRequest::put("/clio/point-value")
        .bearer(&token)
        .json_body(&json!({"point_value": 2.5}))
        .send(&service)
        .await;
    let response = response
        .assert_status(StatusCode::OK)
        .assert_body_contains("Point value updated");
    assert_eq!(response.data(), json!({"point_value": 2.5}));

    let response = TestRequest::get("/clio/point-value")
        .bearer(&token)
        .send(&service)
        .await;
    let response = response.assert_status(StatusCode::OK);
    assert_eq!(response.data(), json!({"point_value": 2.5}));
}

/// ## Summary
/// Test that non-positive rates are refused.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn point_value_rejects_non_positive() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let token = admin_token(&test_db, &service, "admin@gavel.test").await;

    for bad in [json!(0), json!(-1.5)] {
        let response = TestRequest::put("/clio/point-value")
            .bearer(&token)
            .json_body(&json!({"point_value": bad}))
            .send(&service)
            .await;
        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_body_contains("point_value must be a positive number");
    }
}

/// ## Summary
/// Test that the rate read back is the one most recently written, whoever
/// wrote it.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn latest_rate_update_wins() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let first = admin_token(&test_db, &service, "first@gavel.test").await;
    let second = admin_token(&test_db, &service, "second@gavel.test").await;

    TestRequest::put("/clio/point-value")
        .bearer(&first)
        .json_body(&json!({"point_value": 2.5}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    TestRequest::put("/clio/point-value")
        .bearer(&second)
        .json_body(&json!({"point_value": 4.0}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    let response = TestRequest::get("/clio/point-value")
        .bearer(&first)
        .send(&service)
        .await;
    let response = response.assert_status(StatusCode::OK);
    assert_eq!(response.data(), json!({"point_value": 4.0}));
}

/// ## Summary
/// Test that the rate endpoints sit behind the admin gate.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn point_value_requires_an_admin() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_token(&test_db, &service, "client@example.com").await;

    let response = TestRequest::get("/clio/point-value")
        .bearer(&token)
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::FORBIDDEN)
        .assert_body_contains("Admin access required");

    let response = TestRequest::put("/clio/point-value")
        .bearer(&token)
        .json_body(&json!({"point_value": 2.5}))
        .send(&service)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Activity Booking
// ============================================================================

/// ## Summary
/// Test that zero or negative points never leave the house.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn post_activity_rejects_non_positive_points() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_token(&test_db, &service, "client@example.com").await;

    let response = TestRequest::post("/clio/activities")
        .bearer(&token)
        .json_body(&json!({"activity_description_id": 3, "points": 0}))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("points must be a positive number");
}

/// ## Summary
/// Test that an account without a matter cannot book time.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn post_activity_requires_a_matter() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_token(&test_db, &service, "client@example.com").await;

    let response = TestRequest::post("/clio/activities")
        .bearer(&token)
        .json_body(&json!({"activity_description_id": 3, "points": 5}))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("Account has no matter to bill against");
}

/// ## Summary
/// Test that booking stops before the network when no rate is configured.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn post_activity_requires_a_configured_rate() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (account_id, token) = user_token(&test_db, &service, "client@example.com").await;
    link_account(&test_db, account_id).await;

    let response = TestRequest::post("/clio/activities")
        .bearer(&token)
        .json_body(&json!({"activity_description_id": 3, "points": 5}))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("Point conversion rate is not configured");
}

/// ## Summary
/// Test that a fully set up booking makes it to the remote call. The test
/// host is unreachable, so the answer is a 502.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn post_activity_reaches_for_the_remote() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let admin = admin_token(&test_db, &service, "admin@gavel.test").await;
    let (account_id, token) = user_token(&test_db, &service, "client@example.com").await;
    link_account(&test_db, account_id).await;
    TestRequest::put("/clio/point-value")
        .bearer(&admin)
        .json_body(&json!({"point_value": 2.5}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    let response = TestRequest::post("/clio/activities")
        .bearer(&token)
        .json_body(&json!({"activity_description_id": 3, "points": 5, "date": "2026-08-01"}))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_body_contains("Upstream request failed");
}

// ============================================================================
// Activity Descriptions
// ============================================================================

/// ## Summary
/// Test that a description cannot be created without a name.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn create_description_requires_a_name() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let token = admin_token(&test_db, &service, "admin@gavel.test").await;

    for body in [json!({}), json!({"name": "   "})] {
        let response = TestRequest::post("/clio/activity-descriptions")
            .bearer(&token)
            .json_body(&body)
            .send(&service)
            .await;
        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_body_contains("name is required");
    }
}

/// ## Summary
/// Test that description updates validate the id and refuse empty patches.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn update_description_validates_input() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let token = admin_token(&test_db, &service, "admin@gavel.test").await;

    let response = TestRequest::put("/clio/activity-descriptions/12")
        .bearer(&token)
        .json_body(&json!({}))
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("nothing to update");

    let response = TestRequest::put("/clio/activity-descriptions/abc")
        .bearer(&token)
        .json_body(&json!({"name": "Research"}))
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("description_id must be an integer");
}

/// ## Summary
/// Test that the priced catalog needs the remote host.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn list_descriptions_needs_the_remote() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let token = admin_token(&test_db, &service, "admin@gavel.test").await;

    let response = TestRequest::get("/clio/activity-descriptions")
        .bearer(&token)
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_body_contains("Upstream request failed");
}
