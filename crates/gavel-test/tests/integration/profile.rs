#![allow(clippy::unused_async, unused_must_use)]
//! Tests for profile reads and partial profile updates.
//!
//! Linked accounts push contact-visible fields to the remote system before
//! anything lands locally; the test config points that remote at a closed
//! port, so those pushes answer 502 and leave the local row untouched.

use salvo::Service;
use salvo::http::StatusCode;
use serde_json::json;

use gavel_test::component::db::query::account as account_query;

use super::helpers::*;

/// Seeds a user account and logs it in.
async fn user_session(test_db: &TestDb, service: &Service) -> (uuid::Uuid, String) {
    let account_id = test_db
        .seed_user("rosa@example.com", "password")
        .await
        .expect("Failed to seed user");
    let response = TestRequest::post("/user/login")
        .json_body(&json!({"email": "rosa@example.com", "password": "password"}))
        .send(service)
        .await;
    let token = response.assert_status(StatusCode::OK).data()["token"]
        .as_str()
        .expect("token in response")
        .to_string();
    (account_id, token)
}

// ============================================================================
// Local Updates
// ============================================================================

/// ## Summary
/// Test that an update lands on the row and comes back on the next read,
/// with the stored image object name rendered as an absolute URL.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn profile_update_changes_local_fields() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_session(&test_db, &service).await;

    let response = TestRequest::put("/user/profile")
        .bearer(&token)
        .json_body(&json!({
            "first_name": "Rosa",
            "physical_address": "12 Harbor Way",
            "profile_image": "uploads/rosa.png",
        }))
        .send(&service)
        .await;
    let updated = response
        .assert_status(StatusCode::OK)
        .assert_body_contains("Profile updated")
        .data();
    assert_eq!(updated["first_name"], json!("Rosa"));
    assert_eq!(updated["physical_address"], json!("12 Harbor Way"));
    assert_eq!(
        updated["profile_image"],
        json!("http://127.0.0.1:5800/uploads/rosa.png")
    );

    let fetched = TestRequest::get("/user")
        .bearer(&token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .data();
    assert_eq!(fetched["first_name"], json!("Rosa"));
    assert_eq!(fetched["physical_address"], json!("12 Harbor Way"));
}

/// ## Summary
/// Test that absent fields keep their values across successive updates.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn profile_update_is_partial() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_session(&test_db, &service).await;

    TestRequest::put("/user/profile")
        .bearer(&token)
        .json_body(&json!({"first_name": "Rosa"}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    let updated = TestRequest::put("/user/profile")
        .bearer(&token)
        .json_body(&json!({"phone": "5550100"}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .data();

    assert_eq!(updated["first_name"], json!("Rosa"));
    assert_eq!(updated["phone"], json!("5550100"));
}

/// ## Summary
/// Test that an empty update changes nothing and still answers the profile.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn empty_update_is_a_no_op() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_session(&test_db, &service).await;

    let updated = TestRequest::put("/user/profile")
        .bearer(&token)
        .json_body(&json!({}))
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .data();

    assert_eq!(updated["email"], json!("rosa@example.com"));
    assert_eq!(updated["first_name"], json!("Test"));
    assert_eq!(updated["last_name"], json!("Account"));
}

// ============================================================================
// Linked Accounts
// ============================================================================

/// ## Summary
/// Test that a linked account pushes contact-visible fields to the remote
/// system first, so a failed push leaves the local row untouched.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn linked_account_pushes_the_contact_first() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (account_id, token) = user_session(&test_db, &service).await;
    {
        let mut conn = test_db.get_conn().await.expect("Failed to get connection");
        account_query::claim_clio_contact(&mut conn, account_id, 100)
            .await
            .expect("Failed to claim contact");
    }

    let response = TestRequest::put("/user/profile")
        .bearer(&token)
        .json_body(&json!({"first_name": "Rosa"}))
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_body_contains("Upstream request failed");

    let fetched = TestRequest::get("/user")
        .bearer(&token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .data();
    assert_eq!(fetched["first_name"], json!("Test"));
}

/// ## Summary
/// Test that fields the contact never carries update locally without a
/// remote call even on a linked account.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn local_only_fields_skip_the_remote() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (account_id, token) = user_session(&test_db, &service).await;
    {
        let mut conn = test_db.get_conn().await.expect("Failed to get connection");
        account_query::claim_clio_contact(&mut conn, account_id, 100)
            .await
            .expect("Failed to claim contact");
    }

    let updated = TestRequest::put("/user/profile")
        .bearer(&token)
        .json_body(&json!({
            "country_code": "US",
            "profile_image": "uploads/rosa.png",
        }))
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .data();

    assert_eq!(updated["country_code"], json!("US"));
    assert_eq!(
        updated["profile_image"],
        json!("http://127.0.0.1:5800/uploads/rosa.png")
    );
}
