#![allow(clippy::unused_async, unused_must_use)]
//! Tests for password login, social login, logout, and session supersession.

use salvo::http::StatusCode;
use serde_json::json;

use gavel_test::component::db::enums::DeviceKind;

use super::helpers::*;

/// Marks an account deactivated directly in the database.
async fn deactivate(test_db: &TestDb, account_id: &uuid::Uuid) {
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;
    use gavel_test::component::db::schema::account;

    let mut conn = test_db.get_conn().await.expect("Failed to get connection");
    diesel::update(account::table.filter(account::id.eq(account_id)))
        .set(account::is_deactivated.eq(true))
        .execute(&mut conn)
        .await
        .expect("Failed to deactivate account");
}

// ============================================================================
// Credentials
// ============================================================================

/// ## Summary
/// Test that valid credentials return a token and the profile, and the
/// token opens the profile route.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn login_returns_token_and_profile() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    test_db
        .seed_user("mia@example.com", "her password")
        .await
        .expect("Failed to seed user");
    let service = create_db_test_service(&test_db.url()).await;

    let response = TestRequest::post("/user/login")
        .json_body(&json!({"email": "mia@example.com", "password": "her password"}))
        .send(&service)
        .await;

    let response = response
        .assert_status(StatusCode::OK)
        .assert_body_contains("Logged in");
    let data = response.data();
    let token = data["token"].as_str().expect("token in response");
    assert!(!token.is_empty());
    assert_eq!(data["profile"]["email"], json!("mia@example.com"));

    let response = TestRequest::get("/user").bearer(token).send(&service).await;
    response.assert_status(StatusCode::OK);
}

/// ## Summary
/// Test that a wrong password is rejected without leaking which part was
/// wrong.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn login_rejects_wrong_password() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    test_db
        .seed_user("mia@example.com", "her password")
        .await
        .expect("Failed to seed user");
    let service = create_db_test_service(&test_db.url()).await;

    let response = TestRequest::post("/user/login")
        .json_body(&json!({"email": "mia@example.com", "password": "not her password"}))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_body_contains("Not authenticated");
}

/// ## Summary
/// Test that an unknown email gets the same answer as a wrong password.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn login_rejects_unknown_email() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;

    let response = TestRequest::post("/user/login")
        .json_body(&json!({"email": "nobody@example.com", "password": "anything"}))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_body_contains("Not authenticated");
}

// ============================================================================
// Sessions
// ============================================================================

/// ## Summary
/// Test that logging in again supersedes the previous session: the version
/// bumps and the old token stops working.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn second_login_supersedes_the_first() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let account_id = test_db
        .seed_user("serial@example.com", "password")
        .await
        .expect("Failed to seed user");
    let service = create_db_test_service(&test_db.url()).await;

    let body = json!({"email": "serial@example.com", "password": "password"});

    let response = TestRequest::post("/user/login")
        .json_body(&body)
        .send(&service)
        .await;
    let first_token = response.assert_status(StatusCode::OK).data()["token"]
        .as_str()
        .expect("token in response")
        .to_string();
    let first_version = test_db
        .session_row(account_id)
        .await
        .expect("Failed to load session")
        .expect("session row exists")
        .version;

    let response = TestRequest::post("/user/login")
        .json_body(&body)
        .send(&service)
        .await;
    let second_token = response.assert_status(StatusCode::OK).data()["token"]
        .as_str()
        .expect("token in response")
        .to_string();
    let second_version = test_db
        .session_row(account_id)
        .await
        .expect("Failed to load session")
        .expect("session row exists")
        .version;

    assert!(second_version > first_version);

    let response = TestRequest::get("/user")
        .bearer(&first_token)
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_body_contains("Not authenticated");

    let response = TestRequest::get("/user")
        .bearer(&second_token)
        .send(&service)
        .await;
    response.assert_status(StatusCode::OK);
}

/// ## Summary
/// Test that login records the submitted device and location on the
/// account.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn login_captures_device_and_location() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let account_id = test_db
        .seed_user("mobile@example.com", "password")
        .await
        .expect("Failed to seed user");
    let service = create_db_test_service(&test_db.url()).await;

    let response = TestRequest::post("/user/login")
        .json_body(&json!({
            "email": "mobile@example.com",
            "password": "password",
            "device_token": "push-token-1",
            "device_kind": "ios",
            "latitude": 40.7,
            "longitude": -74.0,
        }))
        .send(&service)
        .await;
    response.assert_status(StatusCode::OK);

    let account = test_db
        .account(account_id)
        .await
        .expect("Failed to load account");
    assert_eq!(account.device_token.as_deref(), Some("push-token-1"));
    assert_eq!(account.device_kind, Some(DeviceKind::Ios));
    assert_eq!(account.latitude, Some(40.7));
    assert_eq!(account.longitude, Some(-74.0));
}

/// ## Summary
/// Test that logout revokes the session and forgets the push device.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn logout_revokes_the_session() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let account_id = test_db
        .seed_user("leaving@example.com", "password")
        .await
        .expect("Failed to seed user");
    let service = create_db_test_service(&test_db.url()).await;

    let response = TestRequest::post("/user/login")
        .json_body(&json!({
            "email": "leaving@example.com",
            "password": "password",
            "device_token": "push-token-2",
            "device_kind": "android",
        }))
        .send(&service)
        .await;
    let token = response.assert_status(StatusCode::OK).data()["token"]
        .as_str()
        .expect("token in response")
        .to_string();

    let response = TestRequest::get("/user/logout")
        .bearer(&token)
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::OK)
        .assert_body_contains("Logged out");

    let response = TestRequest::get("/user").bearer(&token).send(&service).await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let session = test_db
        .session_row(account_id)
        .await
        .expect("Failed to load session");
    assert!(session.is_none());
    let account = test_db
        .account(account_id)
        .await
        .expect("Failed to load account");
    assert_eq!(account.device_token, None);
}

// ============================================================================
// Account State
// ============================================================================

/// ## Summary
/// Test that an account that never verified cannot log in.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn unverified_account_cannot_login() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    test_db
        .seed_account("pending@example.com", "password", AccountRole::User, false)
        .await
        .expect("Failed to seed account");
    let service = create_db_test_service(&test_db.url()).await;

    let response = TestRequest::post("/user/login")
        .json_body(&json!({"email": "pending@example.com", "password": "password"}))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("Account is not verified");
}

/// ## Summary
/// Test that a deactivated account is refused at login.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn deactivated_account_cannot_login() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let account_id = test_db
        .seed_user("banned@example.com", "password")
        .await
        .expect("Failed to seed user");
    deactivate(&test_db, &account_id).await;
    let service = create_db_test_service(&test_db.url()).await;

    let response = TestRequest::post("/user/login")
        .json_body(&json!({"email": "banned@example.com", "password": "password"}))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::FORBIDDEN)
        .assert_body_contains("Account is deactivated");
}

// ============================================================================
// Admin Login
// ============================================================================

/// ## Summary
/// Test that the admin login only admits admin accounts and its token
/// reaches the admin routes.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn admin_login_requires_an_admin_account() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    test_db
        .seed_user("plain@example.com", "password")
        .await
        .expect("Failed to seed user");
    test_db
        .seed_admin("boss@example.com", "admin password")
        .await
        .expect("Failed to seed admin");
    let service = create_db_test_service(&test_db.url()).await;

    let response = TestRequest::post("/admin/login")
        .json_body(&json!({"email": "plain@example.com", "password": "password"}))
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::FORBIDDEN)
        .assert_body_contains("Admin access required");

    let response = TestRequest::post("/admin/login")
        .json_body(&json!({"email": "boss@example.com", "password": "admin password"}))
        .send(&service)
        .await;
    let token = response.assert_status(StatusCode::OK).data()["token"]
        .as_str()
        .expect("token in response")
        .to_string();

    let response = TestRequest::get("/admin/dashboard")
        .bearer(&token)
        .send(&service)
        .await;
    response.assert_status(StatusCode::OK);
}

// ============================================================================
// Social Login
// ============================================================================

/// ## Summary
/// Test that a social identity creates a verified account on first sight
/// and returns the same account on the next visit.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn social_login_creates_then_recognizes() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;

    let body = json!({
        "social_id": "google-uid-1",
        "social_type": 1,
        "email": "sol@example.com",
        "first_name": "Sol",
    });

    let response = TestRequest::post("/user/socialLogin")
        .json_body(&body)
        .send(&service)
        .await;
    let response = response.assert_status(StatusCode::OK);
    let data = response.data();
    assert_eq!(data["profile"]["is_verified"], json!(true));
    let first_id = data["profile"]["id"].clone();

    let response = TestRequest::post("/user/socialLogin")
        .json_body(&body)
        .send(&service)
        .await;
    let response = response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["profile"]["id"], first_id);
}

/// ## Summary
/// Test that a social identity with a known live email attaches to that
/// account instead of creating a duplicate.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn social_login_adopts_existing_email() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let account_id = test_db
        .seed_user("known@example.com", "password")
        .await
        .expect("Failed to seed user");
    let service = create_db_test_service(&test_db.url()).await;

    let response = TestRequest::post("/user/socialLogin")
        .json_body(&json!({
            "social_id": "facebook-uid-1",
            "social_type": 2,
            "email": "known@example.com",
        }))
        .send(&service)
        .await;

    let response = response.assert_status(StatusCode::OK);
    assert_eq!(
        response.data()["profile"]["id"],
        json!(account_id.to_string())
    );
}

/// ## Summary
/// Test that an unknown social provider code is rejected.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn social_login_rejects_unknown_provider() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;

    let response = TestRequest::post("/user/socialLogin")
        .json_body(&json!({
            "social_id": "mystery-uid",
            "social_type": 9,
            "email": "mystery@example.com",
        }))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("unknown social provider");
}
