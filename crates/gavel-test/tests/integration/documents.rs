#![allow(clippy::unused_async, unused_must_use)]
//! Tests for the document routes.
//!
//! Document storage lives on the remote practice-management host, which the
//! test config points at a closed port. These tests cover the validation
//! that runs before the network and assert 502 wherever a call goes out.

use salvo::Service;
use salvo::http::StatusCode;
use serde_json::json;

use gavel_test::component::db::query::account as account_query;

use super::helpers::*;

/// Seeds a user account and logs it in.
async fn user_session(test_db: &TestDb, service: &Service) -> (uuid::Uuid, String) {
    let account_id = test_db
        .seed_user("client@example.com", "password")
        .await
        .expect("Failed to seed user");
    let response = TestRequest::post("/user/login")
        .json_body(&json!({"email": "client@example.com", "password": "password"}))
        .send(service)
        .await;
    let token = response.assert_status(StatusCode::OK).data()["token"]
        .as_str()
        .expect("token in response")
        .to_string();
    (account_id, token)
}

// ============================================================================
// Creation
// ============================================================================

/// ## Summary
/// Test that a document needs a non-blank name.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn create_document_requires_a_name() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_session(&test_db, &service).await;

    let response = TestRequest::post("/document")
        .bearer(&token)
        .json_body(&json!({"name": "   "}))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("name is required");
}

/// ## Summary
/// Test that an account without a matter cannot file a document unless the
/// request names one.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn create_document_needs_a_matter() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_session(&test_db, &service).await;

    let response = TestRequest::post("/document")
        .bearer(&token)
        .json_body(&json!({"name": "Engagement letter"}))
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("Account has no matter to file the document under");

    // An explicit matter id bypasses the account linkage and goes remote
    let response = TestRequest::post("/document")
        .bearer(&token)
        .json_body(&json!({"name": "Engagement letter", "matter_id": 7}))
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_body_contains("Upstream request failed");
}

/// ## Summary
/// Test that a linked account's own matter carries the document to the
/// remote call.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn create_document_uses_the_account_matter() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (account_id, token) = user_session(&test_db, &service).await;
    {
        let mut conn = test_db.get_conn().await.expect("Failed to get connection");
        account_query::claim_clio_contact(&mut conn, account_id, 100)
            .await
            .expect("Failed to claim contact");
        account_query::set_clio_matter(&mut conn, account_id, 200)
            .await
            .expect("Failed to set matter");
    }

    let response = TestRequest::post("/document")
        .bearer(&token)
        .json_body(&json!({"name": "Engagement letter"}))
        .send(&service)
        .await;

    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_body_contains("Upstream request failed");
}

// ============================================================================
// Listing and Lookup
// ============================================================================

/// ## Summary
/// Test that listing documents needs a matter, either the account's own or
/// an explicit `matter_id` parameter.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn list_documents_needs_a_matter() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_session(&test_db, &service).await;

    let response = TestRequest::get("/document").bearer(&token).send(&service).await;
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("Account has no matter to list documents for");

    let response = TestRequest::get("/document?matter_id=7")
        .bearer(&token)
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_body_contains("Upstream request failed");
}

/// ## Summary
/// Test that the document id in the path must be an integer.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn document_id_must_be_an_integer() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_session(&test_db, &service).await;

    let response = TestRequest::get("/document/abc")
        .bearer(&token)
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("document_id must be an integer");

    let response = TestRequest::get("/document/5")
        .bearer(&token)
        .send(&service)
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

// ============================================================================
// Upload Completion and Removal
// ============================================================================

/// ## Summary
/// Test that marking an upload finished and deleting a document both talk
/// to the remote host.
#[test_log::test(tokio::test)]
#[ignore = "requires a running Postgres"]
async fn upload_and_delete_reach_the_remote() {
    let test_db = TestDb::new().await.expect("Failed to create test database");
    let service = create_db_test_service(&test_db.url()).await;
    let (_, token) = user_session(&test_db, &service).await;

    let response = TestRequest::put("/document/uploaded")
        .bearer(&token)
        .json_body(&json!({"document_id": 5, "uuid": "f1e2d3"}))
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_body_contains("Upstream request failed");

    let response = TestRequest::delete("/document/5")
        .bearer(&token)
        .send(&service)
        .await;
    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_body_contains("Upstream request failed");
}
