//! Two-phase document upload against the external store.
//!
//! Creating a document reserves a version and returns presigned PUT
//! instructions; the caller uploads the blob directly and then marks the
//! version fully uploaded. The blob itself never passes through this
//! service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use gavel_db::model::account::Account;

use crate::clio::client::{self, ClioClient};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub matter_id: Option<i64>,
}

/// Upload instructions for the blob the caller must PUT externally.
#[derive(Debug, Serialize)]
pub struct DocumentUpload {
    pub document_id: i64,
    pub uuid: String,
    pub put_url: String,
    pub put_headers: Value,
}

/// ## Summary
/// Creates a document under a matter and returns the PUT instructions for
/// its first version. The matter defaults to the caller's own.
///
/// ## Errors
/// Returns `ValidationError` for a blank name or an account with no matter
/// and external errors from the remote call.
pub async fn create_document(
    clio: &ClioClient,
    account: &Account,
    request: &CreateDocumentRequest,
) -> ServiceResult<DocumentUpload> {
    if request.name.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "name is required".to_string(),
        ));
    }
    let Some(matter_id) = request.matter_id.or(account.clio_matter_id) else {
        return Err(ServiceError::ValidationError(
            "Account has no matter to file the document under".to_string(),
        ));
    };

    let payload = serde_json::json!({
        "data": {
            "name": request.name,
            "parent": { "id": matter_id, "type": "Matter" },
        }
    });
    let created = client::data(
        clio.post(
            "/documents.json?fields=id,latest_document_version{uuid,put_url,put_headers}",
            &payload,
        )
        .await?,
    )?;
    document_upload(&created)
}

#[derive(Debug, Deserialize)]
pub struct MarkUploadedRequest {
    pub document_id: i64,
    pub uuid: String,
}

/// ## Summary
/// Completes the two-phase upload by flipping `fully_uploaded` on the
/// version the caller just PUT.
///
/// ## Errors
/// Returns external errors from the remote call.
pub async fn mark_uploaded(
    clio: &ClioClient,
    request: &MarkUploadedRequest,
) -> ServiceResult<Value> {
    let payload = serde_json::json!({
        "data": {
            "uuid": request.uuid,
            "fully_uploaded": true,
        }
    });
    client::data(
        clio.patch(
            &format!(
                "/documents/{}.json?fields=id,name,latest_document_version{{uuid,fully_uploaded}}",
                request.document_id
            ),
            &payload,
        )
        .await?,
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentListQuery {
    pub matter_id: Option<i64>,
}

/// ## Summary
/// Lists the documents filed under a matter, defaulting to the caller's own.
///
/// ## Errors
/// Returns `ValidationError` for an account with no matter and external
/// errors from the remote call.
pub async fn list_documents(
    clio: &ClioClient,
    account: &Account,
    query: &DocumentListQuery,
) -> ServiceResult<Value> {
    let Some(matter_id) = query.matter_id.or(account.clio_matter_id) else {
        return Err(ServiceError::ValidationError(
            "Account has no matter to list documents for".to_string(),
        ));
    };

    clio.get(
        "/documents.json",
        &[
            ("matter_id", matter_id.to_string()),
            (
                "fields",
                "id,name,created_at,latest_document_version{uuid,fully_uploaded}".to_string(),
            ),
        ],
    )
    .await
}

/// ## Errors
/// Returns external errors from the remote call, including the remote 404
/// for an unknown id.
pub async fn get_document(clio: &ClioClient, document_id: i64) -> ServiceResult<Value> {
    client::data(
        clio.get(
            &format!("/documents/{document_id}.json"),
            &[(
                "fields",
                "id,name,created_at,latest_document_version{uuid,fully_uploaded,download_url}"
                    .to_string(),
            )],
        )
        .await?,
    )
}

/// ## Errors
/// Returns external errors from the remote call.
pub async fn delete_document(clio: &ClioClient, document_id: i64) -> ServiceResult<()> {
    clio.delete(&format!("/documents/{document_id}.json")).await
}

fn document_upload(record: &Value) -> ServiceResult<DocumentUpload> {
    let document_id = client::record_id(record)?;
    let version = record.get("latest_document_version").ok_or_else(|| {
        ServiceError::ExternalFormat("document has no latest version".to_string())
    })?;
    let uuid = version
        .get("uuid")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ServiceError::ExternalFormat("document version is missing its uuid".to_string())
        })?
        .to_string();
    let put_url = version
        .get("put_url")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ServiceError::ExternalFormat("document version is missing its put_url".to_string())
        })?
        .to_string();
    let put_headers = version.get("put_headers").cloned().unwrap_or(Value::Null);

    Ok(DocumentUpload {
        document_id,
        uuid,
        put_url,
        put_headers,
    })
}
