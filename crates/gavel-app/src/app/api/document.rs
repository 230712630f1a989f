use salvo::{Depot, Request, Router, handler};

use gavel_core::constants::DOCUMENT_ROUTE_COMPONENT;
use gavel_service::auth::depot::get_account_from_depot;
use gavel_service::clio::documents::{
    self, CreateDocumentRequest, DocumentListQuery, DocumentUpload, MarkUploadedRequest,
};

use crate::app::api::path_i64;
use crate::clio_handler::get_clio_from_depot;
use crate::error::AppResult;
use crate::middleware::auth::SessionAuth;
use crate::response::Envelope;

/// ## Summary
/// POST /document - Create a document under a matter and return the PUT
/// instructions for its first version.
///
/// The matter defaults to the caller's own; the caller PUTs the blob to
/// `put_url` with `put_headers` and then marks it uploaded.
///
/// ## Errors
/// Returns HTTP 400 for a blank name or an account with no matter
/// Returns HTTP 502 if the remote call fails
#[handler]
async fn create_document_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<DocumentUpload>> {
    let body: CreateDocumentRequest = req.parse_json().await?;
    let clio = get_clio_from_depot(depot)?;
    let account = get_account_from_depot(depot)?;

    let upload = documents::create_document(&clio, account, &body).await?;

    Ok(Envelope::ok("Document created", upload))
}

/// ## Summary
/// PUT /document/uploaded - Complete the two-phase upload by marking the
/// version the caller just PUT as fully uploaded.
///
/// ## Errors
/// Returns HTTP 502 if the remote call fails
#[handler]
async fn mark_uploaded_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<serde_json::Value>> {
    let body: MarkUploadedRequest = req.parse_json().await?;
    let clio = get_clio_from_depot(depot)?;

    let document = documents::mark_uploaded(&clio, &body).await?;

    Ok(Envelope::ok("Document marked uploaded", document))
}

/// ## Summary
/// GET /document - List the documents filed under a matter, defaulting to
/// the caller's own.
///
/// ## Errors
/// Returns HTTP 400 for an account with no matter
/// Returns HTTP 502 if the remote call fails
#[handler]
async fn list_documents_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<serde_json::Value>> {
    let query: DocumentListQuery = req.parse_queries()?;
    let clio = get_clio_from_depot(depot)?;
    let account = get_account_from_depot(depot)?;

    let listing = documents::list_documents(&clio, account, &query).await?;

    Ok(Envelope::ok("Documents fetched", listing))
}

/// ## Summary
/// GET /document/{document_id} - Fetch one document's metadata and the
/// download URL of its latest version.
///
/// ## Errors
/// Returns HTTP 400 for a malformed id
/// Returns HTTP 502 if the remote call fails
#[handler]
async fn get_document_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<serde_json::Value>> {
    let document_id = path_i64(req, "document_id")?;
    let clio = get_clio_from_depot(depot)?;

    let document = documents::get_document(&clio, document_id).await?;

    Ok(Envelope::ok("Document fetched", document))
}

/// ## Summary
/// DELETE /document/{document_id} - Delete a document.
///
/// ## Errors
/// Returns HTTP 400 for a malformed id
/// Returns HTTP 502 if the remote call fails
#[handler]
async fn delete_document_handler(req: &mut Request, depot: &mut Depot) -> AppResult<Envelope<()>> {
    let document_id = path_i64(req, "document_id")?;
    let clio = get_clio_from_depot(depot)?;

    documents::delete_document(&clio, document_id).await?;

    Ok(Envelope::message_only("Document deleted"))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(DOCUMENT_ROUTE_COMPONENT)
        .hoop(SessionAuth)
        .get(list_documents_handler)
        .post(create_document_handler)
        .push(Router::with_path("uploaded").put(mark_uploaded_handler))
        .push(
            Router::with_path("{document_id}")
                .get(get_document_handler)
                .delete(delete_document_handler),
        )
}
