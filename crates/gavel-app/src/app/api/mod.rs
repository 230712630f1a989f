mod admin;
mod clio;
mod document;
mod healthcheck;
mod user;

use salvo::{Request, Router};
use uuid::Uuid;

use crate::error::{AppError, bad_request};

// Re-export route constants from core
pub use gavel_core::constants::{
    ADMIN_ROUTE_COMPONENT, ADMIN_ROUTE_PREFIX, CLIO_ROUTE_COMPONENT, CLIO_ROUTE_PREFIX,
    DOCUMENT_ROUTE_COMPONENT, DOCUMENT_ROUTE_PREFIX, HEALTHCHECK_ROUTE_COMPONENT,
    USER_ROUTE_COMPONENT, USER_ROUTE_PREFIX,
};

/// ## Summary
/// Constructs the main API router with all endpoint groups.
#[must_use]
pub fn routes() -> Router {
    Router::new()
        .push(healthcheck::routes())
        .push(user::routes())
        .push(admin::routes())
        .push(clio::routes())
        .push(document::routes())
}

/// Pulls a path parameter and parses it as a UUID.
pub(crate) fn path_uuid(req: &Request, key: &str) -> Result<Uuid, AppError> {
    let raw = req
        .param::<String>(key)
        .ok_or_else(|| bad_request(format!("{key} is required")))?;
    Uuid::parse_str(&raw).map_err(|_err| bad_request(format!("{key} must be a UUID")))
}

/// Pulls a path parameter and parses it as an integer id.
pub(crate) fn path_i64(req: &Request, key: &str) -> Result<i64, AppError> {
    let raw = req
        .param::<String>(key)
        .ok_or_else(|| bad_request(format!("{key} is required")))?;
    raw.parse::<i64>()
        .map_err(|_err| bad_request(format!("{key} must be an integer")))
}
