use salvo::Depot;
use salvo::http::header::AUTHORIZATION;
use salvo::writing::Writer;

use gavel_db::model::account::Account;
use gavel_service::auth::depot::{depot_keys, get_admin_from_depot};
use gavel_service::auth::session;
use gavel_service::error::ServiceError;

use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppError;

/// ## Summary
/// Session middleware that verifies the bearer token and stores the account
/// in the depot. Requests without a live session get the failure envelope
/// and never reach the goal handler.
///
/// ## Side Effects
/// Inserts the authenticated account into the depot for downstream handlers.
///
/// ## Errors
/// Returns HTTP 401 if the token is missing, unverifiable, or superseded.
#[salvo::async_trait]
impl salvo::Handler for SessionAuth {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        tracing::trace!("Authenticating request");

        match authenticate_request(req, depot).await {
            Ok(account) => {
                tracing::debug!(account_id = %account.id, "Session authenticated");
                depot.insert(depot_keys::AUTHENTICATED_ACCOUNT, account);
            }
            Err(error) => {
                error.write(req, depot, res).await;
                ctrl.skip_rest();
            }
        }
    }
}

/// Resolves the request's bearer token to a live account. A missing token
/// answers before any database round trip.
async fn authenticate_request(
    req: &salvo::Request,
    depot: &Depot,
) -> Result<Account, AppError> {
    let token = bearer_token(req).ok_or(ServiceError::NotAuthenticated)?;

    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(session::authenticate(&mut conn, &config.auth, token).await?)
}

/// Extracts the token from an `Authorization: Bearer` header, if any.
fn bearer_token(req: &salvo::Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// ## Summary
/// Admin gate. Placed after [`SessionAuth`], it rejects sessions whose
/// account does not hold the admin role.
///
/// ## Errors
/// Returns HTTP 403 when the authenticated account is not an administrator.
#[salvo::async_trait]
impl salvo::Handler for AdminGate {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        if let Some(denied) = get_admin_from_depot(depot).err() {
            AppError::from(denied).write(req, depot, res).await;
            ctrl.skip_rest();
        }
    }
}

/// Middleware handler for session authentication.
/// Use this as a hoop on routes that require a logged-in account.
pub struct SessionAuth;

/// Middleware handler restricting a subtree to administrators.
pub struct AdminGate;
