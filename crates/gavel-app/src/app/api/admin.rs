use salvo::{Depot, Request, Router, handler};

use gavel_core::constants::ADMIN_ROUTE_COMPONENT;
use gavel_db::db::query::account::DashboardCounts;
use gavel_service::account::lifecycle::{self, AuthenticatedAccount, LoginRequest};
use gavel_service::account::profile::Profile;
use gavel_service::account::roster::{
    self, AccountPage, CreateAttorneyRequest, CreatedAttorney, PageQuery, UpdateAttorneyRequest,
};

use crate::app::api::path_uuid;
use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use crate::mail_handler::get_mailer_from_depot;
use crate::middleware::auth::{AdminGate, SessionAuth};
use crate::response::Envelope;

/// ## Summary
/// POST /admin/login - Authenticate an administrator.
///
/// The role check runs here, so valid credentials on a regular account still
/// answer 403.
///
/// ## Errors
/// Returns HTTP 401 for bad credentials
/// Returns HTTP 403 for a non-admin or deactivated account
#[handler]
async fn admin_login_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<AuthenticatedAccount>> {
    let body: LoginRequest = req.parse_json().await?;
    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let authenticated =
        lifecycle::admin_login(&mut conn, &config.auth, &config.server.origin(), &body).await?;

    Ok(Envelope::ok("Logged in", authenticated))
}

/// ## Summary
/// GET /admin/dashboard - Aggregate counters for the admin landing page.
///
/// ## Errors
/// Returns HTTP 401 without a session, HTTP 403 without the admin role
#[handler]
async fn dashboard_handler(depot: &mut Depot) -> AppResult<Envelope<DashboardCounts>> {
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let counts = roster::dashboard(&mut conn).await?;

    Ok(Envelope::ok("Dashboard fetched", counts))
}

/// ## Summary
/// GET /admin/users - Page through user accounts, newest first.
///
/// Accepts `page`, `per_page`, and a case-insensitive `search` over name and
/// email.
///
/// ## Errors
/// Returns HTTP 401 without a session, HTTP 403 without the admin role
#[handler]
async fn list_users_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<AccountPage>> {
    let query: PageQuery = req.parse_queries()?;
    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let page = roster::list_users(&mut conn, &config.server.origin(), &query).await?;

    Ok(Envelope::ok("Users fetched", page))
}

/// ## Summary
/// GET /admin/attorneys - Page through attorney accounts, newest first.
///
/// ## Errors
/// Returns HTTP 401 without a session, HTTP 403 without the admin role
#[handler]
async fn list_attorneys_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<AccountPage>> {
    let query: PageQuery = req.parse_queries()?;
    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let page = roster::list_attorneys(&mut conn, &config.server.origin(), &query).await?;

    Ok(Envelope::ok("Attorneys fetched", page))
}

/// ## Summary
/// POST /admin/attorneys - Provision an attorney and mail the credentials.
///
/// ## Errors
/// Returns HTTP 409 if a live account already holds the email
/// Returns HTTP 502 if the welcome mail cannot be sent
#[handler]
async fn create_attorney_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<CreatedAttorney>> {
    let body: CreateAttorneyRequest = req.parse_json().await?;
    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mailer = get_mailer_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let created =
        roster::create_attorney(&mut conn, mailer.as_ref(), &config.mail.templates, &body).await?;

    Ok(Envelope::ok("Attorney created", created))
}

/// ## Summary
/// PUT /admin/attorneys/{attorney_id} - Update an attorney's profile fields.
///
/// ## Errors
/// Returns HTTP 400 for a malformed id
/// Returns HTTP 404 if the id does not belong to a live attorney
#[handler]
async fn update_attorney_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<Profile>> {
    let attorney_id = path_uuid(req, "attorney_id")?;
    let body: UpdateAttorneyRequest = req.parse_json().await?;
    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let updated =
        roster::update_attorney(&mut conn, &config.server.origin(), attorney_id, &body).await?;

    Ok(Envelope::ok("Attorney updated", updated))
}

/// ## Summary
/// DELETE /admin/attorneys/{attorney_id} - Soft-delete an attorney.
///
/// ## Errors
/// Returns HTTP 400 for a malformed id
/// Returns HTTP 404 if the id does not belong to a live attorney
#[handler]
async fn delete_attorney_handler(req: &mut Request, depot: &mut Depot) -> AppResult<Envelope<()>> {
    let attorney_id = path_uuid(req, "attorney_id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    roster::delete_attorney(&mut conn, attorney_id).await?;

    Ok(Envelope::message_only("Attorney deleted"))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(ADMIN_ROUTE_COMPONENT)
        .push(Router::with_path("login").post(admin_login_handler))
        .push(
            Router::new()
                .hoop(SessionAuth)
                .hoop(AdminGate)
                .push(Router::with_path("dashboard").get(dashboard_handler))
                .push(Router::with_path("users").get(list_users_handler))
                .push(
                    Router::with_path("attorneys")
                        .get(list_attorneys_handler)
                        .post(create_attorney_handler)
                        .push(
                            Router::with_path("{attorney_id}")
                                .put(update_attorney_handler)
                                .delete(delete_attorney_handler),
                        ),
                ),
        )
}
