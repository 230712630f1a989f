use salvo::{Depot, Request, Router, handler};
use serde_json::json;

use gavel_core::constants::USER_ROUTE_COMPONENT;
use gavel_service::account::lifecycle::{
    self, AuthenticatedAccount, ChangePasswordRequest, LoginRequest, RegisterRequest,
    RegisteredAccount, SendOtpRequest, SocialLoginRequest, VerifiedOtp, VerifyOtpRequest,
};
use gavel_service::account::profile::{self, Profile, ProfileUpdateRequest};
use gavel_service::auth::depot::get_account_from_depot;

use crate::clio_handler::get_clio_from_depot;
use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use crate::mail_handler::get_mailer_from_depot;
use crate::middleware::auth::SessionAuth;
use crate::response::Envelope;

/// ## Summary
/// POST /user - Register an account and send the verification code.
///
/// ## Errors
/// Returns HTTP 409 if the email already belongs to a verified account
/// Returns HTTP 400 for missing fields
/// Returns HTTP 502 if the verification mail cannot be sent
#[handler]
async fn register_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<RegisteredAccount>> {
    let body: RegisterRequest = req.parse_json().await?;
    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mailer = get_mailer_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let registered =
        lifecycle::register(&mut conn, mailer.as_ref(), &config.mail.templates, &body).await?;

    Ok(Envelope::ok("Verification code sent", registered))
}

/// ## Summary
/// PUT /user/verifyOtp - Check a submitted code and apply its outcome.
///
/// Registration codes (purpose 1) verify the account and answer with a
/// session token and profile; reset codes answer with the account id and
/// role for the change-password step.
///
/// ## Errors
/// Returns HTTP 400 if the code is wrong or expired
/// Returns HTTP 404 if the account does not exist
#[handler]
async fn verify_otp_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<VerifiedOtp>> {
    let body: VerifyOtpRequest = req.parse_json().await?;
    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let outcome =
        lifecycle::verify_otp(&mut conn, &config.auth, &config.server.origin(), &body).await?;

    Ok(Envelope::ok("Code verified", outcome))
}

/// ## Summary
/// PUT /user/sendOtp - Issue a fresh code for reset, resend, or email change.
///
/// ## Errors
/// Returns HTTP 404 if no live account holds the email
/// Returns HTTP 502 if the mail cannot be sent
#[handler]
async fn send_otp_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<serde_json::Value>> {
    let body: SendOtpRequest = req.parse_json().await?;
    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mailer = get_mailer_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let account_id =
        lifecycle::send_otp(&mut conn, mailer.as_ref(), &config.mail.templates, &body).await?;

    Ok(Envelope::ok(
        "Verification code sent",
        json!({ "account_id": account_id }),
    ))
}

/// ## Summary
/// POST /user/login - Authenticate by email and password.
///
/// ## Errors
/// Returns HTTP 401 for bad credentials
/// Returns HTTP 400 for an account that has not verified its email
/// Returns HTTP 403 for a deactivated account
#[handler]
async fn login_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<AuthenticatedAccount>> {
    let body: LoginRequest = req.parse_json().await?;
    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let authenticated =
        lifecycle::login(&mut conn, &config.auth, &config.server.origin(), &body).await?;

    Ok(Envelope::ok("Logged in", authenticated))
}

/// ## Summary
/// POST /user/socialLogin - Authenticate through a social identity.
///
/// Matches the provider identity first, adopts a live account with the same
/// email next, and creates a verified account otherwise.
///
/// ## Errors
/// Returns HTTP 400 for an unknown provider code
/// Returns HTTP 403 for a deactivated account
#[handler]
async fn social_login_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<AuthenticatedAccount>> {
    let body: SocialLoginRequest = req.parse_json().await?;
    let config = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let authenticated =
        lifecycle::social_login(&mut conn, &config.auth, &config.server.origin(), &body).await?;

    Ok(Envelope::ok("Logged in", authenticated))
}

/// ## Summary
/// PUT /user/changePassword - Replace the password after code verification.
///
/// ## Errors
/// Returns HTTP 403 if no fresh code verification is on record
/// Returns HTTP 404 if the account does not exist
#[handler]
async fn change_password_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<serde_json::Value>> {
    let body: ChangePasswordRequest = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let account_id = lifecycle::change_password(&mut conn, &body).await?;

    Ok(Envelope::ok(
        "Password changed",
        json!({ "account_id": account_id }),
    ))
}

/// ## Summary
/// GET /user - Return the authenticated account's profile.
///
/// ## Errors
/// Returns HTTP 401 if the request carries no valid session
#[handler]
async fn profile_handler(depot: &mut Depot) -> AppResult<Envelope<Profile>> {
    let config = get_config_from_depot(depot)?;
    let account = get_account_from_depot(depot)?;

    Ok(Envelope::ok(
        "Profile fetched",
        Profile::from_account(account, &config.server.origin()),
    ))
}

/// ## Summary
/// PUT /user/profile - Update the authenticated account's profile fields.
///
/// Linked accounts patch the external contact before anything lands locally.
///
/// ## Errors
/// Returns HTTP 401 if the request carries no valid session
/// Returns HTTP 502 if the external contact patch fails
#[handler]
async fn update_profile_handler(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Envelope<Profile>> {
    let body: ProfileUpdateRequest = req.parse_json().await?;
    let config = get_config_from_depot(depot)?;
    let clio = get_clio_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let account_id = get_account_from_depot(depot)?.id;
    let mut conn = provider.get_connection().await?;

    let updated =
        profile::update_profile(&mut conn, &clio, &config.server.origin(), account_id, &body)
            .await?;

    Ok(Envelope::ok("Profile updated", updated))
}

/// ## Summary
/// GET /user/logout - Revoke the session and drop the push binding.
///
/// ## Errors
/// Returns HTTP 401 if the request carries no valid session
#[handler]
async fn logout_handler(depot: &mut Depot) -> AppResult<Envelope<()>> {
    let provider = get_db_from_depot(depot)?;
    let account_id = get_account_from_depot(depot)?.id;
    let mut conn = provider.get_connection().await?;

    lifecycle::logout(&mut conn, account_id).await?;

    Ok(Envelope::message_only("Logged out"))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(USER_ROUTE_COMPONENT)
        .post(register_handler)
        .push(Router::with_path("verifyOtp").put(verify_otp_handler))
        .push(Router::with_path("sendOtp").put(send_otp_handler))
        .push(Router::with_path("login").post(login_handler))
        .push(Router::with_path("socialLogin").post(social_login_handler))
        .push(Router::with_path("changePassword").put(change_password_handler))
        .push(
            Router::new()
                .hoop(SessionAuth)
                .get(profile_handler)
                .push(Router::with_path("profile").put(update_profile_handler))
                .push(Router::with_path("logout").get(logout_handler)),
        )
}
