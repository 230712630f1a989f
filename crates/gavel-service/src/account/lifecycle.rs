//! Registration, verification, and session entry points.

use diesel_async::scoped_futures::ScopedFutureExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gavel_core::config::{AuthConfig, MailTemplatesConfig};
use gavel_db::db::connection::DbConnection;
use gavel_db::db::query::account;
use gavel_db::db::transaction::with_transaction;
use gavel_db::model::account::{AccountRole, DeviceKind, NewAccount, OtpPurpose, SocialProvider};

use crate::account::profile::Profile;
use crate::account::{normalize_email, require, require_email};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session;
use crate::error::{ServiceError, ServiceResult, unique_violation_to_conflict};
use crate::mail::Mailer;
use crate::otp::{self, OtpCheck};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub password: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub device_token: Option<String>,
    pub device_kind: Option<DeviceKind>,
}

/// Identifiers returned from a registration attempt.
#[derive(Debug, Serialize)]
pub struct RegisteredAccount {
    pub account_id: Uuid,
    pub email: String,
}

/// ## Summary
/// Registers a user account and issues the registration code.
///
/// A live verified account under the email is a conflict. A live unverified
/// account is reused: its profile and password are overwritten and a fresh
/// code goes out, so an abandoned registration never wedges the email.
/// Soft-deleted rows do not participate; their email is simply free again.
///
/// ## Errors
/// Returns `Conflict` for an already-verified email and `ValidationError`
/// for missing fields. Mail failures propagate because the code must reach
/// the registrant.
pub async fn register(
    conn: &mut DbConnection<'_>,
    mailer: &dyn Mailer,
    templates: &MailTemplatesConfig,
    request: &RegisterRequest,
) -> ServiceResult<RegisteredAccount> {
    let email = normalize_email(&request.email);
    require_email(&email)?;
    require("password", &request.password)?;

    let password_hash = hash_password(&request.password)?;
    let new_account = NewAccount {
        id: Uuid::now_v7(),
        role: AccountRole::User,
        email: &email,
        country_code: request.country_code.as_deref(),
        phone: request.phone.as_deref(),
        password_hash: Some(&password_hash),
        social_provider: None,
        social_id: None,
        is_verified: false,
        device_token: request.device_token.as_deref(),
        device_kind: request.device_kind,
        first_name: request.first_name.as_deref(),
        last_name: request.last_name.as_deref(),
        latitude: request.latitude,
        longitude: request.longitude,
    };

    let account = match account::find_live_by_email(conn, &email).await? {
        Some(existing) if existing.is_verified => {
            return Err(ServiceError::Conflict(
                "Email is already registered".to_string(),
            ));
        }
        Some(existing) => {
            tracing::debug!(account_id = %existing.id, "Reusing unverified registration");
            account::overwrite_unverified(conn, existing.id, &new_account).await?
        }
        None => account::create(conn, &new_account)
            .await
            .map_err(|e| unique_violation_to_conflict(e, "Email is already registered"))?,
    };

    otp::issue(
        conn,
        mailer,
        &account,
        OtpPurpose::Registration,
        templates.registration,
    )
    .await?;

    tracing::info!(account_id = %account.id, "Registration code issued");
    Ok(RegisteredAccount {
        account_id: account.id,
        email: account.email,
    })
}

/// Purpose discriminant submitted with a verify request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPurpose {
    Registration,
    PasswordReset,
}

impl VerifyPurpose {
    /// ## Errors
    /// Rejects purpose codes other than 1 (registration) and 2 (password
    /// reset).
    pub fn from_code(code: u8) -> ServiceResult<Self> {
        match code {
            1 => Ok(Self::Registration),
            2 => Ok(Self::PasswordReset),
            other => Err(ServiceError::ValidationError(format!(
                "unknown verification purpose {other}"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub account_id: Uuid,
    pub otp: i32,
    pub purpose: u8,
}

/// A bearer token alongside the account it authenticates.
#[derive(Debug, Serialize)]
pub struct AuthenticatedAccount {
    pub token: String,
    pub profile: Profile,
}

/// Outcome of a successful verification.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum VerifiedOtp {
    /// Registration verification: the account is live and holds a session.
    Session(AuthenticatedAccount),
    /// Non-registration verification: a freshness proof for change-password.
    Proof { account_id: Uuid, role: AccountRole },
}

/// ## Summary
/// Checks a submitted code and applies the outcome.
///
/// An expired code clears the slot on the way out, so retrying the same code
/// reads as invalid rather than expired. A matching registration code marks
/// the account verified and issues a session in one transaction; any other
/// purpose only records the freshness proof.
///
/// ## Errors
/// Returns `NotFound` for a missing account, `OtpExpired`/`OtpInvalid` per
/// the check, and database errors from the state writes.
pub async fn verify_otp<'a>(
    conn: &mut DbConnection<'a>,
    auth: &'a AuthConfig,
    origin: &str,
    request: &VerifyOtpRequest,
) -> ServiceResult<VerifiedOtp> {
    let purpose = VerifyPurpose::from_code(request.purpose)?;

    let Some(account) = account::find_live_by_id(conn, request.account_id).await? else {
        return Err(ServiceError::NotFound("Account not found".to_string()));
    };

    let state = account.otp_state()?;
    match otp::evaluate(state, request.otp, chrono::Utc::now()) {
        OtpCheck::Expired => {
            account::clear_otp_slot(conn, account.id).await?;
            Err(ServiceError::OtpExpired)
        }
        OtpCheck::Mismatch => Err(ServiceError::OtpInvalid),
        OtpCheck::Match(recorded) => {
            if !purposes_agree(recorded, purpose) {
                tracing::warn!(
                    account_id = %account.id,
                    recorded = %recorded,
                    submitted = ?purpose,
                    "Verification purpose differs from the one the code was issued for"
                );
            }
            match purpose {
                VerifyPurpose::Registration => {
                    let account_id = account.id;
                    let issued = with_transaction(conn, |tx| {
                        async move {
                            account::consume_otp(tx, account_id, true).await?;
                            session::issue(tx, auth, account_id).await
                        }
                        .scope_boxed()
                    })
                    .await?;

                    let Some(updated) = account::find_live_by_id(conn, account_id).await? else {
                        return Err(ServiceError::NotFound("Account not found".to_string()));
                    };
                    tracing::info!(account_id = %account_id, "Registration verified");
                    Ok(VerifiedOtp::Session(AuthenticatedAccount {
                        token: issued.token,
                        profile: Profile::from_account(&updated, origin),
                    }))
                }
                VerifyPurpose::PasswordReset => {
                    account::consume_otp(conn, account.id, false).await?;
                    Ok(VerifiedOtp::Proof {
                        account_id: account.id,
                        role: account.role,
                    })
                }
            }
        }
    }
}

fn purposes_agree(recorded: OtpPurpose, submitted: VerifyPurpose) -> bool {
    matches!(
        (recorded, submitted),
        (OtpPurpose::Registration, VerifyPurpose::Registration)
            | (
                OtpPurpose::PasswordReset | OtpPurpose::EmailChange,
                VerifyPurpose::PasswordReset
            )
    )
}

/// Purpose discriminant submitted with a send-code request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPurpose {
    ForgotPassword,
    Resend,
    EmailChange,
}

impl SendPurpose {
    /// ## Errors
    /// Rejects purpose codes other than 1 (forgot password), 2 (resend), and
    /// 3 (email change).
    pub fn from_code(code: u8) -> ServiceResult<Self> {
        match code {
            1 => Ok(Self::ForgotPassword),
            2 => Ok(Self::Resend),
            3 => Ok(Self::EmailChange),
            other => Err(ServiceError::ValidationError(format!(
                "unknown send purpose {other}"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
    pub purpose: u8,
}

/// ## Summary
/// Issues a fresh code for password reset, registration resend, or email
/// change. The slot is shared, so the new code supersedes whatever was
/// pending regardless of purpose.
///
/// ## Errors
/// Returns `NotFound` for an unknown email; mail failures propagate.
pub async fn send_otp(
    conn: &mut DbConnection<'_>,
    mailer: &dyn Mailer,
    templates: &MailTemplatesConfig,
    request: &SendOtpRequest,
) -> ServiceResult<Uuid> {
    let purpose = SendPurpose::from_code(request.purpose)?;
    let email = normalize_email(&request.email);
    require_email(&email)?;

    let Some(target) = account::find_live_by_email(conn, &email).await? else {
        return Err(ServiceError::NotFound("Account not found".to_string()));
    };

    let (otp_purpose, template_id) = match purpose {
        SendPurpose::ForgotPassword => (OtpPurpose::PasswordReset, templates.reset),
        SendPurpose::Resend => (OtpPurpose::Registration, templates.resend),
        SendPurpose::EmailChange => (OtpPurpose::EmailChange, templates.change),
    };

    otp::issue(conn, mailer, &target, otp_purpose, template_id).await?;
    Ok(target.id)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub device_token: Option<String>,
    pub device_kind: Option<DeviceKind>,
}

struct DeviceInfo<'a> {
    token: Option<&'a str>,
    kind: Option<DeviceKind>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl<'a> DeviceInfo<'a> {
    fn from_login(request: &'a LoginRequest) -> Self {
        Self {
            token: request.device_token.as_deref(),
            kind: request.device_kind,
            latitude: request.latitude,
            longitude: request.longitude,
        }
    }
}

async fn finish_login(
    conn: &mut DbConnection<'_>,
    auth: &AuthConfig,
    origin: &str,
    account_id: Uuid,
    device: DeviceInfo<'_>,
) -> ServiceResult<AuthenticatedAccount> {
    account::capture_device(
        conn,
        account_id,
        device.token,
        device.kind,
        device.latitude,
        device.longitude,
    )
    .await?;

    let issued = session::issue(conn, auth, account_id).await?;

    let Some(current) = account::find_live_by_id(conn, account_id).await? else {
        return Err(ServiceError::NotAuthenticated);
    };

    Ok(AuthenticatedAccount {
        token: issued.token,
        profile: Profile::from_account(&current, origin),
    })
}

/// ## Summary
/// Authenticates with email and password, captures the device binding, and
/// issues a session that supersedes any previous one.
///
/// Unknown emails, social-only accounts, and wrong passwords all fail
/// identically so callers cannot probe which emails exist.
///
/// ## Errors
/// Returns `NotAuthenticated` on credential failure, `ValidationError` for
/// an unverified account, and `AuthorizationError` for a deactivated one.
pub async fn login(
    conn: &mut DbConnection<'_>,
    auth: &AuthConfig,
    origin: &str,
    request: &LoginRequest,
) -> ServiceResult<AuthenticatedAccount> {
    let email = normalize_email(&request.email);

    let Some(found) = account::find_live_by_email(conn, &email).await? else {
        return Err(ServiceError::NotAuthenticated);
    };
    let Some(password_hash) = found.password_hash.as_deref() else {
        return Err(ServiceError::NotAuthenticated);
    };
    verify_password(&request.password, password_hash)?;

    if !found.is_verified {
        return Err(ServiceError::ValidationError(
            "Account is not verified".to_string(),
        ));
    }
    if found.is_deactivated {
        return Err(ServiceError::AuthorizationError(
            "Account is deactivated".to_string(),
        ));
    }

    finish_login(conn, auth, origin, found.id, DeviceInfo::from_login(request)).await
}

#[derive(Debug, Deserialize)]
pub struct SocialLoginRequest {
    pub social_id: String,
    pub social_type: u8,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<AccountRole>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub device_token: Option<String>,
    pub device_kind: Option<DeviceKind>,
}

fn social_provider_from_code(code: u8) -> ServiceResult<SocialProvider> {
    match code {
        1 => Ok(SocialProvider::Google),
        2 => Ok(SocialProvider::Facebook),
        3 => Ok(SocialProvider::Apple),
        other => Err(ServiceError::ValidationError(format!(
            "unknown social provider {other}"
        ))),
    }
}

/// ## Summary
/// Authenticates through a social identity, adopting or creating the local
/// account as needed.
///
/// Resolution order: an account already holding the (provider, social id)
/// pair wins; otherwise a live account under the same email adopts the
/// identity and becomes verified; otherwise a new account is created
/// already verified. The requested role is honored only at creation and
/// only for user or attorney.
///
/// ## Errors
/// Returns `AuthorizationError` for deactivated accounts, `ValidationError`
/// for unknown provider codes or disallowed roles, and `Conflict` if a
/// racing registration claims the email first.
pub async fn social_login(
    conn: &mut DbConnection<'_>,
    auth: &AuthConfig,
    origin: &str,
    request: &SocialLoginRequest,
) -> ServiceResult<AuthenticatedAccount> {
    let provider = social_provider_from_code(request.social_type)?;
    require("social_id", &request.social_id)?;
    let email = normalize_email(&request.email);
    require_email(&email)?;

    let device = DeviceInfo {
        token: request.device_token.as_deref(),
        kind: request.device_kind,
        latitude: request.latitude,
        longitude: request.longitude,
    };

    if let Some(found) = account::find_by_social(conn, provider, &request.social_id).await? {
        if found.is_deactivated {
            return Err(ServiceError::AuthorizationError(
                "Account is deactivated".to_string(),
            ));
        }
        return finish_login(conn, auth, origin, found.id, device).await;
    }

    if let Some(found) = account::find_live_by_email(conn, &email).await? {
        if found.is_deactivated {
            return Err(ServiceError::AuthorizationError(
                "Account is deactivated".to_string(),
            ));
        }
        tracing::debug!(
            account_id = %found.id,
            provider = %provider,
            "Attaching social identity to existing account"
        );
        account::attach_social(conn, found.id, provider, &request.social_id).await?;
        return finish_login(conn, auth, origin, found.id, device).await;
    }

    let role = match request.role {
        None => AccountRole::User,
        Some(role @ (AccountRole::User | AccountRole::Attorney)) => role,
        Some(_) => {
            return Err(ServiceError::ValidationError(
                "role must be user or attorney".to_string(),
            ));
        }
    };

    let new_account = NewAccount {
        id: Uuid::now_v7(),
        role,
        email: &email,
        country_code: None,
        phone: None,
        password_hash: None,
        social_provider: Some(provider),
        social_id: Some(&request.social_id),
        is_verified: true,
        device_token: request.device_token.as_deref(),
        device_kind: request.device_kind,
        first_name: request.first_name.as_deref(),
        last_name: request.last_name.as_deref(),
        latitude: request.latitude,
        longitude: request.longitude,
    };
    let created = account::create(conn, &new_account)
        .await
        .map_err(|e| unique_violation_to_conflict(e, "Email is already registered"))?;

    tracing::info!(account_id = %created.id, provider = %provider, "Account created via social login");

    let issued = session::issue(conn, auth, created.id).await?;
    Ok(AuthenticatedAccount {
        token: issued.token,
        profile: Profile::from_account(&created, origin),
    })
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub account_id: Uuid,
    pub password: String,
}

/// ## Summary
/// Replaces the password after a fresh code verification.
///
/// The `otp_verified` proof is consumed atomically: the first change wins, a
/// replayed request finds the proof already spent.
///
/// ## Errors
/// Returns `NotFound` for a missing account and `AuthorizationError` when no
/// freshness proof is held.
pub async fn change_password(
    conn: &mut DbConnection<'_>,
    request: &ChangePasswordRequest,
) -> ServiceResult<Uuid> {
    require("password", &request.password)?;

    let Some(target) = account::find_live_by_id(conn, request.account_id).await? else {
        return Err(ServiceError::NotFound("Account not found".to_string()));
    };

    let taken = account::take_otp_verified(conn, target.id).await?;
    if taken == 0 {
        return Err(ServiceError::AuthorizationError(
            "Code verification required".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password)?;
    account::update_password(conn, target.id, &password_hash).await?;

    tracing::info!(account_id = %target.id, "Password changed");
    Ok(target.id)
}

/// ## Summary
/// Ends the account's session and drops its push binding.
///
/// ## Errors
/// Returns a database error if either write fails.
pub async fn logout(conn: &mut DbConnection<'_>, account_id: Uuid) -> ServiceResult<()> {
    session::revoke(conn, account_id).await
}

/// ## Summary
/// Authenticates an admin by email and password.
///
/// Admin identity is the account's role column; valid credentials on a
/// non-admin account still get a 403.
///
/// ## Errors
/// Returns `NotAuthenticated` on credential failure and
/// `AuthorizationError` for non-admin or deactivated accounts.
pub async fn admin_login(
    conn: &mut DbConnection<'_>,
    auth: &AuthConfig,
    origin: &str,
    request: &LoginRequest,
) -> ServiceResult<AuthenticatedAccount> {
    let email = normalize_email(&request.email);

    let Some(found) = account::find_live_by_email(conn, &email).await? else {
        return Err(ServiceError::NotAuthenticated);
    };
    let Some(password_hash) = found.password_hash.as_deref() else {
        return Err(ServiceError::NotAuthenticated);
    };
    verify_password(&request.password, password_hash)?;

    if found.role != AccountRole::Admin {
        tracing::warn!(account_id = %found.id, "Non-admin attempted the admin login");
        return Err(ServiceError::AuthorizationError(
            "Admin access required".to_string(),
        ));
    }
    if found.is_deactivated {
        return Err(ServiceError::AuthorizationError(
            "Account is deactivated".to_string(),
        ));
    }

    finish_login(conn, auth, origin, found.id, DeviceInfo::from_login(request)).await
}
