//! One-time passcode issuance and checking.
//!
//! Each account has a single OTP slot shared by every purpose: issuing a new
//! code overwrites whatever was pending, regardless of why it was issued.
//! Consuming or expiring a code empties the slot again.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use gavel_db::db::connection::DbConnection;
use gavel_db::db::query::account;
use gavel_db::model::account::{Account, OtpPurpose, OtpState};

use crate::error::ServiceResult;
use crate::mail::Mailer;

/// Validity window for an issued code, in minutes.
pub const OTP_TTL_MINUTES: i64 = 2;

const OTP_MIN: i32 = 1000;
const OTP_MAX: i32 = 9999;

/// Outcome of checking a submitted code against an account's OTP state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    /// The code matches the pending slot; carries the recorded purpose.
    Match(OtpPurpose),
    /// A code was pending but its validity window has closed.
    Expired,
    /// No code is pending, or the submitted code differs.
    Mismatch,
}

fn generate_code() -> i32 {
    rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX)
}

/// ## Summary
/// Issues a fresh 4-digit code into the account's OTP slot and emails it.
///
/// The slot write lands before the mail goes out, so a delivery failure
/// leaves the slot populated until the next issue overwrites it.
///
/// ## Errors
/// Returns a database error if the slot write fails; mail errors propagate
/// because an undelivered code is useless to the recipient.
pub async fn issue(
    conn: &mut DbConnection<'_>,
    mailer: &dyn Mailer,
    account: &Account,
    purpose: OtpPurpose,
    template_id: u32,
) -> ServiceResult<i32> {
    let code = generate_code();
    let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);
    account::set_otp_slot(conn, account.id, code, expires_at, purpose).await?;

    mailer
        .send_template(
            &account.email,
            &account.full_name(),
            template_id,
            serde_json::json!({ "otp": code }),
        )
        .await?;

    tracing::debug!(account_id = %account.id, purpose = %purpose, "Issued verification code");
    Ok(code)
}

/// ## Summary
/// Checks a submitted code against the projected OTP state.
///
/// Pure: the caller applies the matching side effects (clearing the slot on
/// expiry, consuming it on a match).
#[must_use]
pub fn evaluate(state: OtpState, submitted: i32, now: DateTime<Utc>) -> OtpCheck {
    match state {
        OtpState::Pending { expires_at, .. } if now > expires_at => OtpCheck::Expired,
        OtpState::Pending { code, purpose, .. } if code == submitted => OtpCheck::Match(purpose),
        OtpState::Pending { .. } | OtpState::NoPending | OtpState::Verified => OtpCheck::Mismatch,
    }
}
