//! Conversions between billable points and currency amounts.
//!
//! A single admin-managed rate prices one billable point. Conversions use
//! exact decimal arithmetic; prices round to two decimal places and point
//! totals round to the nearest whole point.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use gavel_db::db::connection::DbConnection;
use gavel_db::db::query::account;

use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Loads the configured point conversion rate.
///
/// ## Errors
/// Returns `NotConfigured` when no admin has set a rate or the stored
/// value cannot price a point.
pub async fn configured_rate(conn: &mut DbConnection<'_>) -> ServiceResult<Decimal> {
    let raw = account::point_value(conn)
        .await?
        .ok_or(ServiceError::NotConfigured)?;
    rate_from_f64(raw)
}

/// ## Summary
/// Reads the stored rate without interpreting it, for the admin settings
/// surface. `None` means no admin has configured a rate yet.
///
/// ## Errors
/// Returns a database error if the lookup fails.
pub async fn stored_rate(conn: &mut DbConnection<'_>) -> ServiceResult<Option<f64>> {
    Ok(account::point_value(conn).await?)
}

/// ## Summary
/// Stores a new point conversion rate, recording which admin set it.
///
/// ## Errors
/// Returns `ValidationError` for values that could not price a point.
pub async fn update_rate(
    conn: &mut DbConnection<'_>,
    admin_id: Uuid,
    value: f64,
) -> ServiceResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ServiceError::ValidationError(
            "point_value must be a positive number".to_string(),
        ));
    }
    account::set_point_value(conn, admin_id, value).await?;
    tracing::info!(%admin_id, value, "Point conversion rate updated");
    Ok(value)
}

/// ## Summary
/// Parses a stored rate value, rejecting non-positive or non-finite values.
///
/// ## Errors
/// Returns `NotConfigured` for values that cannot price a point.
pub fn rate_from_f64(raw: f64) -> ServiceResult<Decimal> {
    let rate = Decimal::from_f64(raw).ok_or(ServiceError::NotConfigured)?;
    if rate <= Decimal::ZERO {
        return Err(ServiceError::NotConfigured);
    }
    Ok(rate)
}

/// ## Summary
/// Converts billable points into a currency amount, rounded to two decimal
/// places.
///
/// ## Errors
/// Returns `ValidationError` when the multiplication overflows.
pub fn points_to_price(points: i64, rate: Decimal) -> ServiceResult<Decimal> {
    Decimal::from(points)
        .checked_mul(rate)
        .map(|price| price.round_dp(2))
        .ok_or_else(|| ServiceError::ValidationError("Point total is out of range".to_string()))
}

/// ## Summary
/// Converts a currency amount into whole billable points, rounding to the
/// nearest point with midpoints away from zero.
///
/// ## Errors
/// Returns `NotConfigured` for a non-positive rate and `ValidationError`
/// when the result does not fit a signed 64-bit integer.
pub fn price_to_points(amount: Decimal, rate: Decimal) -> ServiceResult<i64> {
    if rate <= Decimal::ZERO {
        return Err(ServiceError::NotConfigured);
    }
    amount
        .checked_div(rate)
        .ok_or(ServiceError::NotConfigured)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| ServiceError::ValidationError("Amount is out of range".to_string()))
}
