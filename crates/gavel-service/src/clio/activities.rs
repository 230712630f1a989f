//! Billable activities and the activity-description catalog.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use gavel_db::db::connection::DbConnection;
use gavel_db::model::account::Account;

use crate::billing;
use crate::clio::client::{self, ClioClient};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Deserialize)]
pub struct PostActivityRequest {
    pub activity_description_id: i64,
    pub points: i64,
    pub date: Option<NaiveDate>,
}

/// The remote activity record and the price it was booked at.
#[derive(Debug, Serialize)]
pub struct PostedActivity {
    pub activity_id: i64,
    pub price: Decimal,
}

/// ## Summary
/// Books a time entry on the caller's matter, priced from billable points
/// at the configured rate.
///
/// ## Errors
/// Returns `ValidationError` for non-positive points or an account with no
/// matter, `NotConfigured` when no conversion rate is set, and external
/// errors from the remote call.
pub async fn post_activity(
    conn: &mut DbConnection<'_>,
    clio: &ClioClient,
    account: &Account,
    request: &PostActivityRequest,
) -> ServiceResult<PostedActivity> {
    if request.points <= 0 {
        return Err(ServiceError::ValidationError(
            "points must be a positive number".to_string(),
        ));
    }
    let Some(matter_id) = account.clio_matter_id else {
        return Err(ServiceError::ValidationError(
            "Account has no matter to bill against".to_string(),
        ));
    };

    let rate = billing::configured_rate(conn).await?;
    let price = billing::points_to_price(request.points, rate)?;
    let date = request
        .date
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let payload = serde_json::json!({
        "data": {
            "type": "TimeEntry",
            "activity_description": { "id": request.activity_description_id },
            "matter": { "id": matter_id },
            "date": date,
            "quantity": request.points,
            "price": price,
        }
    });
    let created = client::data(clio.post("/activities.json", &payload).await?)?;
    let activity_id = client::record_id(&created)?;

    tracing::info!(account_id = %account.id, activity_id, %price, "Billable activity posted");
    Ok(PostedActivity { activity_id, price })
}

/// An activity-description entry priced in billable points.
#[derive(Debug, Serialize)]
pub struct PricedDescription {
    pub id: i64,
    pub name: Option<String>,
    pub rate: Option<Decimal>,
    pub point_cost: Option<i64>,
}

/// ## Summary
/// Lists the remote activity-description catalog with each entry's cost
/// translated into billable points. Costs are absent while no conversion
/// rate is configured, or for entries without a rate of their own.
///
/// ## Errors
/// Returns external errors from the remote call and `ExternalFormat` when
/// the catalog payload is unreadable.
pub async fn list_descriptions(
    conn: &mut DbConnection<'_>,
    clio: &ClioClient,
) -> ServiceResult<Vec<PricedDescription>> {
    let page = client::data(
        clio.get(
            "/activity_descriptions.json",
            &[("fields", "id,name,rate".to_string())],
        )
        .await?,
    )?;
    let Some(entries) = page.as_array() else {
        return Err(ServiceError::ExternalFormat(
            "activity descriptions are not a list".to_string(),
        ));
    };

    let conversion = match billing::configured_rate(conn).await {
        Ok(rate) => Some(rate),
        Err(ServiceError::NotConfigured) => None,
        Err(error) => return Err(error),
    };

    entries
        .iter()
        .map(|entry| priced_description(entry, conversion))
        .collect()
}

fn priced_description(entry: &Value, conversion: Option<Decimal>) -> ServiceResult<PricedDescription> {
    let id = client::record_id(entry)?;
    let name = entry.get("name").and_then(Value::as_str).map(str::to_string);
    let rate = entry
        .get("rate")
        .and_then(Value::as_f64)
        .and_then(Decimal::from_f64);

    let point_cost = match (rate, conversion) {
        (Some(rate), Some(conversion)) => Some(billing::price_to_points(rate, conversion)?),
        _ => None,
    };

    Ok(PricedDescription {
        id,
        name,
        rate,
        point_cost,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct DescriptionRequest {
    pub name: Option<String>,
    pub rate: Option<f64>,
}

/// ## Summary
/// Creates a remote activity description.
///
/// ## Errors
/// Returns `ValidationError` without a name and external errors from the
/// remote call.
pub async fn create_description(
    clio: &ClioClient,
    request: &DescriptionRequest,
) -> ServiceResult<Value> {
    let Some(name) = request
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
    else {
        return Err(ServiceError::ValidationError(
            "name is required".to_string(),
        ));
    };

    let payload = serde_json::json!({"data": description_fields(Some(name), request.rate)});
    client::data(clio.post("/activity_descriptions.json", &payload).await?)
}

/// ## Summary
/// Merge-patches a remote activity description.
///
/// ## Errors
/// Returns `ValidationError` when no field is supplied and external errors
/// from the remote call.
pub async fn update_description(
    clio: &ClioClient,
    description_id: i64,
    request: &DescriptionRequest,
) -> ServiceResult<Value> {
    let fields = description_fields(request.name.as_deref(), request.rate);
    if fields.is_empty() {
        return Err(ServiceError::ValidationError(
            "nothing to update".to_string(),
        ));
    }

    let payload = serde_json::json!({ "data": fields });
    client::data(
        clio.patch(
            &format!("/activity_descriptions/{description_id}.json"),
            &payload,
        )
        .await?,
    )
}

/// ## Errors
/// Returns external errors from the remote call.
pub async fn delete_description(clio: &ClioClient, description_id: i64) -> ServiceResult<()> {
    clio.delete(&format!("/activity_descriptions/{description_id}.json"))
        .await
}

fn description_fields(name: Option<&str>, rate: Option<f64>) -> serde_json::Map<String, Value> {
    let mut fields = serde_json::Map::new();
    if let Some(name) = name {
        fields.insert("name".to_string(), Value::from(name));
    }
    if let Some(rate) = rate {
        fields.insert("rate".to_string(), Value::from(rate));
    }
    fields
}
