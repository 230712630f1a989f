//! HTTP client for the practice-management REST API.
//!
//! Every request carries the configured bearer token. Bodies and responses
//! are JSON with payloads wrapped in a `data` envelope.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use gavel_core::config::ClioConfig;

use crate::error::{ServiceError, ServiceResult};

/// Shared client for the practice-management API.
#[derive(Debug, Clone)]
pub struct ClioClient {
    http: Client,
    config: ClioConfig,
}

impl ClioClient {
    #[must_use]
    pub fn new(config: ClioConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, config }
    }

    /// Description stamped on matters opened for linked accounts.
    #[must_use]
    pub fn matter_description(&self) -> &str {
        &self.config.matter_description
    }

    /// Custom field id carrying the local account id on contacts, if one is
    /// configured.
    #[must_use]
    pub fn custom_field(&self) -> Option<i64> {
        self.config.custom_field
    }

    /// ## Errors
    /// Returns `Transport` when no response arrives and `ExternalService`
    /// for a non-2xx status.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> ServiceResult<Value> {
        self.execute(Method::GET, path, Some(query), None).await
    }

    /// ## Errors
    /// Returns `Transport` when no response arrives and `ExternalService`
    /// for a non-2xx status.
    pub async fn post(&self, path: &str, body: &Value) -> ServiceResult<Value> {
        self.execute(Method::POST, path, None, Some(body)).await
    }

    /// ## Errors
    /// Returns `Transport` when no response arrives and `ExternalService`
    /// for a non-2xx status.
    pub async fn patch(&self, path: &str, body: &Value) -> ServiceResult<Value> {
        self.execute(Method::PATCH, path, None, Some(body)).await
    }

    /// ## Errors
    /// Returns `Transport` when no response arrives and `ExternalService`
    /// for a non-2xx status.
    pub async fn delete(&self, path: &str) -> ServiceResult<()> {
        self.execute(Method::DELETE, path, None, None).await?;
        Ok(())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&Value>,
    ) -> ServiceResult<Value> {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(query) = query {
            if !query.is_empty() {
                request = request.query(query);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(
                %method,
                %url,
                status = status.as_u16(),
                "Practice-management request failed"
            );
            return Err(ServiceError::ExternalService {
                status: status.as_u16(),
                body: text,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        Ok(response.json().await?)
    }
}

/// Pulls the payload out of the `{data: ...}` response envelope.
pub(crate) fn data(response: Value) -> ServiceResult<Value> {
    match response {
        Value::Object(mut fields) => fields.remove("data").ok_or_else(|| {
            ServiceError::ExternalFormat("response is missing the data envelope".to_string())
        }),
        _ => Err(ServiceError::ExternalFormat(
            "response is not a JSON object".to_string(),
        )),
    }
}

/// Reads the integer id of a record.
pub(crate) fn record_id(record: &Value) -> ServiceResult<i64> {
    record
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| ServiceError::ExternalFormat("record is missing an integer id".to_string()))
}
