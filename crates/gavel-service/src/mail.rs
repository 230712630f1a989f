//! Transactional email delivery through the Brevo HTTP API.
//!
//! Every outbound message is a stored template referenced by id, with
//! per-message parameters substituted server side.

use std::{future::Future, pin::Pin, time::Duration};

use serde::Serialize;

use gavel_core::config::MailConfig;

use crate::error::{ServiceError, ServiceResult};

/// Sends templated transactional email.
///
/// The trait seam lets tests capture outbound mail without network access.
pub trait Mailer: Send + Sync {
    /// ## Summary
    /// Sends the template to a single recipient with the given parameters.
    ///
    /// ## Errors
    /// Returns `Transport` if the request cannot be sent and `ExternalService`
    /// if the provider rejects it.
    fn send_template<'a>(
        &'a self,
        to_email: &'a str,
        to_name: &'a str,
        template_id: u32,
        params: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = ServiceResult<()>> + Send + 'a>>;
}

#[derive(Debug, Serialize)]
struct EmailParty<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateEmailRequest<'a> {
    sender: EmailParty<'a>,
    to: [EmailParty<'a>; 1],
    template_id: u32,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    params: serde_json::Value,
}

/// Brevo-backed [`Mailer`].
pub struct HttpMailer {
    http: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    #[must_use]
    pub fn new(config: MailConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, config }
    }

    async fn deliver(
        &self,
        to_email: &str,
        to_name: &str,
        template_id: u32,
        params: serde_json::Value,
    ) -> ServiceResult<()> {
        let body = TemplateEmailRequest {
            sender: EmailParty {
                email: &self.config.sender_email,
                name: Some(&self.config.sender_name),
            },
            to: [EmailParty {
                email: to_email,
                name: (!to_name.is_empty()).then_some(to_name),
            }],
            template_id,
            params,
        };

        let url = format!("{}/smtp/email", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .header("api-key", &self.config.key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Mail delivery rejected");
            return Err(ServiceError::ExternalService {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(template_id, "Mail accepted for delivery");
        Ok(())
    }
}

impl Mailer for HttpMailer {
    fn send_template<'a>(
        &'a self,
        to_email: &'a str,
        to_name: &'a str,
        template_id: u32,
        params: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = ServiceResult<()>> + Send + 'a>> {
        Box::pin(self.deliver(to_email, to_name, template_id, params))
    }
}
