use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub clio: ClioConfig,
    pub mail: MailConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub serve_origin: Option<String>,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the server address as a string in the format "host:port".
    #[must_use]
    pub fn serve_origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// ## Summary
    /// Returns the public origin URL used when rendering absolute links
    /// (profile images). Falls back to the bind address.
    #[must_use]
    pub fn origin(&self) -> String {
        if let Some(origin) = &self.serve_origin {
            origin.clone()
        } else {
            self.serve_origin()
        }
    }
}

/// Session-token signing configuration. `ttl` is in hours.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub ttl: i64,
}

/// Practice-management API (Clio) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClioConfig {
    pub token: String,
    pub base_url: String,
    pub matter_description: String,
    /// Custom field carrying the local account reference on contacts.
    pub custom_field: Option<i64>,
}

/// Transactional-mail API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub key: String,
    pub base_url: String,
    pub sender_email: String,
    pub sender_name: String,
    pub templates: MailTemplatesConfig,
}

/// Template ids on the mail provider, one per message kind.
#[derive(Debug, Clone, Deserialize)]
pub struct MailTemplatesConfig {
    pub registration: u32,
    pub welcome: u32,
    pub reset: u32,
    pub resend: u32,
    pub change: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8640)?
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "debug")?
            .set_default("auth.ttl", 24)?
            .set_default("clio.base_url", "https://app.clio.com/api/v4")?
            .set_default("clio.matter_description", "General legal services")?
            .set_default("mail.base_url", "https://api.brevo.com/v3")?
            .set_default("mail.sender_email", "no-reply@gavel.example")?
            .set_default("mail.sender_name", "Gavel")?
            .set_default("mail.templates.registration", 1)?
            .set_default("mail.templates.welcome", 2)?
            .set_default("mail.templates.reset", 3)?
            .set_default("mail.templates.resend", 4)?
            .set_default("mail.templates.change", 5)?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Rejects settings that cannot produce a working server: an empty token
    /// signing secret or a zero session lifetime.
    ///
    /// ## Errors
    /// Returns `CoreError::InvalidConfiguration` naming the offending key.
    pub fn validate(&self) -> CoreResult<()> {
        if self.auth.secret.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "auth.secret must be set".to_string(),
            ));
        }
        if self.auth.ttl <= 0 {
            return Err(CoreError::InvalidConfiguration(
                "auth.ttl must be a positive number of hours".to_string(),
            ));
        }
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
