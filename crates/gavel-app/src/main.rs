use std::sync::Arc;

use salvo::catcher::Catcher;
use salvo::conn::TcpListener;
use salvo::{Listener, Router, Service};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use gavel_app::app::api::routes;
use gavel_app::clio_handler::ClioHandler;
use gavel_app::config::ConfigHandler;
use gavel_app::db_handler::DbProviderHandler;
use gavel_app::mail_handler::MailerHandler;
use gavel_app::response::not_found_handler;
use gavel_core::config::load_config;
use gavel_db::db::connection::create_pool;
use gavel_service::clio::client::ClioClient;
use gavel_service::mail::HttpMailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Gavel legal-services server");

    let config = load_config()?;
    config.validate()?;

    tracing::info!("Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    tracing::info!("Database connection pool created.");

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(DbProviderHandler { provider: pool })
        .hoop(ConfigHandler {
            settings: config.clone(),
        })
        .hoop(ClioHandler {
            client: Arc::new(ClioClient::new(config.clio.clone())),
        })
        .hoop(MailerHandler {
            mailer: Arc::new(HttpMailer::new(config.mail.clone())),
        })
        .push(routes());

    let service = Service::new(router).catcher(Catcher::default().hoop(not_found_handler));

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(service).await;

    Ok(())
}
