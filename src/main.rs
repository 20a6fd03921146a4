use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::service::Tracker;
use crate::store::{MemorySheetStore, MySqlSheetStore, SheetBackend};
use crate::utils::clock::SystemClock;
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nest_attendance=debug,actix_web=info")),
        )
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(timezone = %config.timezone, "Server starting...");
    for note in &config.fallbacks {
        warn!("Unparseable setting: {}", note);
    }

    let store = match config.database_url.as_deref() {
        Some(url) => {
            let pool = init_db(url).await.context("connecting to DATABASE_URL")?;
            SheetBackend::MySql(MySqlSheetStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, sheets are kept in memory and lost on restart");
            SheetBackend::Memory(MemorySheetStore::default())
        }
    };

    let clock = Arc::new(SystemClock::new(config.timezone));
    let tracker = Data::new(Tracker::new(store, &config, clock));
    tracker
        .provision()
        .await
        .context("writing checkin/checkout log headers")?;

    let tracker_for_warmup = tracker.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = tracker_for_warmup.warmup_roster().await {
            warn!(error = %e, "Failed to warm up roster");
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so JS/CSS assets resolve
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(tracker.clone())
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("binding {}", server_addr))?
    .run()
    .await?;

    Ok(())
}
