// app/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use bookstore_app::config::AppConfig;
use bookstore_app::state::AppState;
use bookstore_app::telemetry::init_tracing;
use bookstore_app::web::configure_app_routes;
use std::time::Duration;

/// Periodically drops idle sessions and the anonymous carts they held.
fn spawn_session_purge(app_state: &AppState, every: Duration) {
  let bookstore = app_state.bookstore.clone();
  actix_web::rt::spawn(async move {
    let mut ticker = actix_web::rt::time::interval(every);
    loop {
      ticker.tick().await;
      if let Err(e) = bookstore.purge_expired_sessions().await {
        tracing::error!(error = %e, "Session purge failed.");
      }
    }
  });
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // Configuration first: it decides the log format.
  let app_config = AppConfig::from_env().context("Failed to load application configuration")?;
  init_tracing(app_config.log_format);
  tracing::info!("Starting bookstore server...");

  let server_address = app_config.server_address();
  let seed_db = app_config.seed_db;
  let seed_config = app_config.seed_config();
  let purge_interval = Duration::from_secs(app_config.session_purge_interval_secs);

  let app_state = AppState::from_config(app_config).await?;

  if seed_db {
    let report = app_state
      .bookstore
      .seed(&seed_config)
      .await
      .context("Failed to seed the database")?;
    tracing::info!(
      staff_created = report.staff_created,
      books_added = report.books_added,
      "Database seeding complete."
    );
  }

  spawn_session_purge(&app_state, purge_interval);

  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await?;

  tracing::info!("Server stopped.");
  Ok(())
}
