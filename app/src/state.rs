// app/src/state.rs
use anyhow::Context;
use bookstore::{Bookstore, MemoryStore, PgStore, Store};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
  pub bookstore: Bookstore,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
    AppState {
      bookstore: Bookstore::new(store).with_session_ttl(Duration::from_secs(config.session_ttl_secs)),
      config: Arc::new(config),
    }
  }

  pub fn in_memory(config: AppConfig) -> Self {
    Self::new(Arc::new(MemoryStore::new()), config)
  }

  /// Connects to Postgres when `DATABASE_URL` is set, otherwise falls back to
  /// the in-memory store.
  pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
    let Some(database_url) = config.database_url.clone() else {
      tracing::warn!("DATABASE_URL is not set; using the in-memory store. Data is lost on restart.");
      return Ok(Self::in_memory(config));
    };

    let store = PgStore::connect(&database_url, config.database_max_connections)
      .await
      .context("Failed to connect to the database")?;
    tracing::info!("Successfully connected to the database.");
    store.migrate().await.context("Failed to apply the database schema")?;

    Ok(Self::new(Arc::new(store), config))
  }
}
