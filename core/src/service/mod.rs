// core/src/service/mod.rs

//! The `Bookstore` facade: every operation the web layer invokes.
//!
//! Each operation that depends on who is asking takes the caller's
//! [`Identity`](crate::models::Identity) and [`SessionState`] explicitly.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::models::SessionState;
use crate::store::Store;

mod accounts;
mod carts;
mod catalog;
mod orders;
mod seed;

pub use catalog::CatalogOutcome;
pub use seed::{SeedConfig, SeedReport};

/// Idle time after which a stored session is dropped, unless configured otherwise.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;

#[derive(Clone)]
pub struct Bookstore {
  store: Arc<dyn Store>,
  session_ttl: Duration,
}

impl Bookstore {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Bookstore {
      store,
      session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS as i64),
    }
  }

  pub fn with_session_ttl(mut self, ttl: std::time::Duration) -> Self {
    match Duration::from_std(ttl) {
      Ok(ttl) => self.session_ttl = ttl,
      Err(_) => warn!(?ttl, "Session TTL out of range, keeping the default."),
    }
    self
  }

  /// Loads the session for `token`, or starts a fresh one when the token is
  /// absent, unknown or idle for longer than the session TTL. An expired
  /// session is deleted together with its anonymous cart.
  #[instrument(name = "bookstore::open_session", skip(self), err(Display))]
  pub async fn open_session(&self, token: Option<Uuid>) -> Result<SessionState> {
    if let Some(token) = token {
      match self.store.load_session(token).await? {
        Some(session) if !session.is_expired(self.session_ttl, Utc::now()) => return Ok(session),
        Some(session) => {
          debug!(%token, updated_at = %session.updated_at, "Session expired, starting a new session.");
          self.discard_session(&session).await?;
        }
        None => debug!(%token, "Unknown session token, starting a new session."),
      }
    }
    Ok(SessionState::new())
  }

  /// Stores `session` if it carries state and deletes its row otherwise.
  /// Returns whether a row now exists for the session's token.
  pub async fn persist_session(&self, session: &mut SessionState) -> Result<bool> {
    if !session.carries_state() {
      self.store.delete_session(session.token).await?;
      return Ok(false);
    }
    session.updated_at = Utc::now();
    self.store.save_session(session).await?;
    Ok(true)
  }

  /// Deletes every session idle for longer than the session TTL, along with
  /// the anonymous carts they referenced.
  #[instrument(name = "bookstore::purge_expired_sessions", skip(self), err(Display))]
  pub async fn purge_expired_sessions(&self) -> Result<u64> {
    let purged = self.store.purge_sessions(Utc::now() - self.session_ttl).await?;
    if purged > 0 {
      info!(purged, "Purged expired sessions.");
    }
    Ok(purged)
  }

  async fn discard_session(&self, session: &SessionState) -> Result<()> {
    if let Some(cart_id) = session.cart_id {
      if let Some(cart) = self.store.find_cart(cart_id).await? {
        if cart.owner_id.is_none() {
          self.store.delete_cart(cart.id).await?;
        }
      }
    }
    self.store.delete_session(session.token).await
  }
}

impl std::fmt::Debug for Bookstore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Bookstore").finish_non_exhaustive()
  }
}
