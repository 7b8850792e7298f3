// core/src/models/session.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::cart::CartLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
  Success,
  Info,
  Warning,
  Error,
}

/// A one-shot message for the user, shown on the next page they load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

/// Per-browser state, keyed by an opaque token held in a cookie.
///
/// Every cart-resolving call takes this explicitly; nothing reads it from
/// ambient request state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
  pub token: Uuid,
  pub user_id: Option<Uuid>,
  /// Cart of an anonymous visitor. Unused once `user_id` is set.
  pub cart_id: Option<Uuid>,
  /// Anonymous cart contents stashed at logout, replayed at the next login.
  pub pending_cart: Vec<CartLine>,
  pub notices: Vec<Notice>,
  pub updated_at: DateTime<Utc>,
}

impl SessionState {
  pub fn new() -> Self {
    Self::with_token(Uuid::new_v4())
  }

  pub fn with_token(token: Uuid) -> Self {
    SessionState {
      token,
      user_id: None,
      cart_id: None,
      pending_cart: Vec::new(),
      notices: Vec::new(),
      updated_at: Utc::now(),
    }
  }

  pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
    self.notices.push(Notice {
      level,
      message: message.into(),
    });
  }

  pub fn success(&mut self, message: impl Into<String>) {
    self.notify(NoticeLevel::Success, message);
  }

  pub fn warning(&mut self, message: impl Into<String>) {
    self.notify(NoticeLevel::Warning, message);
  }

  pub fn error(&mut self, message: impl Into<String>) {
    self.notify(NoticeLevel::Error, message);
  }

  /// Whether there is anything worth storing: a signed-in user, a cart,
  /// stashed lines or undelivered notices.
  pub fn carries_state(&self) -> bool {
    self.user_id.is_some() || self.cart_id.is_some() || !self.pending_cart.is_empty() || !self.notices.is_empty()
  }

  /// Moves the session to a new token and returns the old one.
  pub fn rotate_token(&mut self) -> Uuid {
    std::mem::replace(&mut self.token, Uuid::new_v4())
  }

  pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
    now - self.updated_at > ttl
  }

  /// Drains queued notices; each one is delivered once.
  pub fn take_notices(&mut self) -> Vec<Notice> {
    std::mem::take(&mut self.notices)
  }
}

impl Default for SessionState {
  fn default() -> Self {
    Self::new()
  }
}
