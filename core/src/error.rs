// core/src/error.rs
use thiserror::Error;
use uuid::Uuid;

use crate::money::MoneyParseError;

#[derive(Debug, Error)]
pub enum BookstoreError {
  /// User input failed a form rule. The message is safe to show to the user.
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Auth(String),

  #[error("{entity} {id} not found")]
  NotFound { entity: &'static str, id: Uuid },

  /// A write collided with a uniqueness rule (username, email, one cart per user).
  #[error("{0}")]
  Conflict(String),

  #[error("Store error: {source}")]
  Store {
    #[from]
    source: sqlx::Error,
  },

  #[error("Internal bookstore error: {0}")]
  Internal(String),
}

impl BookstoreError {
  pub fn not_found(entity: &'static str, id: Uuid) -> Self {
    BookstoreError::NotFound { entity, id }
  }

  /// Whether the message can be shown to an end user verbatim.
  pub fn is_user_facing(&self) -> bool {
    matches!(
      self,
      BookstoreError::Validation(_)
        | BookstoreError::Auth(_)
        | BookstoreError::NotFound { .. }
        | BookstoreError::Conflict(_)
    )
  }
}

impl From<MoneyParseError> for BookstoreError {
  fn from(err: MoneyParseError) -> Self {
    BookstoreError::Validation(format!("Invalid price: {}", err))
  }
}

pub type Result<T, E = BookstoreError> = std::result::Result<T, E>;
