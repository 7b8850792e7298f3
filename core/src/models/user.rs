// core/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
  pub id: Uuid,
  pub username: String,
  pub email: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub is_staff: bool,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
}

/// A user row ready to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username: String,
  pub email: String,
  pub password_hash: String,
  pub is_staff: bool,
}

impl NewUser {
  pub fn into_user(self) -> User {
    User {
      id: Uuid::new_v4(),
      username: self.username,
      email: self.email,
      password_hash: self.password_hash,
      is_staff: self.is_staff,
      is_active: true,
      created_at: Utc::now(),
    }
  }
}

/// Who is making a request. Anonymous visitors are tracked only through their session.
#[derive(Debug, Clone)]
pub enum Identity {
  User(User),
  Anonymous,
}

impl Identity {
  pub fn user(&self) -> Option<&User> {
    match self {
      Identity::User(user) => Some(user),
      Identity::Anonymous => None,
    }
  }

  pub fn user_id(&self) -> Option<Uuid> {
    self.user().map(|u| u.id)
  }

  pub fn is_authenticated(&self) -> bool {
    matches!(self, Identity::User(_))
  }

  pub fn is_staff(&self) -> bool {
    self.user().is_some_and(|u| u.is_staff)
  }
}
