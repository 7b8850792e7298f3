// core/src/models/book.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Book {
  pub id: Uuid,
  pub title: String,
  pub author: String,
  pub genre: String,
  #[sqlx(rename = "price_cents")]
  pub price: Money,
  /// Reference to an uploaded cover; the blob itself lives outside the store.
  pub cover_image: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBook {
  pub title: String,
  pub author: String,
  pub genre: String,
  pub price: Money,
  pub cover_image: Option<String>,
}

impl NewBook {
  pub fn into_book(self) -> Book {
    Book {
      id: Uuid::new_v4(),
      title: self.title,
      author: self.author,
      genre: self.genre,
      price: self.price,
      cover_image: self.cover_image,
      created_at: Utc::now(),
    }
  }
}
