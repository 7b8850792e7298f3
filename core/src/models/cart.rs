// core/src/models/cart.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// A shopping cart and its line items.
///
/// `total_price` is a cached copy of the sum of `items[..].total_price`. The
/// mutating methods in [`crate::cart`] keep it in sync; stores persist both in
/// one write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cart {
  pub id: Uuid,
  /// `None` for anonymous carts, which are tracked by session only.
  pub owner_id: Option<Uuid>,
  pub total_price: Money,
  /// Ordered by insertion.
  pub items: Vec<CartItem>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub book_id: Uuid,
  pub quantity: u32,
  /// `quantity * book.price` as of the last update to this line.
  pub total_price: Money,
  pub added_at: DateTime<Utc>,
}

/// A `(book, quantity)` pair supplied from outside the store: a client-side
/// cart being synced, or an anonymous cart stashed in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub book_id: Uuid,
  pub quantity: u32,
}

/// A cart item joined with its book, for display and order snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartEntry {
  pub book_id: Uuid,
  pub title: String,
  pub author: String,
  pub unit_price: Money,
  pub quantity: u32,
  pub total_price: Money,
}
