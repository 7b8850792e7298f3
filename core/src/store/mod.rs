// core/src/store/mod.rs

//! Persistence seam for the bookstore.
//!
//! Implementations must make each method a single atomic unit. In particular
//! `save_cart`, `place_order` and `delete_book` touch several rows and must
//! never leave a cart whose cached total disagrees with its items.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Book, Cart, NewBook, NewUser, Order, SessionState, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync + 'static {
  // --- Users ---

  /// Fails with `Conflict` when the username or email is already taken.
  async fn insert_user(&self, user: NewUser) -> Result<User>;
  async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
  async fn username_exists(&self, username: &str) -> Result<bool>;
  async fn email_exists(&self, email: &str) -> Result<bool>;

  // --- Catalog ---

  async fn insert_book(&self, book: NewBook) -> Result<Book>;
  async fn get_book(&self, id: Uuid) -> Result<Option<Book>>;
  /// Books whose genre contains `genre_filter` (case-insensitive), ordered by title.
  /// An empty filter matches every book.
  async fn list_books(&self, genre_filter: &str) -> Result<Vec<Book>>;
  /// Distinct genres, sorted.
  async fn list_genres(&self) -> Result<Vec<String>>;
  async fn count_books(&self) -> Result<u64>;
  /// Deletes the book and every cart line that references it, re-deriving the
  /// totals of the affected carts. Returns the deleted book.
  async fn delete_book(&self, id: Uuid) -> Result<Option<Book>>;

  // --- Carts ---

  async fn find_cart(&self, id: Uuid) -> Result<Option<Cart>>;
  async fn find_cart_by_owner(&self, owner_id: Uuid) -> Result<Option<Cart>>;
  /// Returns the user's cart, creating it if absent. At most one cart exists per owner.
  async fn find_or_create_user_cart(&self, owner_id: Uuid) -> Result<Cart>;
  async fn create_anonymous_cart(&self) -> Result<Cart>;
  /// Replaces the stored items and cached total of an existing cart.
  /// Fails with `NotFound` if the cart no longer exists.
  async fn save_cart(&self, cart: &Cart) -> Result<()>;
  async fn delete_cart(&self, id: Uuid) -> Result<()>;

  // --- Orders ---

  /// Stores `order` and deletes `cart` with its items.
  async fn place_order(&self, cart: &Cart, order: Order) -> Result<Order>;
  async fn find_order(&self, id: Uuid) -> Result<Option<Order>>;
  async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>>;

  // --- Sessions ---

  async fn load_session(&self, token: Uuid) -> Result<Option<SessionState>>;
  async fn save_session(&self, session: &SessionState) -> Result<()>;
  async fn delete_session(&self, token: Uuid) -> Result<()>;
  /// Deletes sessions last written before `cutoff` and the ownerless carts
  /// they point at. Returns the number of sessions removed.
  async fn purge_sessions(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
