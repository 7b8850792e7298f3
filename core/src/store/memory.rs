// core/src/store/memory.rs

//! A [`Store`] kept entirely in process memory.
//!
//! All state sits behind one `parking_lot::RwLock`, so every method is atomic
//! with respect to the others. Guards are never held across an `.await`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;
use uuid::Uuid;

use crate::error::{BookstoreError, Result};
use crate::models::{Book, Cart, NewBook, NewUser, Order, SessionState, User};
use crate::store::Store;

#[derive(Debug, Default)]
struct Tables {
  users: HashMap<Uuid, User>,
  books: HashMap<Uuid, Book>,
  carts: HashMap<Uuid, Cart>,
  orders: Vec<Order>,
  sessions: HashMap<Uuid, SessionState>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of carts currently stored, owned or anonymous.
  pub fn cart_count(&self) -> usize {
    self.tables.read().carts.len()
  }

  pub fn session_count(&self) -> usize {
    self.tables.read().sessions.len()
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn insert_user(&self, user: NewUser) -> Result<User> {
    let mut tables = self.tables.write();
    if tables.users.values().any(|u| u.username == user.username) {
      return Err(BookstoreError::Conflict(
        "Username already registered. Please try logging in.".to_string(),
      ));
    }
    if tables.users.values().any(|u| u.email == user.email) {
      return Err(BookstoreError::Conflict(
        "Email already registered. Please try logging in.".to_string(),
      ));
    }
    let user = user.into_user();
    tables.users.insert(user.id, user.clone());
    Ok(user)
  }

  async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.tables.read().users.get(&id).cloned())
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
    Ok(self.tables.read().users.values().find(|u| u.username == username).cloned())
  }

  async fn username_exists(&self, username: &str) -> Result<bool> {
    Ok(self.tables.read().users.values().any(|u| u.username == username))
  }

  async fn email_exists(&self, email: &str) -> Result<bool> {
    Ok(self.tables.read().users.values().any(|u| u.email == email))
  }

  async fn insert_book(&self, book: NewBook) -> Result<Book> {
    let book = book.into_book();
    self.tables.write().books.insert(book.id, book.clone());
    Ok(book)
  }

  async fn get_book(&self, id: Uuid) -> Result<Option<Book>> {
    Ok(self.tables.read().books.get(&id).cloned())
  }

  async fn list_books(&self, genre_filter: &str) -> Result<Vec<Book>> {
    let needle = genre_filter.to_lowercase();
    let mut books: Vec<Book> = self
      .tables
      .read()
      .books
      .values()
      .filter(|b| b.genre.to_lowercase().contains(&needle))
      .cloned()
      .collect();
    books.sort_by(|a, b| a.title.cmp(&b.title).then(a.created_at.cmp(&b.created_at)));
    Ok(books)
  }

  async fn list_genres(&self) -> Result<Vec<String>> {
    let genres: BTreeSet<String> = self.tables.read().books.values().map(|b| b.genre.clone()).collect();
    Ok(genres.into_iter().collect())
  }

  async fn count_books(&self) -> Result<u64> {
    Ok(self.tables.read().books.len() as u64)
  }

  async fn delete_book(&self, id: Uuid) -> Result<Option<Book>> {
    let mut tables = self.tables.write();
    let Some(book) = tables.books.remove(&id) else {
      return Ok(None);
    };
    for cart in tables.carts.values_mut() {
      if cart.remove_item(id).is_some() {
        debug!(cart_id = %cart.id, book_id = %id, "Dropped deleted book from cart.");
      }
    }
    Ok(Some(book))
  }

  async fn find_cart(&self, id: Uuid) -> Result<Option<Cart>> {
    Ok(self.tables.read().carts.get(&id).cloned())
  }

  async fn find_cart_by_owner(&self, owner_id: Uuid) -> Result<Option<Cart>> {
    Ok(
      self
        .tables
        .read()
        .carts
        .values()
        .find(|c| c.owner_id == Some(owner_id))
        .cloned(),
    )
  }

  async fn find_or_create_user_cart(&self, owner_id: Uuid) -> Result<Cart> {
    let mut tables = self.tables.write();
    if let Some(cart) = tables.carts.values().find(|c| c.owner_id == Some(owner_id)) {
      return Ok(cart.clone());
    }
    let cart = Cart::new(Some(owner_id));
    tables.carts.insert(cart.id, cart.clone());
    Ok(cart)
  }

  async fn create_anonymous_cart(&self) -> Result<Cart> {
    let cart = Cart::new(None);
    self.tables.write().carts.insert(cart.id, cart.clone());
    Ok(cart)
  }

  async fn save_cart(&self, cart: &Cart) -> Result<()> {
    let mut tables = self.tables.write();
    match tables.carts.get_mut(&cart.id) {
      Some(stored) => {
        *stored = cart.clone();
        Ok(())
      }
      None => Err(BookstoreError::not_found("cart", cart.id)),
    }
  }

  async fn delete_cart(&self, id: Uuid) -> Result<()> {
    self.tables.write().carts.remove(&id);
    Ok(())
  }

  async fn place_order(&self, cart: &Cart, order: Order) -> Result<Order> {
    let mut tables = self.tables.write();
    if tables.carts.remove(&cart.id).is_none() {
      return Err(BookstoreError::not_found("cart", cart.id));
    }
    tables.orders.push(order.clone());
    Ok(order)
  }

  async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.read().orders.iter().find(|o| o.id == id).cloned())
  }

  async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables
      .read()
      .orders
      .iter()
      .filter(|o| o.owner_id == Some(user_id))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn load_session(&self, token: Uuid) -> Result<Option<SessionState>> {
    Ok(self.tables.read().sessions.get(&token).cloned())
  }

  async fn save_session(&self, session: &SessionState) -> Result<()> {
    self.tables.write().sessions.insert(session.token, session.clone());
    Ok(())
  }

  async fn delete_session(&self, token: Uuid) -> Result<()> {
    self.tables.write().sessions.remove(&token);
    Ok(())
  }

  async fn purge_sessions(&self, cutoff: DateTime<Utc>) -> Result<u64> {
    let mut tables = self.tables.write();
    let expired: Vec<SessionState> = tables
      .sessions
      .values()
      .filter(|session| session.updated_at < cutoff)
      .cloned()
      .collect();
    for session in &expired {
      tables.sessions.remove(&session.token);
      if let Some(cart_id) = session.cart_id {
        if tables.carts.get(&cart_id).is_some_and(|cart| cart.owner_id.is_none()) {
          tables.carts.remove(&cart_id);
        }
      }
    }
    debug!(purged = expired.len(), "Purged idle sessions.");
    Ok(expired.len() as u64)
  }
}
