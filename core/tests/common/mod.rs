// core/tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset of these helpers.

use bookstore::auth::hash_password;
use bookstore::{
  Book, Bookstore, Identity, MemoryStore, Money, NewBook, NewUser, PaymentMethod, SessionState, ShippingDetails, Store,
  User,
};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;

pub const PASSWORD: &str = "correct horse battery staple";

// Argon2 is slow in debug builds; hash once and reuse for fixture users.
static PASSWORD_HASH: Lazy<String> = Lazy::new(|| hash_password(PASSWORD).expect("hashing the fixture password"));

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub struct Fixture {
  pub store: Arc<MemoryStore>,
  pub bookstore: Bookstore,
}

pub fn fixture() -> Fixture {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let bookstore = Bookstore::new(store.clone());
  Fixture { store, bookstore }
}

impl Fixture {
  pub async fn book(&self, title: &str, genre: &str, cents: i64) -> Book {
    self
      .store
      .insert_book(NewBook {
        title: title.to_string(),
        author: "Test Author".to_string(),
        genre: genre.to_string(),
        price: Money::from_cents(cents),
        cover_image: None,
      })
      .await
      .unwrap()
  }

  pub async fn user(&self, username: &str) -> User {
    self.insert_user(username, false).await
  }

  pub async fn staff(&self, username: &str) -> User {
    self.insert_user(username, true).await
  }

  async fn insert_user(&self, username: &str, is_staff: bool) -> User {
    self
      .store
      .insert_user(NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: PASSWORD_HASH.clone(),
        is_staff,
      })
      .await
      .unwrap()
  }

  /// A session already signed in as `user`, plus the matching identity.
  pub fn signed_in(&self, user: &User) -> (Identity, SessionState) {
    let mut session = SessionState::new();
    session.user_id = Some(user.id);
    (Identity::User(user.clone()), session)
  }
}

pub fn shipping() -> ShippingDetails {
  ShippingDetails {
    full_name: "Ada Reader".to_string(),
    email: "ada@example.com".to_string(),
    address: "1 Library Lane".to_string(),
    payment_method: PaymentMethod::Cod,
  }
}

pub fn notice_messages(session: &SessionState) -> Vec<&str> {
  session.notices.iter().map(|n| n.message.as_str()).collect()
}
