// core/src/lib.rs

//! Bookstore core: catalog, carts, and orders for a small online bookstore.
//!
//! The crate is organised around a few pieces:
//!  - [`Cart`] aggregate operations that keep a cart's cached total equal to
//!    the sum of its lines.
//!  - A [`Store`] trait with a Postgres backend and an in-memory backend.
//!  - The [`Bookstore`] facade, which resolves carts for users and anonymous
//!    sessions, bridges anonymous carts across logout/login, and turns carts
//!    into orders.

pub mod auth;
pub mod cart;
pub mod error;
pub mod forms;
pub mod models;
pub mod money;
pub mod service;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::cart::{QuantityAction, MAX_LINE_QUANTITY};
pub use crate::error::{BookstoreError, Result};
pub use crate::forms::{BookForm, CheckoutForm, LoginForm, SignupForm};
pub use crate::models::{
  Book, Cart, CartEntry, CartItem, CartLine, Identity, NewBook, NewUser, Notice, NoticeLevel, Order, OrderLine,
  PaymentMethod, SessionState, ShippingDetails, User,
};
pub use crate::money::{Money, MoneyParseError};
pub use crate::service::{Bookstore, CatalogOutcome, SeedConfig, SeedReport, DEFAULT_SESSION_TTL_SECS};
pub use crate::store::{MemoryStore, PgStore, Store};
