// core/src/store/postgres.rs

//! Postgres-backed [`Store`] using runtime-checked sqlx queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{BookstoreError, Result};
use crate::models::{
  Book, Cart, CartItem, CartLine, NewBook, NewUser, Notice, Order, OrderLine, PaymentMethod, SessionState,
  ShippingDetails, User,
};
use crate::money::Money;
use crate::store::Store;

const SCHEMA_SQL: &str = include_str!("../../migrations/schema.sql");

const USER_COLUMNS: &str = "id, username, email, password_hash, is_staff, is_active, created_at";
const BOOK_COLUMNS: &str = "id, title, author, genre, price_cents, cover_image, created_at";
const ORDER_COLUMNS: &str =
  "id, cart_id, owner_id, total_price_cents, full_name, email, address, payment_method, created_at";

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

#[derive(FromRow)]
struct CartRow {
  id: Uuid,
  owner_id: Option<Uuid>,
  total_price_cents: i64,
  created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CartItemRow {
  id: Uuid,
  cart_id: Uuid,
  book_id: Uuid,
  quantity: i32,
  total_price_cents: i64,
  added_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct OrderRow {
  id: Uuid,
  cart_id: Uuid,
  owner_id: Option<Uuid>,
  total_price_cents: i64,
  full_name: String,
  email: String,
  address: String,
  payment_method: String,
  created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct OrderLineRow {
  book_id: Uuid,
  title: String,
  quantity: i32,
  unit_price_cents: i64,
  total_price_cents: i64,
}

#[derive(FromRow)]
struct SessionRow {
  token: Uuid,
  user_id: Option<Uuid>,
  cart_id: Option<Uuid>,
  pending_cart: Json<Vec<CartLine>>,
  notices: Json<Vec<Notice>>,
  updated_at: DateTime<Utc>,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    PgStore { pool }
  }

  pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    Ok(Self::new(pool))
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  /// Creates any missing tables. Safe to run on every startup.
  #[instrument(name = "pg_store::migrate", skip(self), err(Display))]
  pub async fn migrate(&self) -> Result<()> {
    sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
    info!("Database schema is up to date.");
    Ok(())
  }

  async fn hydrate_cart(&self, row: CartRow) -> Result<Cart> {
    let item_rows: Vec<CartItemRow> = sqlx::query_as(
      "SELECT id, cart_id, book_id, quantity, total_price_cents, added_at
       FROM cart_items WHERE cart_id = $1 ORDER BY seq",
    )
    .bind(row.id)
    .fetch_all(&self.pool)
    .await?;

    let items = item_rows
      .into_iter()
      .map(|item| {
        Ok(CartItem {
          id: item.id,
          cart_id: item.cart_id,
          book_id: item.book_id,
          quantity: stored_quantity(item.quantity)?,
          total_price: Money::from_cents(item.total_price_cents),
          added_at: item.added_at,
        })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Cart {
      id: row.id,
      owner_id: row.owner_id,
      total_price: Money::from_cents(row.total_price_cents),
      items,
      created_at: row.created_at,
    })
  }

  async fn hydrate_order(&self, row: OrderRow) -> Result<Order> {
    let line_rows: Vec<OrderLineRow> = sqlx::query_as(
      "SELECT book_id, title, quantity, unit_price_cents, total_price_cents
       FROM order_lines WHERE order_id = $1 ORDER BY position",
    )
    .bind(row.id)
    .fetch_all(&self.pool)
    .await?;

    let lines = line_rows
      .into_iter()
      .map(|line| {
        Ok(OrderLine {
          book_id: line.book_id,
          title: line.title,
          quantity: stored_quantity(line.quantity)?,
          unit_price: Money::from_cents(line.unit_price_cents),
          total_price: Money::from_cents(line.total_price_cents),
        })
      })
      .collect::<Result<Vec<_>>>()?;

    let payment_method = PaymentMethod::parse(&row.payment_method).ok_or_else(|| {
      BookstoreError::Internal(format!("Unknown payment method '{}' on order {}", row.payment_method, row.id))
    })?;

    Ok(Order {
      id: row.id,
      cart_id: row.cart_id,
      owner_id: row.owner_id,
      total_price: Money::from_cents(row.total_price_cents),
      shipping: ShippingDetails {
        full_name: row.full_name,
        email: row.email,
        address: row.address,
        payment_method,
      },
      lines,
      created_at: row.created_at,
    })
  }
}

fn stored_quantity(raw: i32) -> Result<u32> {
  u32::try_from(raw).map_err(|_| BookstoreError::Internal(format!("Stored quantity {} is negative", raw)))
}

fn bindable_quantity(quantity: u32) -> Result<i32> {
  i32::try_from(quantity).map_err(|_| BookstoreError::Validation("Quantity is too large.".to_string()))
}

/// Maps a unique-constraint violation to `Conflict`; everything else stays a store error.
fn map_unique_violation(err: sqlx::Error, describe: impl Fn(Option<&str>) -> String) -> BookstoreError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return BookstoreError::Conflict(describe(db_err.constraint()));
    }
  }
  BookstoreError::from(err)
}

#[async_trait]
impl Store for PgStore {
  #[instrument(name = "pg_store::insert_user", skip(self, user), fields(username = %user.username), err(Display))]
  async fn insert_user(&self, user: NewUser) -> Result<User> {
    let user = user.into_user();
    sqlx::query_as::<_, User>(&format!(
      "INSERT INTO users (id, username, email, password_hash, is_staff, is_active, created_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      USER_COLUMNS
    ))
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_staff)
    .bind(user.is_active)
    .bind(user.created_at)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| {
      map_unique_violation(e, |constraint| match constraint {
        Some(name) if name.contains("email") => "Email already registered. Please try logging in.".to_string(),
        _ => "Username already registered. Please try logging in.".to_string(),
      })
    })
  }

  async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(user)
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS))
      .bind(username)
      .fetch_optional(&self.pool)
      .await?;
    Ok(user)
  }

  async fn username_exists(&self, username: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
      .bind(username)
      .fetch_one(&self.pool)
      .await?;
    Ok(exists)
  }

  async fn email_exists(&self, email: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
      .bind(email)
      .fetch_one(&self.pool)
      .await?;
    Ok(exists)
  }

  #[instrument(name = "pg_store::insert_book", skip(self, book), fields(title = %book.title), err(Display))]
  async fn insert_book(&self, book: NewBook) -> Result<Book> {
    let book = book.into_book();
    let stored = sqlx::query_as::<_, Book>(&format!(
      "INSERT INTO books (id, title, author, genre, price_cents, cover_image, created_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      BOOK_COLUMNS
    ))
    .bind(book.id)
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.genre)
    .bind(book.price)
    .bind(&book.cover_image)
    .bind(book.created_at)
    .fetch_one(&self.pool)
    .await?;
    Ok(stored)
  }

  async fn get_book(&self, id: Uuid) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(book)
  }

  async fn list_books(&self, genre_filter: &str) -> Result<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(&format!(
      "SELECT {} FROM books WHERE STRPOS(LOWER(genre), LOWER($1)) > 0 ORDER BY title, created_at",
      BOOK_COLUMNS
    ))
    .bind(genre_filter)
    .fetch_all(&self.pool)
    .await?;
    Ok(books)
  }

  async fn list_genres(&self) -> Result<Vec<String>> {
    let genres: Vec<String> = sqlx::query_scalar("SELECT DISTINCT genre FROM books ORDER BY genre")
      .fetch_all(&self.pool)
      .await?;
    Ok(genres)
  }

  async fn count_books(&self) -> Result<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
      .fetch_one(&self.pool)
      .await?;
    Ok(u64::try_from(count).unwrap_or_default())
  }

  #[instrument(name = "pg_store::delete_book", skip(self), err(Display))]
  async fn delete_book(&self, id: Uuid) -> Result<Option<Book>> {
    let mut tx = self.pool.begin().await?;

    let affected_carts: Vec<Uuid> = sqlx::query_scalar("SELECT DISTINCT cart_id FROM cart_items WHERE book_id = $1")
      .bind(id)
      .fetch_all(&mut *tx)
      .await?;

    let deleted = sqlx::query_as::<_, Book>(&format!("DELETE FROM books WHERE id = $1 RETURNING {}", BOOK_COLUMNS))
      .bind(id)
      .fetch_optional(&mut *tx)
      .await?;
    let Some(book) = deleted else {
      return Ok(None);
    };

    // cart_items rows went with the book (ON DELETE CASCADE); re-derive the cached totals.
    if !affected_carts.is_empty() {
      sqlx::query(
        "UPDATE carts SET total_price_cents = COALESCE(
           (SELECT SUM(ci.total_price_cents) FROM cart_items ci WHERE ci.cart_id = carts.id), 0)::BIGINT
         WHERE id = ANY($1)",
      )
      .bind(&affected_carts)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    debug!(book_id = %id, carts = affected_carts.len(), "Book deleted and cart totals re-derived.");
    Ok(Some(book))
  }

  async fn find_cart(&self, id: Uuid) -> Result<Option<Cart>> {
    let row: Option<CartRow> =
      sqlx::query_as("SELECT id, owner_id, total_price_cents, created_at FROM carts WHERE id = $1")
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
    match row {
      Some(row) => Ok(Some(self.hydrate_cart(row).await?)),
      None => Ok(None),
    }
  }

  async fn find_cart_by_owner(&self, owner_id: Uuid) -> Result<Option<Cart>> {
    let row: Option<CartRow> =
      sqlx::query_as("SELECT id, owner_id, total_price_cents, created_at FROM carts WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
    match row {
      Some(row) => Ok(Some(self.hydrate_cart(row).await?)),
      None => Ok(None),
    }
  }

  async fn find_or_create_user_cart(&self, owner_id: Uuid) -> Result<Cart> {
    sqlx::query(
      "INSERT INTO carts (id, owner_id, total_price_cents, created_at)
       VALUES ($1, $2, 0, NOW()) ON CONFLICT (owner_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .execute(&self.pool)
    .await?;

    self
      .find_cart_by_owner(owner_id)
      .await?
      .ok_or_else(|| BookstoreError::Internal(format!("Cart for user {} vanished after creation", owner_id)))
  }

  async fn create_anonymous_cart(&self) -> Result<Cart> {
    let cart = Cart::new(None);
    sqlx::query("INSERT INTO carts (id, owner_id, total_price_cents, created_at) VALUES ($1, NULL, 0, $2)")
      .bind(cart.id)
      .bind(cart.created_at)
      .execute(&self.pool)
      .await?;
    Ok(cart)
  }

  #[instrument(name = "pg_store::save_cart", skip(self, cart), fields(cart_id = %cart.id, items = cart.items.len()), err(Display))]
  async fn save_cart(&self, cart: &Cart) -> Result<()> {
    let mut tx = self.pool.begin().await?;

    let updated = sqlx::query("UPDATE carts SET total_price_cents = $2 WHERE id = $1")
      .bind(cart.id)
      .bind(cart.total_price)
      .execute(&mut *tx)
      .await?;
    if updated.rows_affected() == 0 {
      return Err(BookstoreError::not_found("cart", cart.id));
    }

    let kept_books: Vec<Uuid> = cart.items.iter().map(|item| item.book_id).collect();
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND NOT (book_id = ANY($2))")
      .bind(cart.id)
      .bind(&kept_books)
      .execute(&mut *tx)
      .await?;

    for item in &cart.items {
      sqlx::query(
        "INSERT INTO cart_items (id, cart_id, book_id, quantity, total_price_cents, added_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (cart_id, book_id)
         DO UPDATE SET quantity = EXCLUDED.quantity, total_price_cents = EXCLUDED.total_price_cents",
      )
      .bind(item.id)
      .bind(cart.id)
      .bind(item.book_id)
      .bind(bindable_quantity(item.quantity)?)
      .bind(item.total_price)
      .bind(item.added_at)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    Ok(())
  }

  async fn delete_cart(&self, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM carts WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  #[instrument(name = "pg_store::place_order", skip(self, cart, order), fields(cart_id = %cart.id, order_id = %order.id), err(Display))]
  async fn place_order(&self, cart: &Cart, order: Order) -> Result<Order> {
    let mut tx = self.pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM carts WHERE id = $1")
      .bind(cart.id)
      .execute(&mut *tx)
      .await?;
    if deleted.rows_affected() == 0 {
      return Err(BookstoreError::not_found("cart", cart.id));
    }

    sqlx::query(&format!(
      "INSERT INTO orders ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
      ORDER_COLUMNS
    ))
    .bind(order.id)
    .bind(order.cart_id)
    .bind(order.owner_id)
    .bind(order.total_price)
    .bind(&order.shipping.full_name)
    .bind(&order.shipping.email)
    .bind(&order.shipping.address)
    .bind(order.shipping.payment_method.as_str())
    .bind(order.created_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| map_unique_violation(e, |_| format!("Cart {} has already been checked out.", cart.id)))?;

    for (position, line) in order.lines.iter().enumerate() {
      let position =
        i32::try_from(position).map_err(|_| BookstoreError::Validation("Order has too many lines.".to_string()))?;
      sqlx::query(
        "INSERT INTO order_lines (order_id, position, book_id, title, quantity, unit_price_cents, total_price_cents)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
      )
      .bind(order.id)
      .bind(position)
      .bind(line.book_id)
      .bind(&line.title)
      .bind(bindable_quantity(line.quantity)?)
      .bind(line.unit_price)
      .bind(line.total_price)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    Ok(order)
  }

  async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    match row {
      Some(row) => Ok(Some(self.hydrate_order(row).await?)),
      None => Ok(None),
    }
  }

  async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE owner_id = $1 ORDER BY created_at DESC",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;

    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
      orders.push(self.hydrate_order(row).await?);
    }
    Ok(orders)
  }

  async fn load_session(&self, token: Uuid) -> Result<Option<SessionState>> {
    let row: Option<SessionRow> = sqlx::query_as(
      "SELECT token, user_id, cart_id, pending_cart, notices, updated_at FROM sessions WHERE token = $1",
    )
    .bind(token)
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(|row| SessionState {
      token: row.token,
      user_id: row.user_id,
      cart_id: row.cart_id,
      pending_cart: row.pending_cart.0,
      notices: row.notices.0,
      updated_at: row.updated_at,
    }))
  }

  async fn save_session(&self, session: &SessionState) -> Result<()> {
    sqlx::query(
      "INSERT INTO sessions (token, user_id, cart_id, pending_cart, notices, updated_at)
       VALUES ($1, $2, $3, $4, $5, NOW())
       ON CONFLICT (token) DO UPDATE SET
         user_id = EXCLUDED.user_id,
         cart_id = EXCLUDED.cart_id,
         pending_cart = EXCLUDED.pending_cart,
         notices = EXCLUDED.notices,
         updated_at = NOW()",
    )
    .bind(session.token)
    .bind(session.user_id)
    .bind(session.cart_id)
    .bind(Json(&session.pending_cart))
    .bind(Json(&session.notices))
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn delete_session(&self, token: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
      .bind(token)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  #[instrument(name = "pg_store::purge_sessions", skip(self), err(Display))]
  async fn purge_sessions(&self, cutoff: DateTime<Utc>) -> Result<u64> {
    let mut tx = self.pool.begin().await?;

    sqlx::query(
      "DELETE FROM carts
       WHERE owner_id IS NULL
         AND id IN (SELECT cart_id FROM sessions WHERE updated_at < $1 AND cart_id IS NOT NULL)",
    )
    .bind(cutoff)
    .execute(&mut *tx)
    .await?;

    let purged = sqlx::query("DELETE FROM sessions WHERE updated_at < $1")
      .bind(cutoff)
      .execute(&mut *tx)
      .await?
      .rows_affected();

    tx.commit().await?;
    debug!(purged, "Purged idle sessions.");
    Ok(purged)
  }
}
