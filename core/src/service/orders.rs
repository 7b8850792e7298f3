// core/src/service/orders.rs

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{BookstoreError, Result};
use crate::models::{Identity, Order, OrderLine, SessionState, ShippingDetails, User};
use crate::service::Bookstore;

impl Bookstore {
  /// Turns the caller's cart into an order and deletes the cart.
  ///
  /// The order keeps the cart's total and a copy of every line. Fails with
  /// `NotFound` when there is no cart and `Validation` when it is empty.
  #[instrument(
    name = "bookstore::place_order",
    skip(self, identity, session, shipping),
    fields(user_id = ?identity.user_id()),
    err(Display)
  )]
  pub async fn place_order(
    &self,
    identity: &Identity,
    session: &mut SessionState,
    shipping: ShippingDetails,
  ) -> Result<Order> {
    let cart = self
      .resolve_cart(identity, session)
      .await?
      .ok_or_else(|| BookstoreError::Validation("Cart not found.".to_string()))?;
    if cart.is_empty() {
      return Err(BookstoreError::Validation("Your cart is empty.".to_string()));
    }

    let lines = self
      .describe_cart(&cart)
      .await?
      .into_iter()
      .map(|entry| OrderLine {
        book_id: entry.book_id,
        title: entry.title,
        quantity: entry.quantity,
        unit_price: entry.unit_price,
        total_price: entry.total_price,
      })
      .collect();

    let order = Order {
      id: Uuid::new_v4(),
      cart_id: cart.id,
      owner_id: identity.user_id(),
      total_price: cart.total_price,
      shipping,
      lines,
      created_at: Utc::now(),
    };
    let order = self.store.place_order(&cart, order).await?;

    if session.cart_id == Some(cart.id) {
      session.cart_id = None;
    }
    session.success("Order placed successfully!");
    info!(order_id = %order.id, total = %order.total_price, "Order placed.");
    Ok(order)
  }

  pub async fn order(&self, order_id: Uuid) -> Result<Order> {
    self
      .store
      .find_order(order_id)
      .await?
      .ok_or_else(|| BookstoreError::not_found("order", order_id))
  }

  /// Orders placed by `user`, newest first.
  pub async fn orders_for(&self, user: &User) -> Result<Vec<Order>> {
    self.store.orders_for_user(user.id).await
  }
}
