// core/src/service/carts.rs

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cart::QuantityAction;
use crate::error::{BookstoreError, Result};
use crate::models::{Book, Cart, CartEntry, CartItem, CartLine, Identity, SessionState};
use crate::service::Bookstore;

impl Bookstore {
  /// Finds the caller's cart without creating one for anonymous visitors.
  ///
  /// An authenticated user always ends up with a cart; an anonymous visitor
  /// only has one if a previous call stored its id in the session.
  pub async fn resolve_cart(&self, identity: &Identity, session: &SessionState) -> Result<Option<Cart>> {
    match identity {
      Identity::User(user) => Ok(Some(self.store.find_or_create_user_cart(user.id).await?)),
      Identity::Anonymous => match session.cart_id {
        Some(cart_id) => Ok(self.store.find_cart(cart_id).await?),
        None => Ok(None),
      },
    }
  }

  /// Like [`resolve_cart`](Self::resolve_cart), but allocates an ownerless
  /// cart for an anonymous visitor and records its id in the session.
  pub async fn resolve_or_create_cart(&self, identity: &Identity, session: &mut SessionState) -> Result<Cart> {
    if let Some(cart) = self.resolve_cart(identity, session).await? {
      return Ok(cart);
    }
    let cart = self.store.create_anonymous_cart().await?;
    session.cart_id = Some(cart.id);
    debug!(cart_id = %cart.id, token = %session.token, "Created anonymous cart.");
    Ok(cart)
  }

  #[instrument(
    name = "bookstore::add_to_cart",
    skip(self, identity, session),
    fields(user_id = ?identity.user_id()),
    err(Display)
  )]
  pub async fn add_to_cart(&self, identity: &Identity, session: &mut SessionState, book_id: Uuid) -> Result<Cart> {
    let book = self.book(book_id).await?;
    let mut cart = self.resolve_or_create_cart(identity, session).await?;
    cart.add_item(&book, 1)?;
    self.store.save_cart(&cart).await?;

    session.success(format!("\"{}\" added to cart.", book.title));
    info!(cart_id = %cart.id, total = %cart.total_price, "Book added to cart.");
    Ok(cart)
  }

  /// Applies a quantity action from the cart page. An unrecognised action
  /// leaves the quantity alone. Returns `None` (with an error notice) when the
  /// cart, the line, or the book is missing.
  #[instrument(
    name = "bookstore::update_quantity",
    skip(self, identity, session),
    fields(user_id = ?identity.user_id()),
    err(Display)
  )]
  pub async fn update_quantity(
    &self,
    identity: &Identity,
    session: &mut SessionState,
    book_id: Uuid,
    action: &str,
  ) -> Result<Option<Cart>> {
    let cart = self.resolve_cart(identity, session).await?;
    let book = self.store.get_book(book_id).await?;
    let (Some(mut cart), Some(book)) = (cart, book) else {
      session.error("Error updating cart.");
      return Ok(None);
    };
    if !cart.contains(book.id) {
      session.error("Error updating cart.");
      return Ok(None);
    }

    match action.parse::<QuantityAction>() {
      Ok(action) => {
        match cart.update_quantity(&book, action) {
          Ok(_) => {}
          Err(BookstoreError::Validation(message)) => {
            session.error(message);
            return Ok(None);
          }
          Err(err) => return Err(err),
        }
      }
      Err(_) => debug!(action, "Ignoring unknown quantity action."),
    }
    self.store.save_cart(&cart).await?;

    session.success("Cart updated successfully!");
    Ok(Some(cart))
  }

  /// Removes a book from the cart. Fails with `NotFound` only when the book
  /// itself does not exist; a missing cart or line is reported as a notice.
  #[instrument(
    name = "bookstore::remove_from_cart",
    skip(self, identity, session),
    fields(user_id = ?identity.user_id()),
    err(Display)
  )]
  pub async fn remove_from_cart(
    &self,
    identity: &Identity,
    session: &mut SessionState,
    book_id: Uuid,
  ) -> Result<Option<Cart>> {
    let book = self.book(book_id).await?;
    let Some(mut cart) = self.resolve_cart(identity, session).await? else {
      session.warning("Cart not found.");
      return Ok(None);
    };
    if cart.remove_item(book.id).is_none() {
      session.warning(format!("\"{}\" not in cart.", book.title));
      return Ok(Some(cart));
    }
    self.store.save_cart(&cart).await?;

    session.success(format!("\"{}\" removed from cart.", book.title));
    Ok(Some(cart))
  }

  pub async fn cart_items(&self, identity: &Identity, session: &SessionState) -> Result<Vec<CartItem>> {
    Ok(
      self
        .resolve_cart(identity, session)
        .await?
        .map(|cart| cart.items)
        .unwrap_or_default(),
    )
  }

  /// Copies across all lines of the caller's cart; zero without a cart.
  pub async fn cart_count(&self, identity: &Identity, session: &SessionState) -> Result<u64> {
    Ok(
      self
        .resolve_cart(identity, session)
        .await?
        .map(|cart| cart.item_count())
        .unwrap_or(0),
    )
  }

  /// Joins each cart line with its book for display.
  pub async fn describe_cart(&self, cart: &Cart) -> Result<Vec<CartEntry>> {
    let mut entries = Vec::with_capacity(cart.items.len());
    for item in &cart.items {
      match self.store.get_book(item.book_id).await? {
        Some(book) => entries.push(CartEntry {
          book_id: book.id,
          title: book.title,
          author: book.author,
          unit_price: book.price,
          quantity: item.quantity,
          total_price: item.total_price,
        }),
        None => warn!(cart_id = %cart.id, book_id = %item.book_id, "Cart line refers to a missing book."),
      }
    }
    Ok(entries)
  }

  /// Merges a client-held cart into the caller's cart.
  ///
  /// Every line is checked (positive quantity, known book, totals that fit)
  /// before a cart is allocated, so a rejected payload writes nothing.
  #[instrument(
    name = "bookstore::sync_cart",
    skip(self, identity, session, lines),
    fields(user_id = ?identity.user_id(), lines = lines.len()),
    err(Display)
  )]
  pub async fn sync_cart(&self, identity: &Identity, session: &mut SessionState, lines: Vec<CartLine>) -> Result<Cart> {
    let mut incoming: Vec<(Book, u32)> = Vec::with_capacity(lines.len());
    for line in &lines {
      if line.quantity == 0 {
        return Err(BookstoreError::Validation("Quantity must be a positive number.".to_string()));
      }
      let book = self
        .store
        .get_book(line.book_id)
        .await?
        .ok_or_else(|| BookstoreError::Validation("Cart contains an unknown book.".to_string()))?;
      incoming.push((book, line.quantity));
    }

    let pairs = || incoming.iter().map(|(book, quantity)| (book, *quantity));
    let mut cart = match self.resolve_cart(identity, session).await? {
      Some(cart) => cart,
      None => {
        Cart::new(None).merge_quantities(pairs())?;
        self.resolve_or_create_cart(identity, session).await?
      }
    };
    cart.merge_quantities(pairs())?;
    self.store.save_cart(&cart).await?;
    info!(cart_id = %cart.id, total = %cart.total_price, "Client cart synced.");
    Ok(cart)
  }

  pub(crate) async fn book(&self, book_id: Uuid) -> Result<Book> {
    self
      .store
      .get_book(book_id)
      .await?
      .ok_or_else(|| BookstoreError::not_found("book", book_id))
  }
}
