// core/src/cart.rs

//! Cart aggregate operations.
//!
//! These are pure, in-memory mutations on a loaded [`Cart`]. Each mutator
//! re-derives `cart.total_price` before returning, so a caller that persists
//! the cart with [`crate::store::Store::save_cart`] always writes a total that
//! matches its items.

use chrono::Utc;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{BookstoreError, Result};
use crate::models::{Book, Cart, CartItem, CartLine};
use crate::money::Money;

/// Largest quantity a single cart line may hold. Matches the `INTEGER`
/// column that stores it.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

const QUANTITY_TOO_LARGE: &str = "Quantity is too large.";

/// The two adjustments offered on the cart page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityAction {
  Increase,
  /// Lowers the quantity by one, never below 1. Removing a line is a separate action.
  Decrease,
}

impl FromStr for QuantityAction {
  type Err = BookstoreError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim() {
      "increase" => Ok(QuantityAction::Increase),
      "decrease" => Ok(QuantityAction::Decrease),
      other => Err(BookstoreError::Validation(format!("Unknown quantity action '{}'.", other))),
    }
  }
}

impl Cart {
  pub fn new(owner_id: Option<Uuid>) -> Self {
    Cart {
      id: Uuid::new_v4(),
      owner_id,
      total_price: Money::ZERO,
      items: Vec::new(),
      created_at: Utc::now(),
    }
  }

  pub fn item(&self, book_id: Uuid) -> Option<&CartItem> {
    self.items.iter().find(|item| item.book_id == book_id)
  }

  pub fn contains(&self, book_id: Uuid) -> bool {
    self.item(book_id).is_some()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Total number of copies across all lines.
  pub fn item_count(&self) -> u64 {
    self.items.iter().map(|item| u64::from(item.quantity)).sum()
  }

  pub fn calculate_total(&self) -> Money {
    self.items.iter().map(|item| item.total_price).sum()
  }

  pub fn lines(&self) -> Vec<CartLine> {
    self
      .items
      .iter()
      .map(|item| CartLine {
        book_id: item.book_id,
        quantity: item.quantity,
      })
      .collect()
  }

  /// Adds `quantity` copies of `book`, creating the line if needed.
  pub fn add_item(&mut self, book: &Book, quantity: u32) -> Result<&CartItem> {
    ensure_positive(quantity)?;
    let cart_id = self.id;
    let idx = self.apply(|items| upsert(items, cart_id, book, quantity))?;
    Ok(&self.items[idx])
  }

  /// Applies `action` to the line for `book`. Fails with `NotFound` when the
  /// book is not in the cart.
  pub fn update_quantity(&mut self, book: &Book, action: QuantityAction) -> Result<&CartItem> {
    let idx = self
      .position(book.id)
      .ok_or_else(|| BookstoreError::not_found("cart item", book.id))?;

    self.apply(|items| {
      let item = &mut items[idx];
      let quantity = match action {
        QuantityAction::Increase => item.quantity.checked_add(1).ok_or_else(too_large)?,
        QuantityAction::Decrease if item.quantity > 1 => item.quantity - 1,
        QuantityAction::Decrease => item.quantity,
      };
      item.total_price = line_total(book, quantity)?;
      item.quantity = quantity;
      Ok(())
    })?;
    Ok(&self.items[idx])
  }

  /// Removes the line for `book_id`, returning it if it was present.
  pub fn remove_item(&mut self, book_id: Uuid) -> Option<CartItem> {
    let idx = self.position(book_id)?;
    let removed = self.items.remove(idx);
    self.total_price = self.calculate_total();
    Some(removed)
  }

  /// Folds externally supplied `(book, quantity)` pairs into the cart.
  ///
  /// Quantities add to existing lines; every touched line is re-priced from
  /// the book's current price. A rejected merge (zero quantity, a line or
  /// total that would not fit) leaves the cart untouched.
  pub fn merge_quantities<'a, I>(&mut self, incoming: I) -> Result<()>
  where
    I: IntoIterator<Item = (&'a Book, u32)>,
  {
    let incoming: Vec<(&Book, u32)> = incoming.into_iter().collect();
    for (_, quantity) in &incoming {
      ensure_positive(*quantity)?;
    }
    let cart_id = self.id;
    self.apply(|items| {
      for (book, quantity) in incoming {
        upsert(items, cart_id, book, quantity)?;
      }
      Ok(())
    })
  }

  fn position(&self, book_id: Uuid) -> Option<usize> {
    self.items.iter().position(|item| item.book_id == book_id)
  }

  /// Runs `change` on a copy of the lines and commits it only if it succeeds
  /// and the new total fits.
  fn apply<T, F>(&mut self, change: F) -> Result<T>
  where
    F: FnOnce(&mut Vec<CartItem>) -> Result<T>,
  {
    let mut items = self.items.clone();
    let out = change(&mut items)?;
    let total = Money::checked_sum(items.iter().map(|item| item.total_price)).ok_or_else(too_large)?;
    self.items = items;
    self.total_price = total;
    Ok(out)
  }
}

fn upsert(items: &mut Vec<CartItem>, cart_id: Uuid, book: &Book, quantity: u32) -> Result<usize> {
  match items.iter().position(|item| item.book_id == book.id) {
    Some(idx) => {
      let item = &mut items[idx];
      let merged = item.quantity.checked_add(quantity).ok_or_else(too_large)?;
      item.total_price = line_total(book, merged)?;
      item.quantity = merged;
      Ok(idx)
    }
    None => {
      items.push(CartItem {
        id: Uuid::new_v4(),
        cart_id,
        book_id: book.id,
        quantity,
        total_price: line_total(book, quantity)?,
        added_at: Utc::now(),
      });
      Ok(items.len() - 1)
    }
  }
}

fn line_total(book: &Book, quantity: u32) -> Result<Money> {
  if quantity > MAX_LINE_QUANTITY {
    return Err(too_large());
  }
  book.price.checked_mul(quantity).ok_or_else(too_large)
}

fn too_large() -> BookstoreError {
  BookstoreError::Validation(QUANTITY_TOO_LARGE.to_string())
}

fn ensure_positive(quantity: u32) -> Result<()> {
  if quantity == 0 {
    return Err(BookstoreError::Validation("Quantity must be a positive number.".to_string()));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::NewBook;

  fn book(title: &str, cents: i64) -> Book {
    NewBook {
      title: title.to_string(),
      author: "Author".to_string(),
      genre: "Fiction".to_string(),
      price: Money::from_cents(cents),
      cover_image: None,
    }
    .into_book()
  }

  fn assert_total_matches(cart: &Cart) {
    let expected: Money = cart.items.iter().map(|i| i.total_price).sum();
    assert_eq!(cart.total_price, expected);
  }

  #[test]
  fn repeated_adds_accumulate_quantity_and_total() {
    let a = book("A", 1000);
    let mut cart = Cart::new(None);

    cart.add_item(&a, 1).unwrap();
    assert_eq!(cart.total_price, Money::from_cents(1000));

    let item = cart.add_item(&a, 2).unwrap();
    assert_eq!(item.quantity, 3);
    assert_eq!(item.total_price, Money::from_cents(3000));
    assert_eq!(cart.total_price, Money::from_cents(3000));
    assert_eq!(cart.items.len(), 1);
  }

  #[test]
  fn total_tracks_every_add() {
    let a = book("A", 1999);
    let b = book("B", 550);
    let mut cart = Cart::new(None);
    for (title, q) in [(&a, 1), (&b, 3), (&a, 2), (&b, 1)] {
      cart.add_item(title, q).unwrap();
      assert_total_matches(&cart);
    }
    assert_eq!(cart.total_price, Money::from_cents(1999 * 3 + 550 * 4));
  }

  #[test]
  fn add_rejects_zero_quantity() {
    let a = book("A", 100);
    let mut cart = Cart::new(None);
    assert!(matches!(cart.add_item(&a, 0), Err(BookstoreError::Validation(_))));
    assert!(cart.is_empty());
  }

  #[test]
  fn decrease_floors_at_one() {
    let a = book("A", 500);
    let mut cart = Cart::new(None);
    cart.add_item(&a, 2).unwrap();

    cart.update_quantity(&a, QuantityAction::Decrease).unwrap();
    let item = cart.update_quantity(&a, QuantityAction::Decrease).unwrap();
    assert_eq!(item.quantity, 1);
    assert_eq!(item.total_price, Money::from_cents(500));
    assert_eq!(cart.total_price, Money::from_cents(500));
  }

  #[test]
  fn increase_reprices_the_line() {
    let a = book("A", 500);
    let mut cart = Cart::new(None);
    cart.add_item(&a, 1).unwrap();
    let item = cart.update_quantity(&a, QuantityAction::Increase).unwrap();
    assert_eq!(item.quantity, 2);
    assert_eq!(cart.total_price, Money::from_cents(1000));
  }

  #[test]
  fn update_of_missing_line_is_not_found() {
    let a = book("A", 500);
    let mut cart = Cart::new(None);
    let err = cart.update_quantity(&a, QuantityAction::Increase).unwrap_err();
    assert!(matches!(err, BookstoreError::NotFound { .. }));
  }

  #[test]
  fn remove_drops_line_and_total() {
    let a = book("A", 500);
    let b = book("B", 700);
    let mut cart = Cart::new(None);
    cart.add_item(&a, 1).unwrap();
    cart.add_item(&b, 2).unwrap();

    let removed = cart.remove_item(a.id).unwrap();
    assert_eq!(removed.book_id, a.id);
    assert!(!cart.contains(a.id));
    assert_eq!(cart.total_price, Money::from_cents(1400));
    assert!(cart.remove_item(a.id).is_none());
  }

  #[test]
  fn merge_total_is_order_independent() {
    let a = book("A", 1000);
    let b = book("B", 250);
    let c = book("C", 333);
    let pairs = vec![(&a, 2), (&b, 1), (&c, 4), (&a, 1)];

    let mut forward = Cart::new(None);
    forward.add_item(&b, 1).unwrap();
    forward.merge_quantities(pairs.clone()).unwrap();

    let mut reversed = Cart::new(None);
    reversed.add_item(&b, 1).unwrap();
    reversed.merge_quantities(pairs.into_iter().rev()).unwrap();

    assert_eq!(forward.total_price, reversed.total_price);
    assert_eq!(forward.item(a.id).unwrap().quantity, 3);
    assert_eq!(forward.item(b.id).unwrap().quantity, 2);
    assert_total_matches(&forward);
  }

  #[test]
  fn merge_with_zero_quantity_changes_nothing() {
    let a = book("A", 1000);
    let b = book("B", 250);
    let mut cart = Cart::new(None);
    cart.add_item(&a, 1).unwrap();
    let before = cart.clone();

    let result = cart.merge_quantities(vec![(&a, 2), (&b, 0)]);
    assert!(result.is_err());
    assert_eq!(cart, before);
  }

  #[test]
  fn quantity_action_parses_form_values() {
    assert_eq!("increase".parse::<QuantityAction>().unwrap(), QuantityAction::Increase);
    assert_eq!("decrease".parse::<QuantityAction>().unwrap(), QuantityAction::Decrease);
    assert!("double".parse::<QuantityAction>().is_err());
  }

  #[test]
  fn oversized_quantities_are_rejected_without_changes() {
    let a = book("A", 500);
    let mut cart = Cart::new(None);
    cart.add_item(&a, 1).unwrap();
    let before = cart.clone();

    let err = cart.add_item(&a, MAX_LINE_QUANTITY).unwrap_err();
    assert!(matches!(err, BookstoreError::Validation(ref m) if m == "Quantity is too large."));
    assert!(cart.merge_quantities(vec![(&a, u32::MAX)]).is_err());
    assert_eq!(cart, before);

    let mut full = Cart::new(None);
    full.add_item(&a, MAX_LINE_QUANTITY).unwrap();
    assert!(full.update_quantity(&a, QuantityAction::Increase).is_err());
    assert_eq!(full.item(a.id).unwrap().quantity, MAX_LINE_QUANTITY);
    assert_total_matches(&full);
  }

  #[test]
  fn line_total_overflow_is_rejected() {
    let pricey = book("Pricey", 9_999_999_999);
    let mut cart = Cart::new(None);
    let err = cart.merge_quantities(vec![(&pricey, 1_000_000_000)]).unwrap_err();
    assert!(matches!(err, BookstoreError::Validation(_)));
    assert!(cart.is_empty());
    assert_eq!(cart.total_price, Money::ZERO);
  }
}
