// core/tests/order_tests.rs
mod common;

use bookstore::{BookstoreError, Identity, Money, SessionState, Store};
use common::*;

#[tokio::test]
async fn checkout_snapshots_total_and_deletes_the_cart() {
  let fx = fixture();
  let a = fx.book("A", "History", 850).await;
  let user = fx.user("reader").await;
  let (identity, mut session) = fx.signed_in(&user);
  for _ in 0..5 {
    fx.bookstore.add_to_cart(&identity, &mut session, a.id).await.unwrap();
  }
  let cart_id = fx.store.find_cart_by_owner(user.id).await.unwrap().unwrap().id;

  let order = fx.bookstore.place_order(&identity, &mut session, shipping()).await.unwrap();
  assert_eq!(order.total_price, Money::from_cents(4250));
  assert_eq!(order.cart_id, cart_id);
  assert_eq!(order.owner_id, Some(user.id));
  assert_eq!(order.lines.len(), 1);
  assert_eq!(order.lines[0].title, "A");
  assert_eq!(order.lines[0].quantity, 5);
  assert_eq!(order.lines[0].unit_price, Money::from_cents(850));

  assert!(fx.store.find_cart_by_owner(user.id).await.unwrap().is_none());
  assert!(fx.store.find_cart(cart_id).await.unwrap().is_none());
  assert_eq!(fx.bookstore.order(order.id).await.unwrap(), order);
  assert_eq!(fx.bookstore.orders_for(&user).await.unwrap(), vec![order]);
  assert_eq!(session.notices.last().unwrap().message, "Order placed successfully!");
}

#[tokio::test]
async fn order_keeps_its_lines_after_the_book_is_deleted() {
  let fx = fixture();
  let a = fx.book("A", "History", 1200).await;
  let staff = fx.staff("clerk").await;
  let user = fx.user("reader").await;
  let (identity, mut session) = fx.signed_in(&user);
  fx.bookstore.add_to_cart(&identity, &mut session, a.id).await.unwrap();
  let order = fx.bookstore.place_order(&identity, &mut session, shipping()).await.unwrap();

  let (staff_identity, mut staff_session) = fx.signed_in(&staff);
  fx.bookstore.delete_book(&staff_identity, &mut staff_session, a.id).await.unwrap();

  let stored = fx.bookstore.order(order.id).await.unwrap();
  assert_eq!(stored.lines[0].title, "A");
  assert_eq!(stored.total_price, Money::from_cents(1200));
}

#[tokio::test]
async fn anonymous_checkout_clears_the_session_cart() {
  let fx = fixture();
  let a = fx.book("A", "History", 300).await;
  let mut session = SessionState::new();
  fx.bookstore.add_to_cart(&Identity::Anonymous, &mut session, a.id).await.unwrap();
  assert!(session.cart_id.is_some());

  let order = fx.bookstore.place_order(&Identity::Anonymous, &mut session, shipping()).await.unwrap();
  assert_eq!(order.owner_id, None);
  assert_eq!(session.cart_id, None);
  assert_eq!(fx.store.cart_count(), 0);
}

#[tokio::test]
async fn checkout_of_an_empty_cart_is_rejected() {
  let fx = fixture();
  let user = fx.user("reader").await;
  let (identity, mut session) = fx.signed_in(&user);

  let err = fx.bookstore.place_order(&identity, &mut session, shipping()).await.unwrap_err();
  assert_eq!(err.to_string(), "Your cart is empty.");
  assert!(fx.bookstore.orders_for(&user).await.unwrap().is_empty());
  // The empty cart is still there.
  assert!(fx.store.find_cart_by_owner(user.id).await.unwrap().is_some());
}

#[tokio::test]
async fn checkout_without_any_cart_is_rejected() {
  let fx = fixture();
  let mut session = SessionState::new();
  let err = fx
    .bookstore
    .place_order(&Identity::Anonymous, &mut session, shipping())
    .await
    .unwrap_err();
  assert!(matches!(err, BookstoreError::Validation(ref m) if m == "Cart not found."));
}
