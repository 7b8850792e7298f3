// app/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore::{Bookstore, BookstoreError, Cart, CartLine};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::{login_redirect, WebSession};

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityForm {
  #[serde(default)]
  pub action: String,
}

/// Body of `/sync_cart/`: a client-held cart. A missing `cart` key is an empty cart.
#[derive(Deserialize, Debug)]
pub struct SyncCartPayload {
  #[serde(default)]
  pub cart: Vec<CartLine>,
}

/// The cart joined with its books, as shown on the cart and checkout pages.
pub(crate) async fn cart_view(bookstore: &Bookstore, cart: Option<&Cart>) -> Result<serde_json::Value, AppError> {
  let Some(cart) = cart else {
    return Ok(serde_json::Value::Null);
  };
  let entries = bookstore.describe_cart(cart).await?;
  Ok(json!({
    "id": cart.id,
    "items": entries,
    "count": cart.item_count(),
    "total_price": cart.total_price,
  }))
}

// --- Handler Implementations ---

#[instrument(name = "handler::cart", skip(app_state, session))]
pub async fn cart_page_handler(
  app_state: web::Data<AppState>,
  session: WebSession,
) -> Result<HttpResponse, AppError> {
  if !session.identity.is_authenticated() {
    return Ok(login_redirect());
  }
  let cart = app_state.bookstore.resolve_cart(&session.identity, &session.state).await?;
  let total_price = cart.as_ref().map(|c| c.calculate_total()).unwrap_or_default();
  let view = cart_view(&app_state.bookstore, cart.as_ref()).await?;
  session
    .render(&app_state, "cart", json!({ "cart": view, "total_price": total_price }))
    .await
}

/// Open to anonymous callers; answers `{count: 0}` when there is no cart.
#[instrument(name = "handler::get_cart_count", skip(app_state, session))]
pub async fn cart_count_handler(
  app_state: web::Data<AppState>,
  session: WebSession,
) -> Result<HttpResponse, AppError> {
  let count = app_state.bookstore.cart_count(&session.identity, &session.state).await?;
  Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

#[instrument(name = "handler::get_cart_items", skip(app_state, session))]
pub async fn cart_items_handler(
  app_state: web::Data<AppState>,
  session: WebSession,
) -> Result<HttpResponse, AppError> {
  if !session.identity.is_authenticated() {
    return Ok(login_redirect());
  }
  let items: Vec<serde_json::Value> = app_state
    .bookstore
    .cart_items(&session.identity, &session.state)
    .await?
    .into_iter()
    .map(|item| {
      json!({
        "book_id": item.book_id,
        "quantity": item.quantity,
        "price": item.total_price,
      })
    })
    .collect();
  Ok(HttpResponse::Ok().json(json!({ "cart": items })))
}

#[instrument(name = "handler::add_to_cart", skip(app_state, session), fields(book_id = %path))]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !session.identity.is_authenticated() {
    return Ok(login_redirect());
  }
  let book_id = path.into_inner();

  let cart = app_state
    .bookstore
    .add_to_cart(&session.identity, &mut session.state, book_id)
    .await?;
  info!(cart_id = %cart.id, total = %cart.total_price, "Add to cart successful.");
  session.redirect(&app_state, "/book_list/").await
}

#[instrument(name = "handler::remove_from_cart", skip(app_state, session), fields(book_id = %path))]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !session.identity.is_authenticated() {
    return Ok(login_redirect());
  }
  let book_id = path.into_inner();

  app_state
    .bookstore
    .remove_from_cart(&session.identity, &mut session.state, book_id)
    .await?;
  session.redirect(&app_state, "/cart/").await
}

#[instrument(
  name = "handler::update_quantity",
  skip(app_state, session, form),
  fields(book_id = %path, action = %form.action)
)]
pub async fn update_quantity_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
  path: web::Path<Uuid>,
  form: web::Form<UpdateQuantityForm>,
) -> Result<HttpResponse, AppError> {
  if !session.identity.is_authenticated() {
    return Ok(login_redirect());
  }
  let book_id = path.into_inner();

  app_state
    .bookstore
    .update_quantity(&session.identity, &mut session.state, book_id, &form.action)
    .await?;
  session.redirect(&app_state, "/cart/").await
}

/// Non-POST requests to `/update-quantity/{id}/` change nothing and go back to the cart.
pub async fn update_quantity_fallback_handler(session: WebSession) -> HttpResponse {
  if !session.identity.is_authenticated() {
    return login_redirect();
  }
  crate::web::session::see_other("/cart/")
}

/// Merges a client-held cart into the caller's cart. The whole payload is
/// checked before anything is written; failures answer 400 with a fixed message.
#[instrument(name = "handler::sync_cart", skip(app_state, session, body), fields(body_len = body.len()))]
pub async fn sync_cart_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let payload: SyncCartPayload = serde_json::from_slice(&body).map_err(|e| {
    warn!(error = %e, "Malformed cart sync payload.");
    AppError::InvalidPayload(e.to_string())
  })?;

  match app_state
    .bookstore
    .sync_cart(&session.identity, &mut session.state, payload.cart)
    .await
  {
    Ok(cart) => {
      info!(cart_id = %cart.id, total = %cart.total_price, "Cart sync successful.");
      session
        .respond(&app_state, HttpResponse::Ok().json(json!({ "success": true })))
        .await
    }
    Err(BookstoreError::Validation(message)) => {
      warn!(reason = %message, "Cart sync rejected.");
      Err(AppError::Validation(message))
    }
    Err(err) => Err(err.into()),
  }
}

pub async fn sync_cart_method_not_allowed_handler() -> Result<HttpResponse, AppError> {
  Err(AppError::MethodNotAllowed)
}
