// app/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore::{BookstoreError, CheckoutForm};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::cart_handlers::cart_view;
use crate::web::session::{login_redirect, WebSession};

#[instrument(name = "handler::checkout_page", skip(app_state, session))]
pub async fn checkout_page_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
) -> Result<HttpResponse, AppError> {
  if !session.identity.is_authenticated() {
    return Ok(login_redirect());
  }
  let Some(cart) = app_state.bookstore.resolve_cart(&session.identity, &session.state).await? else {
    session.state.error("Cart not found.");
    return session.redirect(&app_state, "/cart/").await;
  };

  let view = cart_view(&app_state.bookstore, Some(&cart)).await?;
  session
    .render(&app_state, "checkout", json!({ "cart": view, "payment_methods": ["COD"] }))
    .await
}

/// Places the order and redirects to `/order_success/`. Field errors redisplay
/// the checkout page; an empty or missing cart goes back to `/cart/`.
#[instrument(name = "handler::checkout", skip(app_state, session, form))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
  form: web::Form<CheckoutForm>,
) -> Result<HttpResponse, AppError> {
  if !session.identity.is_authenticated() {
    return Ok(login_redirect());
  }

  let shipping = match form.into_inner().into_shipping() {
    Ok(shipping) => shipping,
    Err(BookstoreError::Validation(message)) => {
      warn!(reason = %message, "Checkout form rejected.");
      session.state.error(message);
      let cart = app_state.bookstore.resolve_cart(&session.identity, &session.state).await?;
      let view = cart_view(&app_state.bookstore, cart.as_ref()).await?;
      return session
        .render(&app_state, "checkout", json!({ "cart": view, "payment_methods": ["COD"] }))
        .await;
    }
    Err(err) => return Err(err.into()),
  };

  match app_state
    .bookstore
    .place_order(&session.identity, &mut session.state, shipping)
    .await
  {
    Ok(order) => {
      info!(order_id = %order.id, total = %order.total_price, "Checkout successful.");
      session.redirect(&app_state, "/order_success/").await
    }
    Err(BookstoreError::Validation(message)) => {
      warn!(reason = %message, "Checkout rejected.");
      session.state.error(message);
      session.redirect(&app_state, "/cart/").await
    }
    Err(err) => Err(err.into()),
  }
}

#[instrument(name = "handler::order_confirmation_page", skip(app_state, session))]
pub async fn order_confirmation_page_handler(
  app_state: web::Data<AppState>,
  session: WebSession,
) -> Result<HttpResponse, AppError> {
  if !session.identity.is_authenticated() {
    return Ok(login_redirect());
  }
  let Some(cart) = app_state.bookstore.resolve_cart(&session.identity, &session.state).await? else {
    return session.redirect(&app_state, "/book_list/").await;
  };

  let view = cart_view(&app_state.bookstore, Some(&cart)).await?;
  session
    .render(&app_state, "order_confirmation", json!({ "cart": view, "order": null }))
    .await
}

/// Places the order and answers with the confirmation page showing it. Field
/// errors redisplay the page; an empty cart goes back to `/cart/`.
#[instrument(name = "handler::order_confirmation", skip(app_state, session, form))]
pub async fn order_confirmation_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
  form: web::Form<CheckoutForm>,
) -> Result<HttpResponse, AppError> {
  if !session.identity.is_authenticated() {
    return Ok(login_redirect());
  }
  let Some(cart) = app_state.bookstore.resolve_cart(&session.identity, &session.state).await? else {
    return session.redirect(&app_state, "/book_list/").await;
  };

  let shipping = match form.into_inner().into_shipping() {
    Ok(shipping) => shipping,
    Err(BookstoreError::Validation(message)) => {
      warn!(reason = %message, "Order confirmation form rejected.");
      session.state.error(message);
      let view = cart_view(&app_state.bookstore, Some(&cart)).await?;
      return session
        .render(&app_state, "order_confirmation", json!({ "cart": view, "order": null }))
        .await;
    }
    Err(err) => return Err(err.into()),
  };

  match app_state
    .bookstore
    .place_order(&session.identity, &mut session.state, shipping)
    .await
  {
    Ok(order) => {
      info!(order_id = %order.id, "Order confirmed.");
      session
        .render(&app_state, "order_confirmation", json!({ "cart": null, "order": order }))
        .await
    }
    Err(BookstoreError::Validation(message)) => {
      warn!(reason = %message, "Order confirmation rejected.");
      session.state.error(message);
      session.redirect(&app_state, "/cart/").await
    }
    Err(err) => Err(err.into()),
  }
}

#[instrument(name = "handler::order_success", skip(app_state, session))]
pub async fn order_success_handler(
  app_state: web::Data<AppState>,
  session: WebSession,
) -> Result<HttpResponse, AppError> {
  let latest_order = match session.user() {
    Some(user) => app_state.bookstore.orders_for(user).await?.into_iter().next(),
    None => None,
  };
  session
    .render(&app_state, "order_success", json!({ "order": latest_order }))
    .await
}
