// app/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore::{BookstoreError, LoginForm, SignupForm};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::WebSession;

#[instrument(name = "handler::login_page", skip(app_state, session))]
pub async fn login_page_handler(
  app_state: web::Data<AppState>,
  session: WebSession,
) -> Result<HttpResponse, AppError> {
  let authenticated = session.identity.is_authenticated();
  session
    .render(&app_state, "login", json!({ "authenticated": authenticated }))
    .await
}

#[instrument(name = "handler::login", skip(app_state, session, form), fields(username = %form.username))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
  form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
  let LoginForm { username, password } = form.into_inner();

  match app_state.bookstore.login(&mut session.state, &username, &password).await {
    Ok(user) => {
      info!(user_id = %user.id, "Login successful.");
      session.redirect(&app_state, "/book_list/").await
    }
    Err(BookstoreError::Auth(message)) => {
      warn!(reason = %message, "Login rejected.");
      session.state.error(message);
      session
        .render(&app_state, "login", json!({ "authenticated": false }))
        .await
    }
    Err(err) => Err(err.into()),
  }
}

#[instrument(name = "handler::signup_page", skip(app_state, session))]
pub async fn signup_page_handler(
  app_state: web::Data<AppState>,
  session: WebSession,
) -> Result<HttpResponse, AppError> {
  session.render(&app_state, "signup", json!({})).await
}

#[instrument(name = "handler::signup", skip(app_state, session, form), fields(username = %form.username))]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
  form: web::Form<SignupForm>,
) -> Result<HttpResponse, AppError> {
  match app_state.bookstore.signup(form.into_inner()).await {
    Ok(user) => {
      info!(user_id = %user.id, "Signup successful.");
      session
        .state
        .success("Account created successfully. You can now log in.");
      session.redirect(&app_state, "/").await
    }
    Err(BookstoreError::Validation(message)) | Err(BookstoreError::Conflict(message)) => {
      warn!(reason = %message, "Signup rejected.");
      session.state.error(message);
      session.render(&app_state, "signup", json!({})).await
    }
    Err(err) => Err(err.into()),
  }
}

#[instrument(name = "handler::logout", skip(app_state, session))]
pub async fn logout_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
) -> Result<HttpResponse, AppError> {
  app_state.bookstore.logout(&mut session.state).await?;
  session.refresh_identity(&app_state).await?;
  session.redirect(&app_state, "/").await
}
