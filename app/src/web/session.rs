// app/src/web/session.rs

//! Cookie-keyed server-side sessions.
//!
//! The cookie carries only an opaque token. The session itself lives in the
//! store and is handed to every core call explicitly.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use bookstore::{Identity, Notice, SessionState, User};
use futures_util::future::LocalBoxFuture;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// The caller's session plus the identity it resolves to.
#[derive(Debug)]
pub struct WebSession {
  pub state: SessionState,
  pub identity: Identity,
  /// The session was loaded from the store rather than started for this request.
  stored: bool,
}

impl FromRequest for WebSession {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let app_state = req.app_data::<web::Data<AppState>>().cloned();
    let token = app_state.as_ref().and_then(|app_state| {
      req
        .cookie(&app_state.config.session_cookie_name)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    });

    Box::pin(async move {
      let app_state =
        app_state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
      let state = app_state.bookstore.open_session(token).await?;
      let stored = token == Some(state.token);
      let identity = app_state.bookstore.identity(&state).await?;
      debug!(token = %state.token, stored, user_id = ?identity.user_id(), "Session loaded.");
      Ok(WebSession { state, identity, stored })
    })
  }
}

impl WebSession {
  pub fn user(&self) -> Option<&User> {
    self.identity.user()
  }

  pub fn take_notices(&mut self) -> Vec<Notice> {
    self.state.take_notices()
  }

  /// Re-reads the identity after a login or logout changed `state.user_id`.
  pub async fn refresh_identity(&mut self, app_state: &AppState) -> Result<(), AppError> {
    self.identity = app_state.bookstore.identity(&self.state).await?;
    Ok(())
  }

  /// Stores the session and attaches its cookie to `response`. A session
  /// with nothing in it is not stored; if it was stored before, its row is
  /// deleted and the cookie removed.
  pub async fn respond(mut self, app_state: &AppState, mut response: HttpResponse) -> Result<HttpResponse, AppError> {
    if !self.stored && !self.state.carries_state() {
      return Ok(response);
    }
    let stored = app_state.bookstore.persist_session(&mut self.state).await?;

    let cookie = Cookie::build(app_state.config.session_cookie_name.clone(), self.state.token.to_string())
      .path("/")
      .http_only(true)
      .same_site(SameSite::Lax)
      .secure(app_state.config.session_cookie_secure)
      .finish();
    let attached = if stored {
      response.add_cookie(&cookie)
    } else {
      response.add_removal_cookie(&cookie)
    };
    attached.map_err(|e| AppError::Internal(format!("Failed to set session cookie: {}", e)))?;
    Ok(response)
  }

  /// Answers with a JSON page document: `body` plus the page name, the signed-in
  /// username, and the notices queued for this session (which are drained).
  pub async fn render(
    mut self,
    app_state: &AppState,
    page: &str,
    mut body: serde_json::Value,
  ) -> Result<HttpResponse, AppError> {
    let notices = self.take_notices();
    if let Some(fields) = body.as_object_mut() {
      fields.insert("page".to_string(), json!(page));
      fields.insert("user".to_string(), json!(self.user().map(|u| u.username.as_str())));
      fields.insert("notices".to_string(), json!(notices));
    }
    self.respond(app_state, HttpResponse::Ok().json(body)).await
  }

  /// Stores the session and answers with a 303 to `location`.
  pub async fn redirect(self, app_state: &AppState, location: &str) -> Result<HttpResponse, AppError> {
    self.respond(app_state, see_other(location)).await
  }
}

pub fn see_other(location: &str) -> HttpResponse {
  HttpResponse::SeeOther()
    .insert_header((header::LOCATION, location))
    .finish()
}

/// Response for an anonymous caller on a login-required route.
pub fn login_redirect() -> HttpResponse {
  see_other("/")
}
