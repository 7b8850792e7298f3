// app/src/web/handlers/catalog_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore::{BookForm, BookstoreError, CatalogOutcome};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::{login_redirect, WebSession};

#[derive(Deserialize, Debug)]
pub struct BookListQuery {
  #[serde(default)]
  pub genre: String,
}

#[instrument(name = "handler::book_list", skip(app_state, session), fields(genre = %query.genre))]
pub async fn book_list_handler(
  app_state: web::Data<AppState>,
  session: WebSession,
  query: web::Query<BookListQuery>,
) -> Result<HttpResponse, AppError> {
  let Some(user) = session.user() else {
    return Ok(login_redirect());
  };
  let is_staff = user.is_staff;

  let books = app_state.bookstore.list_books(&query.genre).await?;
  let genres = app_state.bookstore.list_genres().await?;
  session
    .render(
      &app_state,
      "book_list",
      json!({
        "books": books,
        "genres": genres,
        "genre": query.genre,
        "is_staff": is_staff,
      }),
    )
    .await
}

#[instrument(name = "handler::add_book_page", skip(app_state, session))]
pub async fn add_book_page_handler(
  app_state: web::Data<AppState>,
  session: WebSession,
) -> Result<HttpResponse, AppError> {
  match session.user().map(|user| user.is_staff) {
    None => Ok(login_redirect()),
    Some(false) => session.redirect(&app_state, "/book_list/").await,
    Some(true) => session.render(&app_state, "add_book", json!({})).await,
  }
}

#[instrument(name = "handler::add_book", skip(app_state, session, form), fields(title = %form.title))]
pub async fn add_book_handler(
  app_state: web::Data<AppState>,
  mut session: WebSession,
  form: web::Form<BookForm>,
) -> Result<HttpResponse, AppError> {
  if !session.identity.is_authenticated() {
    return Ok(login_redirect());
  }

  match app_state.bookstore.add_book(&session.identity, form.into_inner()).await {
    Ok(CatalogOutcome::Applied(book)) => {
      info!(book_id = %book.id, "Book created.");
      session.redirect(&app_state, "/book_list/").await
    }
    Ok(CatalogOutcome::Denied) => session.redirect(&app_state, "/book_list/").await,
    Err(BookstoreError::Validation(message)) => {
      warn!(reason = %message, "Book form rejected.");
      session.state.error(message);
      session.render(&app_state, "add_book", json!({})).await
    }
    Err(err) => Err(err.into()),
  }
}

#[instrument(name = "handler::delete_book", skip(app_state, session), fields(book_id = %path))]
pub async fn delete_book_handler(
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
    .delete_book(&session.identity, &mut session.state, book_id)
    .await?;
  session.redirect(&app_state, "/book_list/").await
}
