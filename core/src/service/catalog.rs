// core/src/service/catalog.rs

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{BookstoreError, Result};
use crate::forms::BookForm;
use crate::models::{Book, Identity, SessionState};
use crate::service::Bookstore;

/// Result of a staff-only catalog change.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogOutcome<T> {
  Applied(T),
  /// The caller is not staff; nothing was changed and nothing is reported.
  Denied,
}

impl<T> CatalogOutcome<T> {
  pub fn applied(self) -> Option<T> {
    match self {
      CatalogOutcome::Applied(value) => Some(value),
      CatalogOutcome::Denied => None,
    }
  }

  pub fn is_denied(&self) -> bool {
    matches!(self, CatalogOutcome::Denied)
  }
}

impl Bookstore {
  /// Books whose genre contains `genre` (case-insensitive). Blank lists everything.
  pub async fn list_books(&self, genre: &str) -> Result<Vec<Book>> {
    self.store.list_books(genre.trim()).await
  }

  pub async fn list_genres(&self) -> Result<Vec<String>> {
    self.store.list_genres().await
  }

  pub async fn get_book(&self, book_id: Uuid) -> Result<Book> {
    self.book(book_id).await
  }

  #[instrument(name = "bookstore::add_book", skip(self, identity, form), fields(user_id = ?identity.user_id()), err(Display))]
  pub async fn add_book(&self, identity: &Identity, form: BookForm) -> Result<CatalogOutcome<Book>> {
    if !identity.is_staff() {
      warn!("Non-staff identity tried to add a book.");
      return Ok(CatalogOutcome::Denied);
    }
    let book = self.store.insert_book(form.into_new_book()?).await?;
    info!(book_id = %book.id, title = %book.title, "Book added to catalog.");
    Ok(CatalogOutcome::Applied(book))
  }

  /// Deletes a book along with every cart line that holds it.
  #[instrument(name = "bookstore::delete_book", skip(self, identity, session), fields(user_id = ?identity.user_id()), err(Display))]
  pub async fn delete_book(
    &self,
    identity: &Identity,
    session: &mut SessionState,
    book_id: Uuid,
  ) -> Result<CatalogOutcome<Book>> {
    if !identity.is_staff() {
      warn!("Non-staff identity tried to delete a book.");
      return Ok(CatalogOutcome::Denied);
    }
    let book = self
      .store
      .delete_book(book_id)
      .await?
      .ok_or_else(|| BookstoreError::not_found("book", book_id))?;

    session.success(format!("\"{}\" deleted successfully.", book.title));
    info!(title = %book.title, "Book deleted from catalog.");
    Ok(CatalogOutcome::Applied(book))
  }
}
