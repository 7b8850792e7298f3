// core/src/service/seed.rs

//! Startup seeding: a staff account and a small sample catalog.

use tracing::{info, instrument};

use crate::auth::hash_password;
use crate::error::Result;
use crate::models::{NewBook, NewUser};
use crate::money::Money;
use crate::service::Bookstore;

const SAMPLE_BOOKS: &[(&str, &str, &str, i64)] = &[
  ("Dune", "Frank Herbert", "Science Fiction", 1099),
  ("The Left Hand of Darkness", "Ursula K. Le Guin", "Science Fiction", 950),
  ("Pride and Prejudice", "Jane Austen", "Classics", 599),
  ("Middlemarch", "George Eliot", "Classics", 875),
  ("The Hobbit", "J. R. R. Tolkien", "Fantasy", 1250),
  ("Gödel, Escher, Bach", "Douglas Hofstadter", "Non-Fiction", 2200),
];

#[derive(Debug, Clone)]
pub struct SeedConfig {
  pub staff_username: String,
  pub staff_email: String,
  pub staff_password: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub staff_created: bool,
  pub books_added: usize,
}

impl Bookstore {
  /// Creates the staff account if its username is free and fills an empty
  /// catalog with sample books. Running it twice changes nothing.
  #[instrument(name = "bookstore::seed", skip(self, config), fields(staff = %config.staff_username), err(Display))]
  pub async fn seed(&self, config: &SeedConfig) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if !self.store.username_exists(&config.staff_username).await? {
      let password_hash = hash_password(&config.staff_password)?;
      self
        .store
        .insert_user(NewUser {
          username: config.staff_username.clone(),
          email: config.staff_email.clone(),
          password_hash,
          is_staff: true,
        })
        .await?;
      report.staff_created = true;
    }

    if self.store.count_books().await? == 0 {
      for (title, author, genre, cents) in SAMPLE_BOOKS {
        self
          .store
          .insert_book(NewBook {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            price: Money::from_cents(*cents),
            cover_image: None,
          })
          .await?;
        report.books_added += 1;
      }
    }

    info!(staff_created = report.staff_created, books_added = report.books_added, "Seeding finished.");
    Ok(report)
  }
}
