// core/src/forms.rs

//! Submitted forms and the field rules applied before anything is stored.

use serde::Deserialize;

use crate::error::{BookstoreError, Result};
use crate::models::{NewBook, PaymentMethod, ShippingDetails};
use crate::money::Money;

const USERNAME_MAX: usize = 100;
const FULL_NAME_MAX: usize = 100;
const TITLE_MAX: usize = 100;
const AUTHOR_MAX: usize = 50;
const GENRE_MAX: usize = 50;
const COVER_IMAGE_MAX: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupForm {
  pub username: String,
  pub email: String,
  pub password: String,
  pub password_confirm: String,
}

impl SignupForm {
  pub fn validate(&self) -> Result<()> {
    required("Username", &self.username, USERNAME_MAX)?;
    validate_email(&self.email)?;
    if self.password.is_empty() {
      return Err(invalid("Password is required."));
    }
    if self.password != self.password_confirm {
      return Err(invalid("Passwords do not match."));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookForm {
  pub title: String,
  pub author: String,
  pub genre: String,
  pub price: String,
  #[serde(default)]
  pub cover_image: Option<String>,
}

impl BookForm {
  pub fn into_new_book(self) -> Result<NewBook> {
    let title = required("Title", &self.title, TITLE_MAX)?;
    let author = required("Author", &self.author, AUTHOR_MAX)?;
    let genre = required("Genre", &self.genre, GENRE_MAX)?;
    let price: Money = self.price.parse()?;
    let cover_image = match self.cover_image.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(reference) if reference.chars().count() > COVER_IMAGE_MAX => {
        return Err(invalid(format!(
          "Cover image reference must be at most {} characters.",
          COVER_IMAGE_MAX
        )))
      }
      Some(reference) => Some(reference.to_string()),
    };

    Ok(NewBook {
      title,
      author,
      genre,
      price,
      cover_image,
    })
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutForm {
  pub full_name: String,
  pub email: String,
  pub address: String,
  pub payment_method: String,
}

impl CheckoutForm {
  pub fn into_shipping(self) -> Result<ShippingDetails> {
    let full_name = required("Full name", &self.full_name, FULL_NAME_MAX)?;
    validate_email(&self.email)?;
    let address = self.address.trim();
    if address.is_empty() {
      return Err(invalid("Address is required."));
    }
    let payment_method = PaymentMethod::parse(&self.payment_method).ok_or_else(|| {
      invalid(format!(
        "Select a valid payment method. {} is not one of the available choices.",
        self.payment_method
      ))
    })?;

    Ok(ShippingDetails {
      full_name,
      email: self.email.trim().to_string(),
      address: address.to_string(),
      payment_method,
    })
  }
}

fn invalid(message: impl Into<String>) -> BookstoreError {
  BookstoreError::Validation(message.into())
}

fn required(field: &str, value: &str, max_len: usize) -> Result<String> {
  let value = value.trim();
  if value.is_empty() {
    return Err(invalid(format!("{} is required.", field)));
  }
  if value.chars().count() > max_len {
    return Err(invalid(format!("{} must be at most {} characters.", field, max_len)));
  }
  Ok(value.to_string())
}

fn validate_email(email: &str) -> Result<()> {
  let email = email.trim();
  let valid = match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
    }
    None => false,
  };
  if !valid {
    return Err(invalid("Enter a valid email address."));
  }
  Ok(())
}
