// core/src/service/accounts.rs

use tracing::{info, instrument, warn};

use crate::auth::{hash_password, verify_password};
use crate::error::{BookstoreError, Result};
use crate::forms::SignupForm;
use crate::models::{Identity, NewUser, SessionState, User};
use crate::service::Bookstore;

const INVALID_CREDENTIALS: &str = "Invalid username or password.";

impl Bookstore {
  /// Who the session belongs to. A session pointing at a missing or disabled
  /// account is treated as anonymous.
  pub async fn identity(&self, session: &SessionState) -> Result<Identity> {
    let Some(user_id) = session.user_id else {
      return Ok(Identity::Anonymous);
    };
    match self.store.find_user(user_id).await? {
      Some(user) if user.is_active => Ok(Identity::User(user)),
      Some(_) => {
        warn!(%user_id, "Session belongs to a disabled account.");
        Ok(Identity::Anonymous)
      }
      None => {
        warn!(%user_id, "Session belongs to an unknown user.");
        Ok(Identity::Anonymous)
      }
    }
  }

  #[instrument(name = "bookstore::signup", skip(self, form), fields(username = %form.username), err(Display))]
  pub async fn signup(&self, form: SignupForm) -> Result<User> {
    form.validate()?;
    let username = form.username.trim();
    let email = form.email.trim();

    if self.store.username_exists(username).await? {
      return Err(BookstoreError::Validation(
        "Username already registered. Please try logging in.".to_string(),
      ));
    }
    if self.store.email_exists(email).await? {
      return Err(BookstoreError::Validation(
        "Email already registered. Please try logging in.".to_string(),
      ));
    }

    let password_hash = hash_password(&form.password)?;
    let user = self
      .store
      .insert_user(NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        is_staff: false,
      })
      .await?;
    info!(user_id = %user.id, "User registered.");
    Ok(user)
  }

  #[instrument(name = "bookstore::authenticate", skip(self, password), err(Display))]
  pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
    let user = self
      .store
      .find_user_by_username(username.trim())
      .await?
      .ok_or_else(|| BookstoreError::Auth(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&user.password_hash, password)? {
      return Err(BookstoreError::Auth(INVALID_CREDENTIALS.to_string()));
    }
    if !user.is_active {
      return Err(BookstoreError::Auth("Your account is disabled.".to_string()));
    }
    Ok(user)
  }

  /// Signs the session in and replays any cart stashed at logout into the
  /// user's persisted cart. The user's cart exists afterwards even if nothing
  /// was replayed.
  ///
  /// The session moves to a fresh token; the stored row under the old token
  /// is deleted. Stashed lines and notices carry over.
  #[instrument(name = "bookstore::login", skip(self, session, password), fields(token = %session.token), err(Display))]
  pub async fn login(&self, session: &mut SessionState, username: &str, password: &str) -> Result<User> {
    let user = self.authenticate(username, password).await?;
    let previous_token = session.rotate_token();
    self.store.delete_session(previous_token).await?;
    session.user_id = Some(user.id);

    let mut cart = self.store.find_or_create_user_cart(user.id).await?;
    let pending = std::mem::take(&mut session.pending_cart);
    if !pending.is_empty() {
      let mut replay = Vec::with_capacity(pending.len());
      for line in &pending {
        match self.store.get_book(line.book_id).await? {
          Some(book) => replay.push((book, line.quantity)),
          None => warn!(book_id = %line.book_id, "Stashed cart line refers to a deleted book, skipping."),
        }
      }
      match cart.merge_quantities(replay.iter().map(|(book, quantity)| (book, *quantity))) {
        Ok(()) => {
          self.store.save_cart(&cart).await?;
          info!(cart_id = %cart.id, lines = replay.len(), "Replayed stashed cart into user cart.");
        }
        Err(BookstoreError::Validation(message)) => {
          warn!(cart_id = %cart.id, reason = %message, "Stashed cart could not be replayed, dropping it.");
          session.error(message);
        }
        Err(err) => return Err(err),
      }
    }

    session.success("Login successful!");
    info!(user_id = %user.id, "User logged in.");
    Ok(user)
  }

  /// Signs the session out. An anonymous visitor's cart lines are stashed in
  /// the session so the next login can replay them, and the anonymous cart
  /// row is deleted.
  #[instrument(name = "bookstore::logout", skip(self, session), fields(token = %session.token), err(Display))]
  pub async fn logout(&self, session: &mut SessionState) -> Result<()> {
    let identity = self.identity(session).await?;
    let signed_out = session.user_id.is_some() || session.cart_id.is_some();
    if let Some(cart_id) = session.cart_id.take() {
      let anonymous_cart = self.store.find_cart(cart_id).await?.filter(|cart| cart.owner_id.is_none());
      if let Some(cart) = anonymous_cart {
        if !identity.is_authenticated() {
          session.pending_cart = cart.lines();
          info!(cart_id = %cart.id, lines = session.pending_cart.len(), "Stashed anonymous cart in session.");
        }
        self.store.delete_cart(cart.id).await?;
      }
    }

    session.user_id = None;
    if signed_out {
      session.success("Successfully logged out.");
    }
    Ok(())
  }
}
