// core/src/models/mod.rs

//! Data structures for the bookstore's stored entities.

pub mod book;
pub mod cart;
pub mod order;
pub mod session;
pub mod user;

pub use book::{Book, NewBook};
pub use cart::{Cart, CartEntry, CartItem, CartLine};
pub use order::{Order, OrderLine, PaymentMethod, ShippingDetails};
pub use session::{Notice, NoticeLevel, SessionState};
pub use user::{Identity, NewUser, User};
