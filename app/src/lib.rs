// app/src/lib.rs

//! HTTP front end for the bookstore: actix-web routes, cookie sessions, and
//! configuration. The binary in `main.rs` wires these together.

pub mod config;
pub mod errors;
pub mod state;
pub mod telemetry;
pub mod web;

pub use config::AppConfig;
pub use errors::AppError;
pub use state::AppState;
