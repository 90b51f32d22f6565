//! HTTP-facing pieces of the Vestibule waiting room: the gateway routes,
//! the env-driven configuration, and the application state shared across
//! handlers. The binary in `main.rs` wires these to a listener and the
//! promotion scheduler.

pub mod errors;
pub mod handlers;
pub mod infra;
pub mod routes;

pub use errors::{AppError, AppResult};
pub use infra::{app_state::AppState, config::Config};
