//! Sakila API crate - same-origin relay in front of the answering service.
//!
//! Browser surfaces post questions to the relay on their own origin; the
//! relay forwards them to the service and hands the JSON back unchanged.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::RelayState;
