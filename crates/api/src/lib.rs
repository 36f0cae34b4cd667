//! HTTP API layer for verdant.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: `/users` (accounts, profile, saved plants) and `/plants`
//!   (catalog, comments, likes, saves)
//! - **Extractors**: Bearer authentication and path id parsing
//! - **Middleware**: Token verification
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, app};
