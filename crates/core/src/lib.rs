//! Core business logic for verdant.

pub mod services;

pub use services::*;
