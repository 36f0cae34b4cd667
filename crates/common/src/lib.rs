//! Common utilities and shared types for verdant.
//!
//! This crate provides foundational components used across all verdant crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Pagination**: Page/per-page normalization via [`PageRequest`]
//! - **Storage**: Object storage backends (S3) and signed URL generation
//!
//! # Example
//!
//! ```no_run
//! use verdant_common::{AppResult, Config, PageRequest};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!     let page = PageRequest::new(Some(2), Some(10), 10);
//!     println!("Serving page {} on port {}", page.page, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pagination;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use pagination::{Page, PageRequest};
pub use storage::{S3Storage, StorageBackend, StoredObject, generate_storage_key};

#[cfg(feature = "test-utils")]
pub use storage::MemoryStorage;
