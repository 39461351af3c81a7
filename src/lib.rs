//! container-lifecycle - Azure Blob Storage container lifecycle driver
//!
//! Creates a batch of containers, removes them through immediate, soft and
//! prefix-based deletes, and restores a soft-deleted container.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use error::{LifecycleError, Result};
