//! Azure Blob Storage container operations
//!
//! This module provides the account-level service seam, container-scoped
//! clients, lazy container enumeration, and the Azure-backed implementation.

pub mod azure;
pub mod client;
pub mod listing;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use azure::AzureContainerService;
pub use client::ContainerClient;
pub use listing::list_containers;
pub use models::*;
pub use service::ContainerService;
