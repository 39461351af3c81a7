//! Container lifecycle operations
//!
//! The individual create/delete/undelete operations, and the driver that
//! runs them as one sequence against a storage account.

pub mod driver;
pub mod operations;

pub use driver::{DriverSettings, LifecycleDriver, RunSummary};
pub use operations::*;
