//! Authentication module for Azure Storage requests
//!
//! This module signs REST requests with the storage account's Shared Key
//! for the operations that go straight to the Blob service API.

pub mod shared_key;

pub use shared_key::*;
