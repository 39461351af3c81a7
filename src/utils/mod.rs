//! Utility functions module
//!
//! This module contains helpers for connection string parsing
//! and container name validation.

pub mod connection;
pub mod naming;

pub use connection::*;
pub use naming::*;
