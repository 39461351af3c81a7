//! Data models for container operations
//!
//! This module defines listing entries, container properties, service
//! responses, and the option structs passed to the storage service.

use crate::error::{LifecycleError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Public access level requested when creating a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicAccessLevel {
    #[default]
    None,
    Blob,
    Container,
}

impl fmt::Display for PublicAccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Blob => write!(f, "blob"),
            Self::Container => write!(f, "container"),
        }
    }
}

/// One entry produced by a container enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerItem {
    pub name: String,
    /// Identifies a soft-deleted instance; present only for deleted entries
    pub version: Option<String>,
    pub deleted: bool,
    pub last_modified: Option<DateTime<Utc>>,
    pub deleted_time: Option<DateTime<Utc>>,
    pub remaining_retention_days: Option<u32>,
}

impl ContainerItem {
    /// A live (not deleted) listing entry
    pub fn active<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            version: None,
            deleted: false,
            last_modified: None,
            deleted_time: None,
            remaining_retention_days: None,
        }
    }

    /// A soft-deleted listing entry with its version identifier
    pub fn deleted<N: Into<String>, V: Into<String>>(name: N, version: V) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
            deleted: true,
            last_modified: None,
            deleted_time: None,
            remaining_retention_days: None,
        }
    }
}

/// One page of a container enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerPage {
    pub items: Vec<ContainerItem>,
    /// Continuation marker; `None` on the last page
    pub next_marker: Option<String>,
}

/// Properties of a single container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerProperties {
    pub name: String,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
    pub public_access: PublicAccessLevel,
}

/// Outcome of a mutating service call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceResponse {
    pub request_id: Option<String>,
    pub error_code: Option<String>,
}

impl ServiceResponse {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_error_code<S: Into<String>>(code: S) -> Self {
        Self {
            request_id: None,
            error_code: Some(code.into()),
        }
    }

    /// A response is successful when it carries no error code
    pub fn is_success(&self) -> bool {
        self.error_code.is_none()
    }

    /// Turn a present error code into an error for `operation`
    pub fn ensure_success(self, operation: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        Err(LifecycleError::service(
            operation,
            None,
            self.error_code,
            "service returned an error code",
        ))
    }
}

/// Filters for a container enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListContainersOptions {
    pub prefix: Option<String>,
    pub include_deleted: bool,
    pub include_metadata: bool,
    pub include_system: bool,
    pub max_results: Option<u32>,
}

impl ListContainersOptions {
    /// Value of the `include` query parameter, if any dataset is requested
    pub fn include_param(&self) -> Option<String> {
        let mut include = Vec::new();
        if self.include_deleted {
            include.push("deleted");
        }
        if self.include_metadata {
            include.push("metadata");
        }
        if self.include_system {
            include.push("system");
        }

        if include.is_empty() {
            None
        } else {
            Some(include.join(","))
        }
    }
}

/// Request to restore a soft-deleted container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndeleteRequest {
    pub deleted_name: String,
    pub deleted_version: String,
    /// Restore under a different name; the original name is used when `None`
    pub new_name: Option<String>,
}

impl UndeleteRequest {
    /// Name the container will have once restored
    pub fn target_name(&self) -> &str {
        self.new_name.as_deref().unwrap_or(&self.deleted_name)
    }
}
