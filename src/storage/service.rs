//! Storage account service trait
//!
//! `ContainerService` is the account-level client every lifecycle operation
//! receives explicitly. The Azure implementation lives in `storage::azure`.

use crate::error::Result;
use crate::storage::models::*;
use async_trait::async_trait;

/// Account-scoped container operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContainerService: Send + Sync {
    /// Create a container with the given public access level
    async fn create_container(&self, name: &str, access: PublicAccessLevel) -> Result<ServiceResponse>;

    /// Delete a container by name
    async fn delete_container(&self, name: &str) -> Result<ServiceResponse>;

    /// Fetch the properties of a container
    async fn get_container_properties(&self, name: &str) -> Result<ContainerProperties>;

    /// Fetch one page of containers, starting at `marker`
    async fn list_containers(
        &self,
        options: &ListContainersOptions,
        marker: Option<String>,
    ) -> Result<ContainerPage>;

    /// Restore a soft-deleted container
    async fn undelete_container(&self, request: &UndeleteRequest) -> Result<ServiceResponse>;
}
