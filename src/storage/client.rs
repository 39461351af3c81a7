//! Container-scoped client handle

use crate::error::Result;
use crate::storage::models::{ContainerProperties, ServiceResponse};
use crate::storage::service::ContainerService;
use std::sync::Arc;

/// Handle bound to a single container name
#[derive(Clone)]
pub struct ContainerClient {
    service: Arc<dyn ContainerService>,
    name: String,
}

impl ContainerClient {
    pub fn new(service: Arc<dyn ContainerService>, name: impl Into<String>) -> Self {
        Self {
            service,
            name: name.into(),
        }
    }

    /// Name of the container this client is bound to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delete this container; the service keeps it recoverable while soft delete is enabled
    pub async fn delete(&self) -> Result<ServiceResponse> {
        self.service.delete_container(&self.name).await
    }

    /// Fetch this container's properties
    pub async fn get_properties(&self) -> Result<ContainerProperties> {
        self.service.get_container_properties(&self.name).await
    }
}

impl std::fmt::Debug for ContainerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerClient")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Extension for obtaining container clients from a shared service
pub trait ContainerClientExt {
    fn container_client(&self, name: &str) -> ContainerClient;
}

impl ContainerClientExt for Arc<dyn ContainerService> {
    fn container_client(&self, name: &str) -> ContainerClient {
        ContainerClient::new(Arc::clone(self), name)
    }
}
