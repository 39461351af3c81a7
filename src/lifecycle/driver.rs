//! The container lifecycle sequence
//!
//! Creates `{base}-1..=N` concurrently, deletes `{base}-1` immediately, waits
//! for soft delete to settle, soft-deletes `{base}-2`, bulk-deletes the prefix,
//! and finally restores `{base}-1`.

use crate::error::{LifecycleError, Result};
use crate::lifecycle::operations::*;
use crate::storage::client::ContainerClientExt;
use crate::storage::service::ContainerService;
use crate::utils::naming::validate_container_name;
use futures::future::try_join_all;
use futures::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_NAME: &str = "blob-storage-dev-guide-example";
pub const DEFAULT_DELETE_PREFIX: &str = "blob-storage-dev-guide";
pub const DEFAULT_CONTAINER_COUNT: usize = 8;
pub const DEFAULT_SOFT_DELETE_WAIT: Duration = Duration::from_secs(30);

/// Parameters of one lifecycle run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    pub base_name: String,
    pub container_count: usize,
    pub delete_prefix: String,
    /// Time for a soft delete to settle before it can be undeleted
    pub soft_delete_wait: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            base_name: DEFAULT_BASE_NAME.to_string(),
            container_count: DEFAULT_CONTAINER_COUNT,
            delete_prefix: DEFAULT_DELETE_PREFIX.to_string(),
            soft_delete_wait: DEFAULT_SOFT_DELETE_WAIT,
        }
    }
}

impl DriverSettings {
    /// Name of the container at 1-based `index`
    pub fn container_name(&self, index: usize) -> String {
        format!("{}-{}", self.base_name, index)
    }

    pub fn container_names(&self) -> Vec<String> {
        (1..=self.container_count)
            .map(|i| self.container_name(i))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.container_count < 2 {
            return Err(LifecycleError::config(
                "container count must be at least 2 (one hard delete, one soft delete)",
            ));
        }

        for name in self.container_names() {
            validate_container_name(&name)?;
        }

        Ok(())
    }
}

/// What a completed run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub created: Vec<String>,
    pub deleted_immediately: String,
    pub soft_deleted: String,
    pub deleted_by_prefix: Vec<String>,
    pub undeleted: String,
}

/// Runs the lifecycle sequence against one storage account
pub struct LifecycleDriver {
    service: Arc<dyn ContainerService>,
    settings: DriverSettings,
}

impl LifecycleDriver {
    pub fn new(service: Arc<dyn ContainerService>, settings: DriverSettings) -> Self {
        Self { service, settings }
    }

    /// Run the full sequence. Any failure aborts the remaining steps.
    pub async fn run(&self) -> Result<RunSummary> {
        self.settings.validate()?;

        let created = self.create_all().await?;

        let first = self.settings.container_name(1);
        delete_container_immediately(&self.service, &first).await?;

        info!(
            seconds = self.settings.soft_delete_wait.as_secs(),
            "Waiting for soft delete to settle"
        );
        tokio::time::sleep(self.settings.soft_delete_wait).await;

        let second = self.service.container_client(&self.settings.container_name(2));
        delete_container_soft(&second).await?;

        let deleted_by_prefix =
            delete_containers_with_prefix(&self.service, &self.settings.delete_prefix).await?;

        let restored = undelete_container(&self.service, &first, None).await?;

        Ok(RunSummary {
            created,
            deleted_immediately: first,
            soft_deleted: second.name().to_string(),
            deleted_by_prefix,
            undeleted: restored.name().to_string(),
        })
    }

    /// Create every container concurrently and wait for all of them.
    ///
    /// Fails with the first error. Creations that already finished, or are
    /// still in flight when the join fails, are left in place.
    async fn create_all(&self) -> Result<Vec<String>> {
        let tasks = self.settings.container_names().into_iter().map(|name| {
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                create_container(&service, &name).await?;
                Ok::<_, LifecycleError>(name)
            })
            .map(|joined| joined.map_err(LifecycleError::from).and_then(|created| created))
        });

        try_join_all(tasks).await
    }
}
