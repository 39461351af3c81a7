//! Container lifecycle operations
//!
//! Every operation takes the account-level service explicitly, checks the
//! response for an error code, and logs only once the call has succeeded.
//! Failures propagate unchanged; nothing is retried or rolled back.

use crate::error::{LifecycleError, Result};
use crate::storage::client::{ContainerClient, ContainerClientExt};
use crate::storage::listing::list_containers;
use crate::storage::models::{ListContainersOptions, PublicAccessLevel, UndeleteRequest};
use crate::storage::service::ContainerService;
use crate::utils::naming::validate_container_name;
use futures::TryStreamExt;
use std::sync::Arc;
use tracing::{debug, info};

/// Create a container with container-level public access and log its last-modified time
pub async fn create_container(
    service: &Arc<dyn ContainerService>,
    name: &str,
) -> Result<ContainerClient> {
    validate_container_name(name)?;

    service
        .create_container(name, PublicAccessLevel::Container)
        .await?
        .ensure_success("create container")?;

    let container_client = service.container_client(name);
    let properties = container_client.get_properties().await?;
    info!(container = name, "{} lastModified: {}", name, properties.last_modified);

    Ok(container_client)
}

/// Delete a container through the account-level client
pub async fn delete_container_immediately(
    service: &Arc<dyn ContainerService>,
    name: &str,
) -> Result<()> {
    service
        .delete_container(name)
        .await?
        .ensure_success("delete container")?;

    info!(container = name, "deleted {} container", name);
    Ok(())
}

/// Delete a container through its own client; the service soft-deletes it
pub async fn delete_container_soft(container_client: &ContainerClient) -> Result<()> {
    container_client
        .delete()
        .await?
        .ensure_success("delete container")?;

    info!(container = container_client.name(), "deleted {} container", container_client.name());
    Ok(())
}

/// Delete every live container whose name starts with `prefix`.
///
/// Enumeration and deletion interleave one entry at a time. Returns the
/// deleted names in enumeration order.
pub async fn delete_containers_with_prefix(
    service: &Arc<dyn ContainerService>,
    prefix: &str,
) -> Result<Vec<String>> {
    let options = ListContainersOptions {
        prefix: Some(prefix.to_string()),
        include_deleted: false,
        include_metadata: false,
        include_system: true,
        max_results: None,
    };

    let mut containers = list_containers(Arc::clone(service), options);
    let mut deleted = Vec::new();

    while let Some(item) = containers.try_next().await? {
        let container_client = service.container_client(&item.name);
        container_client
            .delete()
            .await?
            .ensure_success("delete container")?;

        info!(container = %item.name, "deleted {} container", item.name);
        deleted.push(item.name);
    }

    Ok(deleted)
}

/// Find the most recent soft-deleted version of `name`.
///
/// Deleted versions of one name are listed in ascending order, so the last
/// match wins.
pub async fn latest_deleted_version(
    service: &Arc<dyn ContainerService>,
    name: &str,
) -> Result<Option<String>> {
    let options = ListContainersOptions {
        prefix: Some(name.to_string()),
        include_deleted: true,
        ..Default::default()
    };

    let mut containers = list_containers(Arc::clone(service), options);
    let mut latest = None;

    while let Some(item) = containers.try_next().await? {
        if item.name != name || !item.deleted {
            continue;
        }
        if let Some(version) = item.version {
            debug!(container = name, version = %version, "Found deleted version");
            latest = Some(version);
        }
    }

    Ok(latest)
}

/// Restore the most recent soft-deleted version of `name`, optionally under `new_name`.
///
/// Fails with [`LifecycleError::DeletedVersionNotFound`] without calling the
/// service when no deleted version exists.
pub async fn undelete_container(
    service: &Arc<dyn ContainerService>,
    name: &str,
    new_name: Option<&str>,
) -> Result<ContainerClient> {
    if let Some(new_name) = new_name {
        validate_container_name(new_name)?;
    }

    let version = latest_deleted_version(service, name)
        .await?
        .ok_or_else(|| LifecycleError::deleted_version_not_found(name))?;

    let request = UndeleteRequest {
        deleted_name: name.to_string(),
        deleted_version: version,
        new_name: new_name.map(str::to_string),
    };

    service
        .undelete_container(&request)
        .await?
        .ensure_success("undelete container")?;
    info!(container = name, version = %request.deleted_version, "{} is undeleted", name);

    let target = request.target_name();
    let container_client = service.container_client(target);
    let properties = container_client.get_properties().await?;
    info!(container = target, "{} lastModified: {}", target, properties.last_modified);

    Ok(container_client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::*;
    use crate::storage::service::MockContainerService;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::sync::Mutex;

    fn properties(name: &str) -> ContainerProperties {
        ContainerProperties {
            name: name.to_string(),
            last_modified: Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap(),
            etag: Some("\"0x8DE0F1A2B3C4D5E\"".to_string()),
            public_access: PublicAccessLevel::Container,
        }
    }

    fn into_service(mock: MockContainerService) -> Arc<dyn ContainerService> {
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_create_container_requests_container_access() {
        let mut mock = MockContainerService::new();
        mock.expect_create_container()
            .with(eq("demo-1"), eq(PublicAccessLevel::Container))
            .times(1)
            .returning(|_, _| Ok(ServiceResponse::ok()));
        mock.expect_get_container_properties()
            .with(eq("demo-1"))
            .times(1)
            .returning(|name| Ok(properties(name)));

        let client = create_container(&into_service(mock), "demo-1").await.unwrap();
        assert_eq!(client.name(), "demo-1");
    }

    #[tokio::test]
    async fn test_create_container_error_code_skips_properties() {
        let mut mock = MockContainerService::new();
        mock.expect_create_container()
            .returning(|_, _| Ok(ServiceResponse::with_error_code("ContainerAlreadyExists")));
        mock.expect_get_container_properties().never();

        let err = create_container(&into_service(mock), "demo-1").await.unwrap_err();
        assert_eq!(err.error_code(), Some("ContainerAlreadyExists"));
    }

    #[tokio::test]
    async fn test_create_container_rejects_invalid_name() {
        let mut mock = MockContainerService::new();
        mock.expect_create_container().never();

        let err = create_container(&into_service(mock), "Not_Valid").await.unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidContainerName { .. }));
    }

    #[tokio::test]
    async fn test_delete_container_immediately() {
        let mut mock = MockContainerService::new();
        mock.expect_delete_container()
            .with(eq("demo-1"))
            .times(1)
            .returning(|_| Ok(ServiceResponse::ok()));

        delete_container_immediately(&into_service(mock), "demo-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_container_soft_uses_client_name() {
        let mut mock = MockContainerService::new();
        mock.expect_delete_container()
            .with(eq("demo-2"))
            .times(1)
            .returning(|_| Ok(ServiceResponse::ok()));

        let service = into_service(mock);
        let client = service.container_client("demo-2");
        delete_container_soft(&client).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_with_prefix_deletes_each_entry_in_order() {
        let mut mock = MockContainerService::new();
        let mut seq = Sequence::new();

        mock.expect_list_containers()
            .withf(|options, marker| {
                options.prefix.as_deref() == Some("demo")
                    && !options.include_deleted
                    && !options.include_metadata
                    && options.include_system
                    && marker.is_none()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ContainerPage {
                    items: vec![
                        ContainerItem::active("a"),
                        ContainerItem::active("b"),
                        ContainerItem::active("c"),
                    ],
                    next_marker: None,
                })
            });
        for name in ["a", "b", "c"] {
            mock.expect_delete_container()
                .with(eq(name))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(ServiceResponse::ok()));
        }

        let deleted = delete_containers_with_prefix(&into_service(mock), "demo").await.unwrap();
        assert_eq!(deleted, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_delete_with_prefix_interleaves_pages_and_deletes() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut mock = MockContainerService::new();

        let log = Arc::clone(&calls);
        mock.expect_list_containers().returning(move |_, marker| {
            log.lock().unwrap().push(format!("list {marker:?}"));
            Ok(match marker {
                None => ContainerPage {
                    items: vec![ContainerItem::active("a")],
                    next_marker: Some("m1".to_string()),
                },
                Some(_) => ContainerPage {
                    items: vec![ContainerItem::active("b")],
                    next_marker: None,
                },
            })
        });
        let log = Arc::clone(&calls);
        mock.expect_delete_container().returning(move |name| {
            log.lock().unwrap().push(format!("delete {name}"));
            Ok(ServiceResponse::ok())
        });

        delete_containers_with_prefix(&into_service(mock), "demo").await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["list None", "delete a", "list Some(\"m1\")", "delete b"]
        );
    }

    #[tokio::test]
    async fn test_delete_with_prefix_stops_at_first_failure() {
        let mut mock = MockContainerService::new();
        mock.expect_list_containers().returning(|_, _| {
            Ok(ContainerPage {
                items: vec![ContainerItem::active("a"), ContainerItem::active("b")],
                next_marker: None,
            })
        });
        mock.expect_delete_container()
            .with(eq("a"))
            .times(1)
            .returning(|_| Ok(ServiceResponse::with_error_code("LeaseIdMissing")));
        mock.expect_delete_container().with(eq("b")).never();

        let err = delete_containers_with_prefix(&into_service(mock), "demo")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some("LeaseIdMissing"));
    }

    #[tokio::test]
    async fn test_undelete_uses_most_recent_version() {
        let mut mock = MockContainerService::new();
        mock.expect_list_containers()
            .withf(|options, _| options.include_deleted && options.prefix.as_deref() == Some("demo-1"))
            .returning(|_, _| {
                Ok(ContainerPage {
                    items: vec![
                        ContainerItem::deleted("demo-1", "v1"),
                        ContainerItem::deleted("demo-1", "v2"),
                        // Same prefix, different name
                        ContainerItem::deleted("demo-10", "v3"),
                    ],
                    next_marker: None,
                })
            });
        mock.expect_undelete_container()
            .withf(|request| {
                request.deleted_name == "demo-1"
                    && request.deleted_version == "v2"
                    && request.new_name.is_none()
            })
            .times(1)
            .returning(|_| Ok(ServiceResponse::ok()));
        mock.expect_get_container_properties()
            .with(eq("demo-1"))
            .times(1)
            .returning(|name| Ok(properties(name)));

        let client = undelete_container(&into_service(mock), "demo-1", None).await.unwrap();
        assert_eq!(client.name(), "demo-1");
    }

    #[tokio::test]
    async fn test_undelete_ignores_live_container_with_same_name() {
        let mut mock = MockContainerService::new();
        mock.expect_list_containers().returning(|_, _| {
            Ok(ContainerPage {
                items: vec![
                    ContainerItem::deleted("demo-1", "v1"),
                    ContainerItem::active("demo-1"),
                ],
                next_marker: None,
            })
        });
        mock.expect_undelete_container()
            .withf(|request| request.deleted_version == "v1")
            .times(1)
            .returning(|_| Ok(ServiceResponse::ok()));
        mock.expect_get_container_properties()
            .returning(|name| Ok(properties(name)));

        undelete_container(&into_service(mock), "demo-1", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_undelete_without_deleted_version_fails_fast() {
        let mut mock = MockContainerService::new();
        mock.expect_list_containers()
            .returning(|_, _| Ok(ContainerPage::default()));
        mock.expect_undelete_container().never();

        let err = undelete_container(&into_service(mock), "demo-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::DeletedVersionNotFound { ref name } if name == "demo-1"));
    }

    #[tokio::test]
    async fn test_undelete_under_new_name() {
        let mut mock = MockContainerService::new();
        mock.expect_list_containers().returning(|_, _| {
            Ok(ContainerPage {
                items: vec![ContainerItem::deleted("demo-1", "v1")],
                next_marker: None,
            })
        });
        mock.expect_undelete_container()
            .withf(|request| request.target_name() == "demo-restored")
            .times(1)
            .returning(|_| Ok(ServiceResponse::ok()));
        mock.expect_get_container_properties()
            .with(eq("demo-restored"))
            .times(1)
            .returning(|name| Ok(properties(name)));

        let client = undelete_container(&into_service(mock), "demo-1", Some("demo-restored"))
            .await
            .unwrap();
        assert_eq!(client.name(), "demo-restored");
    }

    #[tokio::test]
    async fn test_undelete_error_code_skips_properties() {
        let mut mock = MockContainerService::new();
        mock.expect_list_containers().returning(|_, _| {
            Ok(ContainerPage {
                items: vec![ContainerItem::deleted("demo-1", "v1")],
                next_marker: None,
            })
        });
        mock.expect_undelete_container()
            .returning(|_| Ok(ServiceResponse::with_error_code("ContainerAlreadyExists")));
        mock.expect_get_container_properties().never();

        let err = undelete_container(&into_service(mock), "demo-1", None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some("ContainerAlreadyExists"));
    }
}
