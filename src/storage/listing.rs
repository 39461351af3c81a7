//! Lazy, paginated container enumeration
//!
//! Pages are requested only when the consumer reaches the end of the
//! previous one. Each call to [`list_containers`] starts from the first page.

use crate::error::{LifecycleError, Result};
use crate::storage::models::{ContainerItem, ListContainersOptions};
use crate::storage::service::ContainerService;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

enum PageCursor {
    Start,
    Next(String),
    Done,
}

/// Stream every container matching `options`, one entry at a time
pub fn list_containers(
    service: Arc<dyn ContainerService>,
    options: ListContainersOptions,
) -> BoxStream<'static, Result<ContainerItem>> {
    let pages = stream::try_unfold(PageCursor::Start, move |cursor| {
        let service = Arc::clone(&service);
        let options = options.clone();
        async move {
            let marker = match cursor {
                PageCursor::Start => None,
                PageCursor::Next(marker) => Some(marker),
                PageCursor::Done => return Ok(None),
            };

            debug!(prefix = ?options.prefix, marker = ?marker, "Fetching container page");
            let page = service.list_containers(&options, marker).await?;

            let next = match page.next_marker.filter(|m| !m.is_empty()) {
                Some(marker) => PageCursor::Next(marker),
                None => PageCursor::Done,
            };

            Ok::<_, LifecycleError>(Some((page.items, next)))
        }
    });

    pages
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<_, LifecycleError>)))
        .try_flatten()
        .boxed()
}
