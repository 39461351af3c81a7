//! In-memory storage account shared by the integration tests
//!
//! `FakeAccount` keeps live containers and soft-deleted versions, records
//! every call it receives, and can be told to answer a call with an error code.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use container_lifecycle::storage::{
    ContainerItem, ContainerPage, ContainerProperties, ContainerService, ListContainersOptions,
    PublicAccessLevel, ServiceResponse, UndeleteRequest,
};
use container_lifecycle::{LifecycleError, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// A call received by the fake account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    Delete(String),
    GetProperties(String),
    List {
        prefix: Option<String>,
        include_deleted: bool,
        marker: Option<String>,
    },
    Undelete {
        name: String,
        version: String,
        target: String,
    },
}

impl Call {
    pub fn is_create(&self) -> bool {
        matches!(self, Call::Create(_))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Call::Delete(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Call::List { .. })
    }

    pub fn is_undelete(&self) -> bool {
        matches!(self, Call::Undelete { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Delete,
    Undelete,
}

#[derive(Debug, Clone)]
struct LiveContainer {
    last_modified: DateTime<Utc>,
    access: PublicAccessLevel,
}

#[derive(Debug, Clone)]
struct DeletedContainer {
    name: String,
    version: String,
    deleted_time: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    live: BTreeMap<String, LiveContainer>,
    deleted: Vec<DeletedContainer>,
    calls: Vec<Call>,
    error_codes: HashMap<(Op, String), String>,
    version_counter: u64,
    clock: i64,
}

impl State {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap() + Duration::seconds(self.clock)
    }

    fn next_version(&mut self) -> String {
        self.version_counter += 1;
        format!("01DA{:012X}", self.version_counter)
    }

    fn listing(&self, options: &ListContainersOptions) -> Vec<ContainerItem> {
        let mut items: Vec<ContainerItem> = self
            .live
            .iter()
            .map(|(name, live)| ContainerItem {
                last_modified: Some(live.last_modified),
                ..ContainerItem::active(name.clone())
            })
            .collect();

        if options.include_deleted {
            items.extend(self.deleted.iter().map(|d| ContainerItem {
                deleted_time: Some(d.deleted_time),
                remaining_retention_days: Some(7),
                ..ContainerItem::deleted(d.name.clone(), d.version.clone())
            }));
        }

        if let Some(prefix) = &options.prefix {
            items.retain(|item| item.name.starts_with(prefix.as_str()));
        }

        // Name order; deleted versions of one name ascend
        items.sort_by(|a, b| listing_key(a).cmp(&listing_key(b)));
        items
    }
}

type ListingKey = (String, bool, Option<String>);

fn listing_key(item: &ContainerItem) -> ListingKey {
    (item.name.clone(), item.deleted, item.version.clone())
}

/// `name` for a live entry, `name/version` for a deleted one
fn marker_for(item: &ContainerItem) -> String {
    match &item.version {
        Some(version) if item.deleted => format!("{}/{}", item.name, version),
        _ => item.name.clone(),
    }
}

fn parse_marker(marker: &str) -> ListingKey {
    match marker.split_once('/') {
        Some((name, version)) => (name.to_string(), true, Some(version.to_string())),
        None => (marker.to_string(), false, None),
    }
}

fn service_error(operation: &str, status: u16, code: &str) -> LifecycleError {
    LifecycleError::service(operation, Some(status), Some(code.to_string()), code)
}

/// In-memory storage account with soft delete enabled
pub struct FakeAccount {
    state: Mutex<State>,
    page_size: usize,
}

impl FakeAccount {
    pub fn new() -> Self {
        Self::with_page_size(5000)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size,
        }
    }

    /// Seed live containers without recording calls
    pub fn with_containers(self, names: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for name in names {
                let last_modified = state.tick();
                state.live.insert(
                    name.to_string(),
                    LiveContainer {
                        last_modified,
                        access: PublicAccessLevel::None,
                    },
                );
            }
        }
        self
    }

    /// Seed a soft-deleted version without recording calls
    pub fn with_deleted(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let version = state.next_version();
            let deleted_time = state.tick();
            state.deleted.push(DeletedContainer {
                name: name.to_string(),
                version,
                deleted_time,
            });
        }
        self
    }

    /// Answer `op` on `name` with a response carrying `code`
    pub fn respond_with_error_code(&self, op: Op, name: &str, code: &str) {
        self.state
            .lock()
            .unwrap()
            .error_codes
            .insert((op, name.to_string()), code.to_string());
    }

    pub fn into_service(self: Arc<Self>) -> Arc<dyn ContainerService> {
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn live_names(&self) -> Vec<String> {
        self.state.lock().unwrap().live.keys().cloned().collect()
    }

    pub fn public_access(&self, name: &str) -> Option<PublicAccessLevel> {
        self.state.lock().unwrap().live.get(name).map(|c| c.access)
    }

    /// Versions of `name` still in the soft-deleted set, oldest first
    pub fn deleted_versions(&self, name: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .deleted
            .iter()
            .filter(|d| d.name == name)
            .map(|d| d.version.clone())
            .collect()
    }

    fn injected_code(state: &State, op: Op, name: &str) -> Option<String> {
        state.error_codes.get(&(op, name.to_string())).cloned()
    }
}

#[async_trait]
impl ContainerService for FakeAccount {
    async fn create_container(
        &self,
        name: &str,
        access: PublicAccessLevel,
    ) -> Result<ServiceResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(name.to_string()));

        if let Some(code) = Self::injected_code(&state, Op::Create, name) {
            return Ok(ServiceResponse::with_error_code(code));
        }
        if state.live.contains_key(name) {
            return Err(service_error("create container", 409, "ContainerAlreadyExists"));
        }

        let last_modified = state.tick();
        state.live.insert(
            name.to_string(),
            LiveContainer {
                last_modified,
                access,
            },
        );
        Ok(ServiceResponse::ok())
    }

    async fn delete_container(&self, name: &str) -> Result<ServiceResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(name.to_string()));

        if let Some(code) = Self::injected_code(&state, Op::Delete, name) {
            return Ok(ServiceResponse::with_error_code(code));
        }
        if state.live.remove(name).is_none() {
            return Err(service_error("delete container", 404, "ContainerNotFound"));
        }

        let version = state.next_version();
        let deleted_time = state.tick();
        state.deleted.push(DeletedContainer {
            name: name.to_string(),
            version,
            deleted_time,
        });
        Ok(ServiceResponse::ok())
    }

    async fn get_container_properties(&self, name: &str) -> Result<ContainerProperties> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetProperties(name.to_string()));

        let live = state
            .live
            .get(name)
            .ok_or_else(|| service_error("get container properties", 404, "ContainerNotFound"))?;

        Ok(ContainerProperties {
            name: name.to_string(),
            last_modified: live.last_modified,
            etag: Some(format!("\"0x{:X}\"", live.last_modified.timestamp())),
            public_access: live.access,
        })
    }

    async fn list_containers(
        &self,
        options: &ListContainersOptions,
        marker: Option<String>,
    ) -> Result<ContainerPage> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List {
            prefix: options.prefix.clone(),
            include_deleted: options.include_deleted,
            marker: marker.clone(),
        });

        // Markers name the first entry of the next page, like the service's NextMarker
        let items = state.listing(options);
        let start = match marker.as_deref().map(parse_marker) {
            Some(resume) => items
                .iter()
                .position(|item| listing_key(item) >= resume)
                .unwrap_or(items.len()),
            None => 0,
        };
        let end = (start + self.page_size).min(items.len());
        let next_marker = items.get(end).map(marker_for);

        Ok(ContainerPage {
            items: items[start..end].to_vec(),
            next_marker,
        })
    }

    async fn undelete_container(&self, request: &UndeleteRequest) -> Result<ServiceResponse> {
        let mut state = self.state.lock().unwrap();
        let target = request.target_name().to_string();
        state.calls.push(Call::Undelete {
            name: request.deleted_name.clone(),
            version: request.deleted_version.clone(),
            target: target.clone(),
        });

        if let Some(code) = Self::injected_code(&state, Op::Undelete, &request.deleted_name) {
            return Ok(ServiceResponse::with_error_code(code));
        }
        if state.live.contains_key(&target) {
            return Err(service_error("undelete container", 409, "ContainerAlreadyExists"));
        }

        let position = state
            .deleted
            .iter()
            .position(|d| d.name == request.deleted_name && d.version == request.deleted_version)
            .ok_or_else(|| service_error("undelete container", 404, "ContainerNotFound"))?;
        state.deleted.remove(position);

        let last_modified = state.tick();
        state.live.insert(
            target,
            LiveContainer {
                last_modified,
                access: PublicAccessLevel::None,
            },
        );
        Ok(ServiceResponse::ok())
    }
}
