//! Azure Blob Storage implementation of `ContainerService`
//!
//! Create, delete and property reads go through `azure_storage_blobs`.
//! Listing with soft-deleted versions and container restore are not exposed
//! by the v0.21 SDK, so those two calls are issued against the Blob service
//! REST API directly, authorized with Shared Key or the connection's SAS token.

use crate::auth::shared_key::SharedKeySigner;
use crate::error::{LifecycleError, Result};
use crate::storage::models::*;
use crate::storage::service::ContainerService;
use crate::utils::connection::{StorageAuth, StorageConnection};
use async_trait::async_trait;
use azure_storage::{CloudLocation, StorageCredentials};
use azure_storage_blobs::prelude::*;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_LENGTH};
use reqwest::{Client, Method};
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// REST API version sent with direct service requests
pub const STORAGE_API_VERSION: &str = "2021-12-02";

const ERROR_CODE_HEADER: &str = "x-ms-error-code";
const REQUEST_ID_HEADER: &str = "x-ms-request-id";

/// How direct REST requests are authorized
enum RestAuth {
    SharedKey(SharedKeySigner),
    Sas(String),
}

/// Storage account client backed by Azure Blob Storage
pub struct AzureContainerService {
    blob_service: BlobServiceClient,
    http_client: Client,
    blob_endpoint: String,
    rest_auth: RestAuth,
}

impl AzureContainerService {
    /// Create a service client from a storage connection string
    pub fn from_connection_string(connection_string: &str) -> Result<Self> {
        let connection = StorageConnection::parse(connection_string)?;
        Self::new(connection)
    }

    /// Create a service client from a parsed connection
    pub fn new(connection: StorageConnection) -> Result<Self> {
        let account = connection.account_name.clone();

        let (credentials, rest_auth) = match &connection.auth {
            StorageAuth::AccessKey(key) => (
                StorageCredentials::access_key(account.clone(), key.clone()),
                RestAuth::SharedKey(SharedKeySigner::new(account.clone(), key)?),
            ),
            StorageAuth::SasToken(token) => (
                StorageCredentials::sas_token(token.as_str())?,
                RestAuth::Sas(token.clone()),
            ),
        };

        let location = if connection.is_public_endpoint() {
            CloudLocation::Public {
                account: account.clone(),
            }
        } else {
            CloudLocation::Custom {
                account: account.clone(),
                uri: connection.blob_endpoint.clone(),
            }
        };

        let blob_service = ClientBuilder::with_location(location, credentials).blob_service_client();

        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(120))
            .user_agent(format!("container-lifecycle/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(account = %account, endpoint = %connection.blob_endpoint, "Created storage service client");

        Ok(Self {
            blob_service,
            http_client,
            blob_endpoint: connection.blob_endpoint,
            rest_auth,
        })
    }

    fn account_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("{}/", self.blob_endpoint))?)
    }

    fn container_url(&self, name: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/{}", self.blob_endpoint, name))?)
    }

    /// Authorize and send a direct REST request, mapping failures to `ServiceError`
    async fn send(
        &self,
        method: Method,
        mut url: Url,
        mut headers: HeaderMap,
        operation: &str,
    ) -> Result<reqwest::Response> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        headers.insert("x-ms-version", HeaderValue::from_static(STORAGE_API_VERSION));
        headers.insert("x-ms-date", header_value(&date)?);
        headers.insert("x-ms-client-request-id", header_value(&Uuid::new_v4().to_string())?);
        if method == Method::PUT {
            headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
        }

        match &self.rest_auth {
            RestAuth::SharedKey(signer) => {
                let authorization = signer.authorization(&method, &url, &headers)?;
                headers.insert(AUTHORIZATION, header_value(&authorization)?);
            }
            RestAuth::Sas(token) => append_sas_token(&mut url, token),
        }

        debug!(%method, path = url.path(), operation, "Sending storage request");

        let response = self
            .http_client
            .request(method, url)
            .headers(headers)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let code = header_string(response.headers(), ERROR_CODE_HEADER);
        let body = response.text().await.unwrap_or_default();
        let message = parse_error_message(&body).unwrap_or_default();

        warn!(operation, status, code = ?code, "Storage request failed");
        Err(LifecycleError::service(operation, Some(status), code, message))
    }
}

#[async_trait]
impl ContainerService for AzureContainerService {
    async fn create_container(&self, name: &str, access: PublicAccessLevel) -> Result<ServiceResponse> {
        let container_client = self.blob_service.container_client(name);

        container_client
            .create()
            .public_access(to_sdk_access(access))
            .await
            .map_err(|e| sdk_error("create container", e))?;

        Ok(ServiceResponse::ok())
    }

    async fn delete_container(&self, name: &str) -> Result<ServiceResponse> {
        let container_client = self.blob_service.container_client(name);

        container_client
            .delete()
            .await
            .map_err(|e| sdk_error("delete container", e))?;

        Ok(ServiceResponse::ok())
    }

    async fn get_container_properties(&self, name: &str) -> Result<ContainerProperties> {
        let container_client = self.blob_service.container_client(name);

        let response = container_client
            .get_properties()
            .await
            .map_err(|e| sdk_error("get container properties", e))?;

        Ok(ContainerProperties {
            name: name.to_string(),
            last_modified: to_chrono(response.container.last_modified)?,
            etag: Some(response.container.e_tag.clone()).filter(|e| !e.is_empty()),
            public_access: from_sdk_access(&response.container.public_access),
        })
    }

    async fn list_containers(
        &self,
        options: &ListContainersOptions,
        marker: Option<String>,
    ) -> Result<ContainerPage> {
        let mut url = self.account_url()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("comp", "list");
            if let Some(prefix) = &options.prefix {
                query.append_pair("prefix", prefix);
            }
            if let Some(include) = options.include_param() {
                query.append_pair("include", &include);
            }
            if let Some(marker) = &marker {
                query.append_pair("marker", marker);
            }
            if let Some(max_results) = options.max_results {
                query.append_pair("maxresults", &max_results.to_string());
            }
        }

        let response = self
            .send(Method::GET, url, HeaderMap::new(), "list containers")
            .await?;
        let body = response.text().await?;

        parse_list_response(&body)
    }

    async fn undelete_container(&self, request: &UndeleteRequest) -> Result<ServiceResponse> {
        let mut url = self.container_url(request.target_name())?;
        url.query_pairs_mut()
            .append_pair("restype", "container")
            .append_pair("comp", "undelete");

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-ms-deleted-container-name"),
            header_value(&request.deleted_name)?,
        );
        headers.insert(
            HeaderName::from_static("x-ms-deleted-container-version"),
            header_value(&request.deleted_version)?,
        );

        let response = self
            .send(Method::PUT, url, headers, "undelete container")
            .await?;

        Ok(ServiceResponse {
            request_id: header_string(response.headers(), REQUEST_ID_HEADER),
            error_code: header_string(response.headers(), ERROR_CODE_HEADER),
        })
    }
}

/// Convert an SDK timestamp to chrono, keeping sub-second precision
fn to_chrono(value: OffsetDateTime) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(value.unix_timestamp(), value.nanosecond())
        .ok_or_else(|| LifecycleError::azure_api(format!("Timestamp out of range: {value}")))
}

fn to_sdk_access(access: PublicAccessLevel) -> PublicAccess {
    match access {
        PublicAccessLevel::None => PublicAccess::None,
        PublicAccessLevel::Blob => PublicAccess::Blob,
        PublicAccessLevel::Container => PublicAccess::Container,
    }
}

fn from_sdk_access(access: &PublicAccess) -> PublicAccessLevel {
    match access {
        PublicAccess::None => PublicAccessLevel::None,
        PublicAccess::Blob => PublicAccessLevel::Blob,
        PublicAccess::Container => PublicAccessLevel::Container,
    }
}

/// Attach the operation name to an SDK error
fn sdk_error(operation: &str, error: azure_core::Error) -> LifecycleError {
    match LifecycleError::from(error) {
        LifecycleError::ServiceError {
            status,
            code,
            message,
            ..
        } => LifecycleError::service(operation, status, code, message),
        other => LifecycleError::azure_api(format!("Failed to {operation}: {other}")),
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| LifecycleError::invalid_argument(format!("Invalid header value '{value}': {e}")))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn append_sas_token(url: &mut Url, token: &str) {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(token.as_bytes())
        .into_owned()
        .collect();

    let mut query = url.query_pairs_mut();
    for (key, value) in &pairs {
        query.append_pair(key, value);
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnumerationResults {
    #[serde(default)]
    containers: ContainersXml,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContainersXml {
    #[serde(rename = "Container", default)]
    items: Vec<ContainerXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerXml {
    name: String,
    #[serde(default)]
    deleted: Option<bool>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    properties: Option<PropertiesXml>,
}

#[derive(Debug, Deserialize)]
struct PropertiesXml {
    #[serde(rename = "Last-Modified", default)]
    last_modified: Option<String>,
    #[serde(rename = "DeletedTime", default)]
    deleted_time: Option<String>,
    #[serde(rename = "RemainingRetentionDays", default)]
    remaining_retention_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorXml {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parse a `List Containers` response body into a page
pub(crate) fn parse_list_response(body: &str) -> Result<ContainerPage> {
    let results: EnumerationResults = quick_xml::de::from_str(body.trim_start_matches('\u{feff}'))?;

    let items = results
        .containers
        .items
        .into_iter()
        .map(|container| {
            let properties = container.properties;
            ContainerItem {
                name: container.name,
                version: container.version.filter(|v| !v.is_empty()),
                deleted: container.deleted.unwrap_or(false),
                last_modified: properties
                    .as_ref()
                    .and_then(|p| p.last_modified.as_deref())
                    .and_then(parse_http_date),
                deleted_time: properties
                    .as_ref()
                    .and_then(|p| p.deleted_time.as_deref())
                    .and_then(parse_http_date),
                remaining_retention_days: properties.and_then(|p| p.remaining_retention_days),
            }
        })
        .collect();

    Ok(ContainerPage {
        items,
        next_marker: results.next_marker.filter(|m| !m.is_empty()),
    })
}

/// Extract the first line of the message from a service error body
fn parse_error_message(body: &str) -> Option<String> {
    let error: ErrorXml = quick_xml::de::from_str(body.trim_start_matches('\u{feff}')).ok()?;
    let message = error.message.or(error.code)?;
    message.lines().next().map(|line| line.trim().to_string())
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .map(|d| d.with_timezone(&Utc))
        .ok()
}
