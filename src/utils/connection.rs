//! Storage connection string handling
//!
//! Parses `Key=Value;Key=Value` connection strings into the account name,
//! credential, and blob endpoint used by the storage service client.

use crate::error::{LifecycleError, Result};
use std::collections::HashMap;
use url::{Host, Url};

/// Account name used by the local storage emulator
pub const DEV_STORE_ACCOUNT: &str = "devstoreaccount1";

/// Well-known, publicly documented key of the local storage emulator
pub const DEV_STORE_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

/// Blob endpoint of the local storage emulator
pub const DEV_STORE_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Credential carried by a connection string
#[derive(Clone, PartialEq, Eq)]
pub enum StorageAuth {
    AccessKey(String),
    SasToken(String),
}

impl std::fmt::Debug for StorageAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessKey(_) => f.write_str("AccessKey(<redacted>)"),
            Self::SasToken(_) => f.write_str("SasToken(<redacted>)"),
        }
    }
}

/// Parsed storage account connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConnection {
    pub account_name: String,
    pub auth: StorageAuth,
    /// Blob service endpoint without a trailing slash
    pub blob_endpoint: String,
}

impl StorageConnection {
    /// Parse a storage connection string
    pub fn parse(connection_string: &str) -> Result<Self> {
        let params = parse_connection_string(connection_string);

        let use_dev_storage = params
            .get("usedevelopmentstorage")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if use_dev_storage {
            return Ok(Self {
                account_name: DEV_STORE_ACCOUNT.to_string(),
                auth: StorageAuth::AccessKey(DEV_STORE_KEY.to_string()),
                blob_endpoint: params
                    .get("blobendpoint")
                    .map(|e| e.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEV_STORE_BLOB_ENDPOINT.to_string()),
            });
        }

        let explicit_endpoint = params
            .get("blobendpoint")
            .filter(|v| !v.is_empty())
            .map(|e| e.trim_end_matches('/').to_string());

        let account_name = match params.get("accountname").filter(|v| !v.is_empty()) {
            Some(name) => name.clone(),
            None => explicit_endpoint
                .as_deref()
                .map(account_from_endpoint)
                .transpose()?
                .ok_or_else(|| {
                    LifecycleError::config("Connection string is missing AccountName or BlobEndpoint")
                })?,
        };

        let auth = if let Some(key) = params.get("accountkey").filter(|v| !v.is_empty()) {
            StorageAuth::AccessKey(key.clone())
        } else if let Some(sas) = params.get("sharedaccesssignature").filter(|v| !v.is_empty()) {
            StorageAuth::SasToken(sas.trim_start_matches('?').to_string())
        } else {
            return Err(LifecycleError::config(
                "Connection string must contain AccountKey or SharedAccessSignature",
            ));
        };

        let blob_endpoint = match explicit_endpoint {
            Some(endpoint) => endpoint,
            None => {
                let protocol = params
                    .get("defaultendpointsprotocol")
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_PROTOCOL);
                let suffix = params
                    .get("endpointsuffix")
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_ENDPOINT_SUFFIX);
                format!("{protocol}://{account_name}.blob.{suffix}")
            }
        };

        Ok(Self {
            account_name,
            auth,
            blob_endpoint,
        })
    }

    /// Whether the endpoint is the public cloud default for this account
    pub fn is_public_endpoint(&self) -> bool {
        self.blob_endpoint
            == format!(
                "{DEFAULT_PROTOCOL}://{}.blob.{DEFAULT_ENDPOINT_SUFFIX}",
                self.account_name
            )
    }
}

/// Account name implied by a blob endpoint.
///
/// `https://demo.blob.core.windows.net` yields `demo`. Path-style endpoints
/// with an IP host, such as the emulator's, yield the first path segment.
pub fn account_from_endpoint(endpoint: &str) -> Result<String> {
    let url = Url::parse(endpoint)?;

    let account = match url.host() {
        Some(Host::Domain(domain)) => domain.split('.').next().map(str::to_string),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string),
        None => None,
    };

    account.filter(|a| !a.is_empty()).ok_or_else(|| {
        LifecycleError::config(format!(
            "Cannot determine the account name from BlobEndpoint '{endpoint}'"
        ))
    })
}

/// Parse a connection string into key-value pairs.
///
/// Keys are lower-cased; values keep everything after the first `=`,
/// so base64 keys and SAS tokens survive intact.
pub fn parse_connection_string(connection_string: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in connection_string.split(';') {
        if let Some((key, value)) = pair.split_once('=') {
            params.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    params
}
