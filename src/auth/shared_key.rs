//! Shared Key authorization for the Blob service REST API
//!
//! Builds the canonical string-to-sign for a request and signs it with
//! HMAC-SHA256 using the decoded account key.

use crate::error::{LifecycleError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use reqwest::Method;
use sha2::Sha256;
use std::collections::BTreeMap;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Standard headers in the order the service expects them in the string-to-sign
const SIGNED_STANDARD_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

/// Signs requests on behalf of one storage account
pub struct SharedKeySigner {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeySigner")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SharedKeySigner {
    /// Create a signer from the account name and its base64-encoded key
    pub fn new(account: impl Into<String>, account_key: &str) -> Result<Self> {
        let key = STANDARD
            .decode(account_key.trim())
            .map_err(|e| LifecycleError::signing(format!("Account key is not valid base64: {e}")))?;

        Ok(Self {
            account: account.into(),
            key,
        })
    }

    /// Build the string-to-sign for a request
    pub fn string_to_sign(&self, method: &Method, url: &Url, headers: &HeaderMap) -> String {
        let mut parts = Vec::with_capacity(SIGNED_STANDARD_HEADERS.len() + 1);
        parts.push(method.as_str().to_string());

        for name in SIGNED_STANDARD_HEADERS {
            let value = header_value(headers, name);
            // A zero Content-Length is signed as an empty string
            if name == "content-length" && value == "0" {
                parts.push(String::new());
            } else {
                parts.push(value);
            }
        }

        let mut string_to_sign = parts.join("\n");
        string_to_sign.push('\n');
        string_to_sign.push_str(&self.canonicalized_headers(headers));
        string_to_sign.push_str(&self.canonicalized_resource(url));
        string_to_sign
    }

    /// Compute the `Authorization` header value for a request
    pub fn authorization(&self, method: &Method, url: &Url, headers: &HeaderMap) -> Result<String> {
        let string_to_sign = self.string_to_sign(method, url, headers);

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| LifecycleError::signing(format!("Invalid signing key: {e}")))?;
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Ok(format!("SharedKey {}:{}", self.account, signature))
    }

    fn canonicalized_headers(&self, headers: &HeaderMap) -> String {
        let mut ms_headers: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (name, value) in headers {
            let name = name.as_str().to_lowercase();
            if !name.starts_with("x-ms-") {
                continue;
            }
            let value = value.to_str().unwrap_or_default().trim().to_string();
            ms_headers.entry(name).or_default().push(value);
        }

        ms_headers
            .into_iter()
            .map(|(name, values)| format!("{}:{}\n", name, values.join(",")))
            .collect()
    }

    fn canonicalized_resource(&self, url: &Url) -> String {
        let mut resource = format!("/{}{}", self.account, url.path());

        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in url.query_pairs() {
            params
                .entry(key.to_lowercase())
                .or_default()
                .push(value.into_owned());
        }

        for (key, mut values) in params {
            values.sort();
            resource.push('\n');
            resource.push_str(&key);
            resource.push(':');
            resource.push_str(&values.join(","));
        }

        resource
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
