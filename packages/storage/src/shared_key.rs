//! Azure `SharedKey` request signing for the REST calls `object_store`
//! does not cover (container creation and the connection check).

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;

use crate::StorageError;

/// Service version sent with every signed request.
pub const API_VERSION: &str = "2021-08-06";

type HmacSha256 = Hmac<Sha256>;

/// Account name plus decoded account key.
#[derive(Clone)]
pub struct SharedKeyCredential {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeyCredential")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SharedKeyCredential {
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if `key` is not valid base64.
    pub fn new(account: &str, key: &str) -> Result<Self, StorageError> {
        let key = STANDARD
            .decode(key.trim())
            .map_err(|e| StorageError::InvalidConfig {
                message: format!("account key is not valid base64: {e}"),
            })?;
        Ok(Self {
            account: account.to_string(),
            key,
        })
    }

    /// Builds the `Authorization` header value for a bodiless request.
    ///
    /// `date` must be the exact value sent as `x-ms-date`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the key cannot seed the MAC.
    pub fn authorization(&self, method: &str, url: &Url, date: &str) -> Result<String, StorageError> {
        let payload = string_to_sign(&self.account, method, url, date);
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|e| StorageError::InvalidConfig {
                message: format!("unusable account key: {e}"),
            })?;
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        Ok(format!("SharedKey {}:{signature}", self.account))
    }
}

/// Formats a timestamp as an RFC 1123 `x-ms-date` value.
#[must_use]
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// The canonical string for a request with no body and no standard headers.
///
/// Only `x-ms-date` and `x-ms-version` are canonicalized, which is all the
/// signed calls in this crate send.
fn string_to_sign(account: &str, method: &str, url: &Url, date: &str) -> String {
    // Content-Encoding through Range: twelve header slots, all empty.
    // A zero Content-Length signs as empty too.
    let mut out = String::from(method);
    out.push_str(&"\n".repeat(12));
    out.push_str("x-ms-date:");
    out.push_str(date);
    out.push_str("\nx-ms-version:");
    out.push_str(API_VERSION);
    out.push('\n');
    out.push_str(&canonical_resource(account, url));
    out
}

fn canonical_resource(account: &str, url: &Url) -> String {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in url.query_pairs() {
        params
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into_owned());
    }

    let mut out = format!("/{account}{}", url.path());
    for (name, mut values) in params {
        values.sort();
        out.push('\n');
        out.push_str(&name);
        out.push(':');
        out.push_str(&values.join(","));
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const KEY: &str = "dGVzdC1hY2NvdW50LWtleS0wMTIzNDU2Nzg5";
    const DATE: &str = "Fri, 16 Oct 2026 12:00:00 GMT";

    fn credential() -> SharedKeyCredential {
        SharedKeyCredential::new("devstoreaccount1", KEY).unwrap()
    }

    #[test]
    fn formats_http_date() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(http_date(at), DATE);
    }

    #[test]
    fn canonicalizes_sorted_query() {
        let url = Url::parse("http://127.0.0.1:10000/devstoreaccount1/?maxresults=1&comp=list")
            .unwrap();
        assert_eq!(
            canonical_resource("devstoreaccount1", &url),
            "/devstoreaccount1/devstoreaccount1/\ncomp:list\nmaxresults:1"
        );
    }

    #[test]
    fn signs_create_container() {
        let url =
            Url::parse("http://127.0.0.1:10000/devstoreaccount1/datasets?restype=container")
                .unwrap();
        assert_eq!(
            credential().authorization("PUT", &url, DATE).unwrap(),
            "SharedKey devstoreaccount1:3BR4frMfHJ3GyFLM5TFmYiidA5XNlwzIPMDzY3MFOmI="
        );
    }

    #[test]
    fn signs_list_containers_request() {
        let url =
            Url::parse("http://127.0.0.1:10000/devstoreaccount1/?comp=list&maxresults=1")
                .unwrap();
        assert_eq!(
            credential().authorization("GET", &url, DATE).unwrap(),
            "SharedKey devstoreaccount1:dmegP2y7jzwkPjA4GngmH1l4MYjNiMUcwNyNf8dag2o="
        );
    }

    #[test]
    fn rejects_non_base64_key() {
        let err = SharedKeyCredential::new("acct", "not base64!").unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfig { .. }));
    }
}
