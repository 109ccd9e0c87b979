//! Connection settings for the blob service.
//!
//! The recognized options are exactly `endpoint`, `account`, `key`, and
//! `use_https`. Nothing is compiled in: settings come from the environment
//! or from an Azure connection string.

use reqwest::Url;

use crate::StorageError;

/// Environment variable holding a full Azure connection string.
pub const CONNECTION_STRING_ENV: &str = "AZURE_STORAGE_CONNECTION_STRING";
/// Environment variable holding the blob service endpoint.
pub const ENDPOINT_ENV: &str = "AZURE_STORAGE_ENDPOINT";
/// Environment variable holding the storage account name.
pub const ACCOUNT_ENV: &str = "AZURE_STORAGE_ACCOUNT";
/// Environment variable holding the base64 shared key.
pub const KEY_ENV: &str = "AZURE_STORAGE_KEY";
/// Environment variable selecting `https` (default `false`).
pub const USE_HTTPS_ENV: &str = "AZURE_STORAGE_USE_HTTPS";

/// Blob service connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Blob service URL, with or without scheme
    /// (e.g. `127.0.0.1:10000/devstoreaccount1`).
    pub endpoint: String,
    /// Storage account name.
    pub account: String,
    /// Base64 shared key for the account.
    pub key: String,
    /// Whether to talk `https` to the endpoint.
    pub use_https: bool,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("account", &self.account)
            .field("key", &"<redacted>")
            .field("use_https", &self.use_https)
            .finish()
    }
}

impl StorageConfig {
    /// Reads the configuration from the environment.
    ///
    /// [`CONNECTION_STRING_ENV`] wins if set. Otherwise [`ENDPOINT_ENV`],
    /// [`ACCOUNT_ENV`], and [`KEY_ENV`] are required and [`USE_HTTPS_ENV`]
    /// is optional.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingEnv`] if a required variable is unset
    /// and [`StorageError::InvalidConfig`] if a value is malformed.
    pub fn from_env() -> Result<Self, StorageError> {
        if let Ok(connection_string) = std::env::var(CONNECTION_STRING_ENV) {
            return Self::from_connection_string(&connection_string);
        }

        let use_https = match std::env::var(USE_HTTPS_ENV) {
            Ok(raw) => parse_bool(&raw).ok_or_else(|| StorageError::InvalidConfig {
                message: format!("{USE_HTTPS_ENV} must be true or false, got '{raw}'"),
            })?,
            Err(_) => false,
        };

        let config = Self {
            endpoint: require_env(ENDPOINT_ENV)?,
            account: require_env(ACCOUNT_ENV)?,
            key: require_env(KEY_ENV)?,
            use_https,
        };
        config.service_url()?;
        Ok(config)
    }

    /// Parses an Azure connection string
    /// (`DefaultEndpointsProtocol=...;AccountName=...;AccountKey=...;BlobEndpoint=...`).
    ///
    /// Unknown keys are ignored. Without `BlobEndpoint` the public cloud
    /// endpoint for the account is used.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if `AccountName` or
    /// `AccountKey` is missing or the resulting endpoint is unusable.
    pub fn from_connection_string(connection_string: &str) -> Result<Self, StorageError> {
        let mut protocol = None;
        let mut account = None;
        let mut key = None;
        let mut blob_endpoint = None;
        let mut suffix = None;

        for part in connection_string.split(';').map(str::trim) {
            let Some((name, value)) = part.split_once('=') else {
                continue;
            };
            match name {
                "DefaultEndpointsProtocol" => protocol = Some(value.to_string()),
                "AccountName" => account = Some(value.to_string()),
                "AccountKey" => key = Some(value.to_string()),
                "BlobEndpoint" => blob_endpoint = Some(value.to_string()),
                "EndpointSuffix" => suffix = Some(value.to_string()),
                _ => {}
            }
        }

        let missing = |field: &str| StorageError::InvalidConfig {
            message: format!("connection string is missing {field}"),
        };
        let account = account.ok_or_else(|| missing("AccountName"))?;
        let key = key.ok_or_else(|| missing("AccountKey"))?;

        let endpoint = blob_endpoint.unwrap_or_else(|| {
            let scheme = protocol.as_deref().unwrap_or("https");
            let suffix = suffix.as_deref().unwrap_or("core.windows.net");
            format!("{scheme}://{account}.blob.{suffix}")
        });
        let use_https = match endpoint.split_once("://") {
            Some((scheme, _)) => scheme.eq_ignore_ascii_case("https"),
            None => protocol.is_none_or(|p| p.eq_ignore_ascii_case("https")),
        };

        let config = Self {
            endpoint,
            account,
            key,
            use_https,
        };
        config.service_url()?;
        Ok(config)
    }

    /// The blob service URL, without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the endpoint does not
    /// parse, or if its scheme disagrees with `use_https`.
    pub fn service_url(&self) -> Result<Url, StorageError> {
        let scheme = if self.use_https { "https" } else { "http" };
        let trimmed = self.endpoint.trim().trim_end_matches('/');
        let raw = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("{scheme}://{trimmed}")
        };

        let url = Url::parse(&raw).map_err(|e| StorageError::InvalidConfig {
            message: format!("invalid endpoint '{}': {e}", self.endpoint),
        })?;

        if url.scheme() != scheme {
            return Err(StorageError::InvalidConfig {
                message: format!(
                    "endpoint '{}' uses {} but use_https is {}",
                    self.endpoint,
                    url.scheme(),
                    self.use_https
                ),
            });
        }
        if url.cannot_be_a_base() || url.host().is_none() {
            return Err(StorageError::InvalidConfig {
                message: format!("endpoint '{}' has no host", self.endpoint),
            });
        }

        Ok(url)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Reads a required environment variable.
fn require_env(name: &str) -> Result<String, StorageError> {
    std::env::var(name).map_err(|_| StorageError::MissingEnv {
        name: name.to_string(),
    })
}
