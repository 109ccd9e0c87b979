#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Blob storage adapter for the recipe dataset.
//!
//! Downloads the dataset blob, uploads local files (creating the target
//! container idempotently), and lists container contents. The wire
//! protocol is Azure Blob Storage, usually a local emulator.
//!
//! No operation retries internally: a failed round trip surfaces as a
//! [`StorageError`] straight away.
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `AZURE_STORAGE_CONNECTION_STRING` | No | Full connection string; overrides the variables below |
//! | `AZURE_STORAGE_ENDPOINT` | Yes* | Blob service endpoint (e.g. `127.0.0.1:10000/devstoreaccount1`) |
//! | `AZURE_STORAGE_ACCOUNT` | Yes* | Storage account name |
//! | `AZURE_STORAGE_KEY` | Yes* | Base64 shared key |
//! | `AZURE_STORAGE_USE_HTTPS` | No | `true` to use `https` (default `false`) |
//!
//! \* Unless a connection string is given.

pub mod azure;
pub mod config;
pub mod memory;
pub mod shared_key;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt as _;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectStore, PutMode, PutOptions,
    PutPayload, path::Path as ObjectPath,
};

pub use azure::AzureBackend;
pub use config::StorageConfig;
pub use memory::MemoryBackend;

/// Errors that can occur during blob storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Missing required environment variable.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: String,
    },

    /// Connection settings are malformed or inconsistent.
    #[error("Invalid storage configuration: {message}")]
    InvalidConfig {
        /// What is wrong.
        message: String,
    },

    /// Container or blob name rejected before any request was made.
    #[error("Invalid {kind} name '{name}': {reason}")]
    InvalidName {
        /// `container` or `blob`.
        kind: &'static str,
        /// The rejected name.
        name: String,
        /// Which rule it breaks.
        reason: &'static str,
    },

    /// The service could not be reached.
    #[error("Cannot reach blob service at {endpoint}: {source}")]
    Connection {
        /// Endpoint that was contacted.
        endpoint: String,
        /// Underlying transport error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The service rejected the account credentials.
    #[error("Blob service rejected credentials for {operation}{}", code_suffix(.code))]
    Unauthorized {
        /// Operation that was attempted.
        operation: &'static str,
        /// `x-ms-error-code`, when the service sent one.
        code: Option<String>,
    },

    /// The container does not exist.
    #[error("Container '{container}' not found")]
    ContainerNotFound {
        /// Container name.
        container: String,
    },

    /// The blob (or its container) does not exist.
    #[error("Blob {container}/{blob} not found")]
    BlobNotFound {
        /// Container name.
        container: String,
        /// Blob name.
        blob: String,
    },

    /// Upload without overwrite hit an existing blob.
    #[error("Blob {container}/{blob} already exists")]
    BlobExists {
        /// Container name.
        container: String,
        /// Blob name.
        blob: String,
    },

    /// Unexpected status from the service.
    #[error("Blob service returned {status} for {operation}{}", code_suffix(.code))]
    Service {
        /// Operation that was attempted.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// `x-ms-error-code`, when the service sent one.
        code: Option<String>,
    },

    /// A blob request failed for another reason.
    #[error("Failed to {operation} {target}: {source}")]
    Request {
        /// Operation that was attempted.
        operation: &'static str,
        /// `container/blob` or container name.
        target: String,
        /// Underlying store error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O error reading a local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[allow(clippy::ref_option)]
fn code_suffix(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default()
}

/// A blob location: container plus blob name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobReference {
    /// Container name.
    pub container: String,
    /// Blob name within the container; may contain `/`.
    pub blob: String,
}

impl BlobReference {
    /// Reference to `blob` inside `container`.
    #[must_use]
    pub fn new(container: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            blob: blob.into(),
        }
    }

    fn path(&self) -> ObjectPath {
        ObjectPath::from(self.blob.as_str())
    }
}

impl std::fmt::Display for BlobReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container, self.blob)
    }
}

/// One entry of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    /// Blob name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last write time reported by the service.
    pub last_modified: DateTime<Utc>,
}

/// Blob properties as reported after an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobProperties {
    /// Blob name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// `Content-Type` stored with the blob, if any.
    pub content_type: Option<String>,
    /// Last write time reported by the service.
    pub last_modified: DateTime<Utc>,
}

/// Outcome of an idempotent create-container call.
#[derive(Debug)]
pub enum ContainerCreation {
    /// The container did not exist and was created.
    Created,
    /// The container was already there. Not an error.
    AlreadyExists,
    /// The service rejected the request or could not be reached.
    Failed(StorageError),
}

impl ContainerCreation {
    /// Collapses the outcome to a result, treating an existing container as
    /// success.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error for [`ContainerCreation::Failed`].
    pub fn into_result(self) -> Result<bool, StorageError> {
        match self {
            Self::Created => Ok(true),
            Self::AlreadyExists => Ok(false),
            Self::Failed(e) => Err(e),
        }
    }
}

/// Transport behind a [`StorageClient`].
#[async_trait]
pub trait BlobBackend: Send + Sync + std::fmt::Debug {
    /// Service endpoint, for log messages.
    fn endpoint(&self) -> String;

    /// Makes one cheap authenticated round trip.
    async fn check_connection(&self) -> Result<(), StorageError>;

    async fn create_container(&self, container: &str) -> ContainerCreation;

    /// Whether `container` exists.
    ///
    /// # Errors
    ///
    /// Returns transport or authorization failures. A missing container is
    /// `Ok(false)`, not an error.
    async fn container_exists(&self, container: &str) -> Result<bool, StorageError>;

    /// Object store scoped to one container.
    ///
    /// # Errors
    ///
    /// Backends that know their containers up front may return
    /// [`StorageError::ContainerNotFound`].
    fn container(&self, container: &str) -> Result<Arc<dyn ObjectStore>, StorageError>;

    fn blob_url(&self, container: &str, blob: &str) -> String;
}

/// Client for the blob service.
#[derive(Debug, Clone)]
pub struct StorageClient {
    backend: Arc<dyn BlobBackend>,
}

impl StorageClient {
    /// Connects to the service described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the endpoint is unreachable,
    /// [`StorageError::Unauthorized`] if the credentials are rejected, and
    /// [`StorageError::InvalidConfig`] for malformed settings.
    pub async fn connect(config: StorageConfig) -> Result<Self, StorageError> {
        let backend = AzureBackend::new(config)?;
        Self::connect_with(Arc::new(backend)).await
    }

    /// Connects using [`StorageConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingEnv`] if a required variable is unset,
    /// plus everything [`StorageClient::connect`] can return.
    pub async fn connect_from_env() -> Result<Self, StorageError> {
        Self::connect(StorageConfig::from_env()?).await
    }

    /// Checks that `backend` is reachable and wraps it in a client.
    ///
    /// # Errors
    ///
    /// Returns whatever the connection check fails with.
    pub async fn connect_with(backend: Arc<dyn BlobBackend>) -> Result<Self, StorageError> {
        log::info!("Connecting to blob service at {}", backend.endpoint());
        backend.check_connection().await?;
        log::debug!("Blob service reachable");
        Ok(Self { backend })
    }

    /// A client over a fresh [`MemoryBackend`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(MemoryBackend::new()),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        self.backend.endpoint()
    }

    #[must_use]
    pub fn blob_url(&self, reference: &BlobReference) -> String {
        self.backend.blob_url(&reference.container, &reference.blob)
    }

    /// Creates `container` unless it already exists.
    pub async fn create_container(&self, container: &str) -> ContainerCreation {
        if let Err(e) = validate_container_name(container) {
            return ContainerCreation::Failed(e);
        }
        self.backend.create_container(container).await
    }

    // ── Blob transfer ───────────────────────────────────────────────

    /// Downloads a blob's full contents.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BlobNotFound`] if the container or blob is
    /// absent, [`StorageError::Request`] on transport failures.
    pub async fn download(&self, reference: &BlobReference) -> Result<Vec<u8>, StorageError> {
        validate(reference)?;
        log::info!("Downloading {reference}");

        let store = self.store_for(reference)?;
        let result = store
            .get(&reference.path())
            .await
            .map_err(|e| map_store_error("download", reference, e))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|e| map_store_error("download", reference, e))?;

        #[allow(clippy::cast_precision_loss)] // display-only
        let kib = bytes.len() as f64 / 1024.0;
        log::info!("Downloaded {reference} ({kib:.1} KiB)");

        Ok(bytes.to_vec())
    }

    /// Uploads `bytes` to a blob, creating the container first if needed.
    ///
    /// With `overwrite = false` an existing blob is left alone and
    /// [`StorageError::BlobExists`] is returned.
    ///
    /// # Errors
    ///
    /// Returns the container-creation failure if creation fails for any
    /// reason other than the container already existing, or the put
    /// failure otherwise.
    pub async fn upload(
        &self,
        reference: &BlobReference,
        bytes: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        validate(reference)?;

        match self.create_container(&reference.container).await {
            ContainerCreation::Created => {
                log::info!("Created container '{}'", reference.container);
            }
            ContainerCreation::AlreadyExists => {
                log::debug!("Container '{}' already exists", reference.container);
            }
            ContainerCreation::Failed(e) => return Err(e),
        }

        let size = bytes.len();
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type_for(&reference.blob)),
        );
        let mode = if overwrite {
            PutMode::Overwrite
        } else {
            PutMode::Create
        };
        let mut options = PutOptions::from(mode);
        options.attributes = attributes;

        let store = self.store_for(reference)?;
        store
            .put_opts(&reference.path(), PutPayload::from(bytes), options)
            .await
            .map_err(|e| map_store_error("upload", reference, e))?;

        log::info!("Uploaded {reference} ({size} bytes)");
        Ok(())
    }

    /// Reads a local file and uploads it.
    ///
    /// Returns the number of bytes uploaded.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be read, plus
    /// everything [`StorageClient::upload`] can return.
    pub async fn upload_file(
        &self,
        path: &Path,
        reference: &BlobReference,
        overwrite: bool,
    ) -> Result<u64, StorageError> {
        let bytes = tokio::fs::read(path).await?;
        let size = bytes.len() as u64;
        log::info!("Uploading {} to {reference}", path.display());
        self.upload(reference, bytes, overwrite).await?;
        Ok(size)
    }

    // ── Inspection ──────────────────────────────────────────────────

    /// Fetches a blob's size, content type, and modification time.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BlobNotFound`] if the blob is absent.
    pub async fn properties(
        &self,
        reference: &BlobReference,
    ) -> Result<BlobProperties, StorageError> {
        validate(reference)?;
        let store = self.store_for(reference)?;
        let options = GetOptions {
            head: true,
            ..GetOptions::default()
        };
        let result = store
            .get_opts(&reference.path(), options)
            .await
            .map_err(|e| map_store_error("get properties of", reference, e))?;

        let content_type = result.attributes.get(&Attribute::ContentType).map(|value| {
            let text: &str = value.as_ref();
            text.to_string()
        });

        Ok(BlobProperties {
            name: reference.blob.clone(),
            size: result.meta.size,
            content_type,
            last_modified: result.meta.last_modified,
        })
    }

    /// Lists every blob in `container`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ContainerNotFound`] if the container is
    /// absent.
    pub async fn list_blobs(&self, container: &str) -> Result<Vec<BlobMetadata>, StorageError> {
        validate_container_name(container)?;
        if !self.backend.container_exists(container).await? {
            return Err(StorageError::ContainerNotFound {
                container: container.to_string(),
            });
        }
        let store = self.backend.container(container)?;

        let listed = store
            .list(None)
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| match e {
                object_store::Error::NotFound { .. } => StorageError::ContainerNotFound {
                    container: container.to_string(),
                },
                other => StorageError::Request {
                    operation: "list",
                    target: container.to_string(),
                    source: Box::new(other),
                },
            })?;

        let mut blobs: Vec<BlobMetadata> = listed
            .into_iter()
            .map(|meta| BlobMetadata {
                name: meta.location.to_string(),
                size: meta.size,
                last_modified: meta.last_modified,
            })
            .collect();
        blobs.sort_by(|a, b| a.name.cmp(&b.name));

        log::debug!("Listed {} blob(s) in '{container}'", blobs.len());
        Ok(blobs)
    }

    fn store_for(&self, reference: &BlobReference) -> Result<Arc<dyn ObjectStore>, StorageError> {
        self.backend
            .container(&reference.container)
            .map_err(|e| match e {
                StorageError::ContainerNotFound { .. } => StorageError::BlobNotFound {
                    container: reference.container.clone(),
                    blob: reference.blob.clone(),
                },
                other => other,
            })
    }
}

fn map_store_error(
    operation: &'static str,
    reference: &BlobReference,
    err: object_store::Error,
) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::BlobNotFound {
            container: reference.container.clone(),
            blob: reference.blob.clone(),
        },
        object_store::Error::AlreadyExists { .. } => StorageError::BlobExists {
            container: reference.container.clone(),
            blob: reference.blob.clone(),
        },
        object_store::Error::Unauthenticated { .. }
        | object_store::Error::PermissionDenied { .. } => StorageError::Unauthorized {
            operation,
            code: None,
        },
        other => StorageError::Request {
            operation,
            target: reference.to_string(),
            source: Box::new(other),
        },
    }
}

/// Content type recorded on upload, chosen by file extension.
#[must_use]
pub fn content_type_for(blob: &str) -> &'static str {
    let extension = Path::new(blob)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn validate(reference: &BlobReference) -> Result<(), StorageError> {
    validate_container_name(&reference.container)?;
    validate_blob_name(&reference.blob)
}

/// Checks Azure's container naming rules: 3-63 characters of lowercase
/// letters, digits, and single hyphens, starting and ending alphanumeric.
///
/// # Errors
///
/// Returns [`StorageError::InvalidName`] naming the broken rule.
pub fn validate_container_name(name: &str) -> Result<(), StorageError> {
    let reject = |reason| StorageError::InvalidName {
        kind: "container",
        name: name.to_string(),
        reason,
    };

    if !(3..=63).contains(&name.len()) {
        return Err(reject("must be 3-63 characters"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(reject("only lowercase letters, digits, and hyphens are allowed"));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(reject("must start and end with a letter or digit"));
    }
    if name.contains("--") {
        return Err(reject("consecutive hyphens are not allowed"));
    }
    Ok(())
}

fn validate_blob_name(name: &str) -> Result<(), StorageError> {
    let reject = |reason| StorageError::InvalidName {
        kind: "blob",
        name: name.to_string(),
        reason,
    };

    if name.is_empty() || name.len() > 1024 {
        return Err(reject("must be 1-1024 characters"));
    }
    if name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        return Err(reject("path segments must be non-empty"));
    }
    Ok(())
}
