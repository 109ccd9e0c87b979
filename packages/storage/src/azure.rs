//! Azure Blob Storage backend.
//!
//! Blob reads, writes, and listings go through `object_store`'s
//! `MicrosoftAzure` store. Container creation and the connection check
//! are plain signed REST calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::{ClientOptions, ObjectStore, RetryConfig};
use reqwest::{Method, StatusCode, Url};

use crate::config::StorageConfig;
use crate::shared_key::{API_VERSION, SharedKeyCredential, http_date};
use crate::{BlobBackend, ContainerCreation, StorageError};

/// Time allowed to establish a TCP/TLS connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed for a whole request, body included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Talks to a real (or emulated) Azure blob service.
#[derive(Debug)]
pub struct AzureBackend {
    config: StorageConfig,
    service_url: Url,
    credential: SharedKeyCredential,
    http: reqwest::Client,
}

impl AzureBackend {
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] for a malformed endpoint or
    /// key, and [`StorageError::Connection`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let service_url = config.service_url()?;
        let credential = SharedKeyCredential::new(&config.account, &config.key)?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::Connection {
                endpoint: service_url.to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            config,
            service_url,
            credential,
            http,
        })
    }

    fn container_url(&self, container: &str) -> Url {
        let mut url = self.service_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(container);
        }
        url
    }

    async fn send_signed(
        &self,
        method: Method,
        url: Url,
    ) -> Result<reqwest::Response, StorageError> {
        let date = http_date(chrono::Utc::now());
        let authorization = self
            .credential
            .authorization(method.as_str(), &url, &date)?;

        self.http
            .request(method, url)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| StorageError::Connection {
                endpoint: self.service_url.to_string(),
                source: Box::new(e),
            })
    }
}

fn error_code(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get("x-ms-error-code")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn status_error(operation: &'static str, status: StatusCode, code: Option<String>) -> StorageError {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        StorageError::Unauthorized { operation, code }
    } else {
        StorageError::Service {
            operation,
            status: status.as_u16(),
            code,
        }
    }
}

#[async_trait]
impl BlobBackend for AzureBackend {
    fn endpoint(&self) -> String {
        self.service_url.as_str().trim_end_matches('/').to_string()
    }

    async fn check_connection(&self) -> Result<(), StorageError> {
        let mut url = self.service_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("");
        }
        url.set_query(Some("comp=list&maxresults=1"));

        let response = self.send_signed(Method::GET, url).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(status_error("list containers", status, error_code(&response)))
    }

    async fn create_container(&self, container: &str) -> ContainerCreation {
        let mut url = self.container_url(container);
        url.set_query(Some("restype=container"));

        let response = match self.send_signed(Method::PUT, url).await {
            Ok(response) => response,
            Err(e) => return ContainerCreation::Failed(e),
        };

        let status = response.status();
        let code = error_code(&response);
        match status {
            s if s.is_success() => ContainerCreation::Created,
            StatusCode::CONFLICT if code.as_deref() == Some("ContainerAlreadyExists") => {
                ContainerCreation::AlreadyExists
            }
            _ => ContainerCreation::Failed(status_error("create container", status, code)),
        }
    }

    async fn container_exists(&self, container: &str) -> Result<bool, StorageError> {
        let mut url = self.container_url(container);
        url.set_query(Some("restype=container"));

        let response = self.send_signed(Method::GET, url).await?;
        let status = response.status();
        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(
                "get container properties",
                status,
                error_code(&response),
            )),
        }
    }

    fn container(&self, container: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let retry = RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        };
        let client_options = ClientOptions::new()
            .with_connect_timeout(CONNECT_TIMEOUT)
            .with_timeout(REQUEST_TIMEOUT)
            .with_allow_http(!self.config.use_https);

        let store = MicrosoftAzureBuilder::new()
            .with_account(&self.config.account)
            .with_access_key(&self.config.key)
            .with_container_name(container)
            .with_endpoint(self.endpoint())
            .with_allow_http(!self.config.use_https)
            .with_retry(retry)
            .with_client_options(client_options)
            .build()
            .map_err(|e| StorageError::InvalidConfig {
                message: format!("cannot build store for container '{container}': {e}"),
            })?;

        Ok(Arc::new(store))
    }

    fn blob_url(&self, container: &str, blob: &str) -> String {
        let mut url = self.container_url(container);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(blob.split('/'));
        }
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    use super::*;
    use crate::StorageClient;

    const OK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const CREATED: &str =
        "HTTP/1.1 201 Created\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const CONTAINER_EXISTS: &str = "HTTP/1.1 409 Conflict\r\n\
        x-ms-error-code: ContainerAlreadyExists\r\n\
        Content-Length: 0\r\nConnection: close\r\n\r\n";
    const BEING_DELETED: &str = "HTTP/1.1 409 Conflict\r\n\
        x-ms-error-code: ContainerBeingDeleted\r\n\
        Content-Length: 0\r\nConnection: close\r\n\r\n";
    const FORBIDDEN: &str = "HTTP/1.1 403 Forbidden\r\n\
        x-ms-error-code: AuthenticationFailed\r\n\
        Content-Length: 0\r\nConnection: close\r\n\r\n";
    const CONTAINER_MISSING: &str = "HTTP/1.1 404 Not Found\r\n\
        x-ms-error-code: ContainerNotFound\r\n\
        Content-Length: 0\r\nConnection: close\r\n\r\n";

    /// Starts a local server answering each connection with the next
    /// canned response, and returns its endpoint.
    async fn serve(responses: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0_u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        format!("http://{addr}/devstoreaccount1")
    }

    fn backend(endpoint: &str) -> AzureBackend {
        AzureBackend::new(StorageConfig {
            endpoint: endpoint.to_string(),
            account: "devstoreaccount1".to_string(),
            key: "dGVzdC1hY2NvdW50LWtleS0wMTIzNDU2Nzg5".to_string(),
            use_https: false,
        })
        .unwrap()
    }

    #[test]
    fn builds_path_style_blob_url() {
        let backend = backend("127.0.0.1:10000/devstoreaccount1");
        assert_eq!(
            backend.blob_url("datasets", "All_Diets.csv"),
            "http://127.0.0.1:10000/devstoreaccount1/datasets/All_Diets.csv"
        );
        assert_eq!(backend.endpoint(), "http://127.0.0.1:10000/devstoreaccount1");
    }

    #[test]
    fn builds_blob_url_on_bare_host() {
        let backend = backend("http://localhost:10000/");
        assert_eq!(
            backend.blob_url("datasets", "nested/file.csv"),
            "http://localhost:10000/datasets/nested/file.csv"
        );
    }

    #[tokio::test]
    async fn existing_container_is_not_an_error() {
        let backend = backend(&serve(vec![CONTAINER_EXISTS]).await);
        let outcome = backend.create_container("datasets").await;
        assert!(matches!(outcome, ContainerCreation::AlreadyExists), "{outcome:?}");
        assert!(!outcome.into_result().unwrap());
    }

    #[tokio::test]
    async fn new_container_is_created() {
        let backend = backend(&serve(vec![CREATED]).await);
        let outcome = backend.create_container("datasets").await;
        assert!(matches!(outcome, ContainerCreation::Created), "{outcome:?}");
    }

    #[tokio::test]
    async fn other_conflicts_fail_container_creation() {
        let backend = backend(&serve(vec![BEING_DELETED]).await);
        let outcome = backend.create_container("datasets").await;
        assert!(
            matches!(
                outcome,
                ContainerCreation::Failed(StorageError::Service { status: 409, .. })
            ),
            "{outcome:?}"
        );
    }

    #[tokio::test]
    async fn rejected_credentials_fail_container_creation() {
        let backend = backend(&serve(vec![FORBIDDEN]).await);
        let outcome = backend.create_container("datasets").await;
        match outcome {
            ContainerCreation::Failed(StorageError::Unauthorized { operation, code }) => {
                assert_eq!(operation, "create container");
                assert_eq!(code.as_deref(), Some("AuthenticationFailed"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_credentials_fail_connection_check() {
        let backend = backend(&serve(vec![FORBIDDEN]).await);
        let err = backend.check_connection().await.unwrap_err();
        assert!(matches!(err, StorageError::Unauthorized { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn reports_container_existence() {
        let backend = backend(&serve(vec![OK, CONTAINER_MISSING]).await);
        assert!(backend.container_exists("datasets").await.unwrap());
        assert!(!backend.container_exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn listing_missing_container_is_not_found() {
        let endpoint = serve(vec![OK, CONTAINER_MISSING]).await;
        let storage = StorageClient::connect_with(Arc::new(backend(&endpoint)))
            .await
            .unwrap();
        let err = storage.list_blobs("missing").await.unwrap_err();
        assert!(
            matches!(
                err,
                StorageError::ContainerNotFound { ref container } if container == "missing"
            ),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_connection_error() {
        let backend = backend("http://127.0.0.1:1/devstoreaccount1");
        let err = backend.check_connection().await.unwrap_err();
        assert!(matches!(err, StorageError::Connection { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_container_creation() {
        let backend = backend("http://127.0.0.1:1/devstoreaccount1");
        let outcome = backend.create_container("datasets").await;
        assert!(matches!(
            outcome,
            ContainerCreation::Failed(StorageError::Connection { .. })
        ));
    }
}
