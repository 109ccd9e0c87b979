//! In-process backend holding one [`InMemory`] store per container.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use object_store::ObjectStore;
use object_store::memory::InMemory;

use crate::{BlobBackend, ContainerCreation, StorageError};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    containers: Mutex<BTreeMap<String, Arc<InMemory>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobBackend for MemoryBackend {
    fn endpoint(&self) -> String {
        "memory://".to_string()
    }

    async fn check_connection(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn create_container(&self, container: &str) -> ContainerCreation {
        let mut containers = self
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if containers.contains_key(container) {
            return ContainerCreation::AlreadyExists;
        }
        containers.insert(container.to_string(), Arc::new(InMemory::new()));
        ContainerCreation::Created
    }

    async fn container_exists(&self, container: &str) -> Result<bool, StorageError> {
        let containers = self
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(containers.contains_key(container))
    }

    fn container(&self, container: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let containers = self
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        containers
            .get(container)
            .map(|store| Arc::clone(store) as Arc<dyn ObjectStore>)
            .ok_or_else(|| StorageError::ContainerNotFound {
                container: container.to_string(),
            })
    }

    fn blob_url(&self, container: &str, blob: &str) -> String {
        format!("memory://{container}/{blob}")
    }
}
