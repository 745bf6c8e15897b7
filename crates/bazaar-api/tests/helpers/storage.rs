//! Storage double that parks every upload until the test opens the gate.

#![allow(dead_code)]

use async_trait::async_trait;
use bazaar_storage::{Storage, StorageBackend, StorageResult};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub struct GatedStorage {
    inner: Arc<dyn Storage>,
    gate: Arc<Semaphore>,
}

impl GatedStorage {
    /// Wrap `inner`; returns the storage and the gate that releases it.
    pub fn wrap(inner: Arc<dyn Storage>) -> (Arc<dyn Storage>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let storage = Arc::new(Self {
            inner,
            gate: gate.clone(),
        });
        (storage, gate)
    }
}

#[async_trait]
impl Storage for GatedStorage {
    async fn put(
        &self,
        object_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        let _permit = self.gate.acquire().await.expect("gate closed");
        self.inner.put(object_name, content_type, data).await
    }

    async fn delete(&self, object_name: &str) -> StorageResult<()> {
        self.inner.delete(object_name).await
    }

    fn public_url(&self, object_name: &str) -> String {
        self.inner.public_url(object_name)
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
