use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredImage {
    pub url: String,
    pub deletion_key: String,
}

pub trait BlobStore: Send + Sync {
    fn store(&self, bytes: &[u8]) -> Result<StoredImage, AppError>;
    fn delete(&self, deletion_key: &str) -> Result<(), AppError>;
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: DashMap<String, Vec<u8>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn store(&self, bytes: &[u8]) -> Result<StoredImage, AppError> {
        let key = Uuid::new_v4().to_string();
        self.objects.insert(key.clone(), bytes.to_vec());

        Ok(StoredImage {
            url: format!("mem://{key}"),
            deletion_key: key,
        })
    }

    fn delete(&self, deletion_key: &str) -> Result<(), AppError> {
        self.objects
            .remove(deletion_key)
            .map(|_| ())
            .ok_or_else(|| AppError::Storage(format!("blob {deletion_key} not found")))
    }
}
