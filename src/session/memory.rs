use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::time::SystemTime;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;

use super::{TransferSession, TransferStream};
use crate::error::{FileError, Result};

struct MemoryObject {
    data: Vec<u8>,
    modified: SystemTime,
}

/// In-process transfer session keeping every object in memory
#[derive(Default)]
pub struct MemorySession {
    objects: RwLock<HashMap<String, MemoryObject>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object
    pub async fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.objects.write().await.insert(
            path.to_string(),
            MemoryObject {
                data: data.into(),
                modified: SystemTime::now(),
            },
        );
    }

    /// Snapshot of an object's bytes
    pub async fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(path).map(|o| o.data.clone())
    }
}

#[async_trait]
impl TransferSession for MemorySession {
    async fn retrieve_from(&self, path: &str, offset: u64) -> Result<TransferStream> {
        let objects = self.objects.read().await;
        let object = objects
            .get(path)
            .ok_or_else(|| FileError::NotFound(path.to_string()))?;
        let start = (offset as usize).min(object.data.len());
        Ok(Box::new(Cursor::new(object.data[start..].to_vec())))
    }

    async fn store_from(
        &self,
        path: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
        offset: u64,
    ) -> Result<()> {
        let mut incoming = Vec::new();
        data.read_to_end(&mut incoming).await?;

        let mut objects = self.objects.write().await;
        let object = objects
            .get_mut(path)
            .ok_or_else(|| FileError::NotFound(path.to_string()))?;

        let offset = offset as usize;
        if offset > object.data.len() {
            return Err(FileError::transport(anyhow::anyhow!(
                "store offset {offset} beyond end of {path} ({} bytes)",
                object.data.len()
            )));
        }

        let end = offset + incoming.len();
        if end > object.data.len() {
            object.data.resize(end, 0);
        }
        object.data[offset..end].copy_from_slice(&incoming);
        object.modified = SystemTime::now();
        Ok(())
    }

    async fn file_size(&self, path: &str) -> Result<u64> {
        let objects = self.objects.read().await;
        objects
            .get(path)
            .map(|o| o.data.len() as u64)
            .ok_or_else(|| FileError::NotFound(path.to_string()))
    }

    async fn modification_time(&self, path: &str) -> Result<SystemTime> {
        let objects = self.objects.read().await;
        objects
            .get(path)
            .map(|o| o.modified)
            .ok_or_else(|| FileError::NotFound(path.to_string()))
    }

    async fn create(&self, path: &str) -> Result<()> {
        self.insert(path, Vec::new()).await;
        Ok(())
    }
}
