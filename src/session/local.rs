use async_trait::async_trait;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWriteExt};

use super::{TransferSession, TransferStream};
use crate::error::{FileError, Result};

/// Transfer session over a local directory tree
///
/// Remote paths are resolved under `root`; absolute paths are taken
/// relative to it and `..` components are rejected.
pub struct LocalSession {
    root: PathBuf,
}

impl LocalSession {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(FileError::invalid(format!("path escapes session root: {path}")));
                }
            }
        }
        Ok(resolved)
    }
}

/// Map an I/O error on `path`, keeping missing files distinguishable
fn map_io(path: &str, err: std::io::Error) -> FileError {
    if err.kind() == ErrorKind::NotFound {
        FileError::NotFound(path.to_string())
    } else {
        FileError::transport(err)
    }
}

#[async_trait]
impl TransferSession for LocalSession {
    async fn retrieve_from(&self, path: &str, offset: u64) -> Result<TransferStream> {
        let full = self.resolve(path)?;
        let mut file = File::open(&full).await.map_err(|e| map_io(path, e))?;
        file.seek(SeekFrom::Start(offset)).await?;
        Ok(Box::new(file))
    }

    async fn store_from(
        &self,
        path: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
        offset: u64,
    ) -> Result<()> {
        let full = self.resolve(path)?;
        let mut file = OpenOptions::new()
            .write(true)
            .open(&full)
            .await
            .map_err(|e| map_io(path, e))?;

        let len = file.metadata().await?.len();
        if offset > len {
            return Err(FileError::transport(anyhow::anyhow!(
                "store offset {offset} beyond end of {path} ({len} bytes)"
            )));
        }

        file.seek(SeekFrom::Start(offset)).await?;
        tokio::io::copy(data, &mut file).await?;
        file.flush().await?;
        Ok(())
    }

    async fn file_size(&self, path: &str) -> Result<u64> {
        let full = self.resolve(path)?;
        let metadata = tokio::fs::metadata(&full).await.map_err(|e| map_io(path, e))?;
        Ok(metadata.len())
    }

    async fn modification_time(&self, path: &str) -> Result<SystemTime> {
        let full = self.resolve(path)?;
        let metadata = tokio::fs::metadata(&full).await.map_err(|e| map_io(path, e))?;
        Ok(metadata.modified()?)
    }

    async fn create(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        File::create(&full).await.map_err(|e| map_io(path, e))?;
        Ok(())
    }
}
