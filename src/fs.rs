use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::file::RemoteFile;
use crate::instrument::{Instrumentation, MetricsRecorder, Operation};
use crate::session::TransferSession;

/// Entry point for opening remote files over a shared session
///
/// Every handle opened here reports to the same [`Instrumentation`].
pub struct RemoteFs<S: TransferSession> {
    session: Arc<S>,
    instrumentation: Instrumentation,
}

impl<S: TransferSession> RemoteFs<S> {
    pub fn new(session: Arc<S>) -> Self {
        Self {
            session,
            instrumentation: Instrumentation::default(),
        }
    }

    /// Send operation metrics to `recorder` instead of the default counters
    pub fn with_recorder(mut self, recorder: Arc<dyn MetricsRecorder>) -> Self {
        self.instrumentation = Instrumentation::new(recorder);
        self
    }

    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Open an existing remote file at offset 0
    pub async fn open(&self, path: &str) -> Result<RemoteFile<S>> {
        let start = Instant::now();
        let result = self.open_handle(path).await;
        self.instrumentation.observe(Operation::Open, path, start, result)
    }

    /// Create (or truncate) a remote file and open it at offset 0
    pub async fn create(&self, path: &str) -> Result<RemoteFile<S>> {
        let start = Instant::now();
        let result = match self.session.create(path).await {
            Ok(()) => self.open_handle(path).await,
            Err(e) => Err(e),
        };
        self.instrumentation.observe(Operation::Create, path, start, result)
    }

    async fn open_handle(&self, path: &str) -> Result<RemoteFile<S>> {
        // Fails with NotFound when the path does not exist
        self.session.file_size(path).await?;
        let modified = self.session.modification_time(path).await?;
        Ok(RemoteFile::new(
            self.session.clone(),
            path.to_string(),
            Some(modified),
            self.instrumentation.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;
    use crate::instrument::OperationStats;
    use crate::session::MemorySession;

    #[tokio::test]
    async fn test_open_missing_is_instrumented() {
        let stats = Arc::new(OperationStats::new());
        let fs = RemoteFs::new(Arc::new(MemorySession::new())).with_recorder(stats.clone());

        let result = fs.open("/missing.txt").await;
        assert!(matches!(result, Err(FileError::NotFound(_))));
        assert_eq!(stats.failures(Operation::Open), 1);
    }

    #[tokio::test]
    async fn test_create_then_open() {
        let stats = Arc::new(OperationStats::new());
        let fs = RemoteFs::new(Arc::new(MemorySession::new())).with_recorder(stats.clone());

        let file = fs.create("/new.txt").await.unwrap();
        assert_eq!(file.offset(), 0);
        assert!(file.mod_time().is_some());
        assert_eq!(file.size().await.unwrap(), 0);

        fs.open("/new.txt").await.unwrap();
        assert_eq!(stats.successes(Operation::Create), 1);
        assert_eq!(stats.successes(Operation::Open), 1);
        assert_eq!(stats.successes(Operation::Stat), 1);
    }
}
