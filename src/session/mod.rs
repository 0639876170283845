mod http;
mod local;
mod memory;

pub use http::HttpSession;
pub use local::LocalSession;
pub use memory::MemorySession;

use async_trait::async_trait;
use std::time::SystemTime;
use tokio::io::AsyncRead;

use crate::error::Result;

/// Byte stream returned by [`TransferSession::retrieve_from`]
pub type TransferStream = Box<dyn AsyncRead + Send + Unpin>;

/// Trait for offset-addressable transfer against a remote store
///
/// Every call is independent: a stream handed out by `retrieve_from` lives
/// only as long as the caller keeps it.
#[async_trait]
pub trait TransferSession: Send + Sync {
    /// Open a stream over `path` starting at byte `offset`
    async fn retrieve_from(&self, path: &str, offset: u64) -> Result<TransferStream>;

    /// Write everything from `data` into `path` starting at byte `offset`
    async fn store_from(
        &self,
        path: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
        offset: u64,
    ) -> Result<()>;

    /// Current size of the remote object
    async fn file_size(&self, path: &str) -> Result<u64>;

    /// Last modification time of the remote object
    async fn modification_time(&self, path: &str) -> Result<SystemTime>;

    /// Create `path` empty, truncating it if it already exists
    async fn create(&self, path: &str) -> Result<()>;
}
