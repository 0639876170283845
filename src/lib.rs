//! # rfile
//!
//! Random-access remote file handles over offset-addressable transfer
//! sessions, with format-aware sequential readers.
//!
//! A [`RemoteFile`] behaves like a local file: positioned reads and writes,
//! and seeks that are checked against the remote object's real size. Each
//! call opens a short-lived stream at the requested offset through a
//! [`TransferSession`], so no connection state is cached in the handle.
//!
//! ## Features
//!
//! - `read` / `read_at` / `write` / `write_at` / `seek` on remote files
//! - Strict seek bounds: targets outside `[0, size]` are rejected
//! - [`RemoteFile::read_all`] picks a reader by extension and content:
//!   JSON arrays element by element, a single JSON value in one scan, or
//!   text line by line
//! - Sessions for local directories, HTTP Range servers and memory
//! - Every operation is logged through `tracing` and timed through a
//!   [`MetricsRecorder`]
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rfile::{LocalSession, RemoteFs};
//!
//! #[derive(serde::Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fs = RemoteFs::new(Arc::new(LocalSession::new("/srv/data")));
//!
//!     let mut file = fs.open("users.json").await?;
//!     let mut reader = file.read_all().await?;
//!     while reader.next().await {
//!         let mut user = User { name: String::new() };
//!         reader.scan(&mut user).await?;
//!         println!("{}", user.name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod file;
pub mod fs;
pub mod instrument;
pub mod session;

pub use cli::Cli;
pub use error::{FileError, Result};
pub use file::{FormatReader, FormatToken, RemoteFile, Whence};
pub use fs::RemoteFs;
pub use instrument::{Instrumentation, MetricsRecorder, Operation, OperationStats, Status};
pub use session::{HttpSession, LocalSession, MemorySession, TransferSession, TransferStream};
