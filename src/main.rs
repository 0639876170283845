//! Main entry point for the rfile CLI application.
//!
//! This binary exposes remote file handles over a local directory or an
//! HTTP base URL: raw positioned reads, format-aware iteration, writes
//! from stdin, and size/modification-time lookups.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

use rfile::cli::Command;
use rfile::{Cli, FormatToken, HttpSession, LocalSession, RemoteFs, TransferSession, Whence};

/// Chunk size for streaming `cat` output
const CAT_CHUNK_SIZE: usize = 64 * 1024;

/// Application entry point.
///
/// Parses command-line arguments, sets up logging, and dispatches the
/// subcommand against the selected session.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Some(url) = &cli.url {
        let fs = RemoteFs::new(Arc::new(HttpSession::new(url.clone())?));
        run(&fs, &cli.command).await
    } else if let Some(root) = &cli.root {
        let fs = RemoteFs::new(Arc::new(LocalSession::new(root)));
        run(&fs, &cli.command).await
    } else {
        anyhow::bail!("either --root or --url is required")
    }
}

/// Initialize `tracing` output on stderr.
///
/// `RUST_LOG` takes precedence over the `-v` / `-q` flags.
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Run a single subcommand.
async fn run<S: TransferSession>(fs: &RemoteFs<S>, command: &Command) -> Result<()> {
    match command {
        Command::Cat {
            path,
            offset,
            length,
        } => cat(fs, path, *offset, *length).await,
        Command::Iter { path } => iter(fs, path).await,
        Command::Write {
            path,
            offset,
            create,
        } => write(fs, path, *offset, *create).await,
        Command::Stat { path } => stat(fs, path).await,
    }
}

/// Copy bytes of `path` to stdout, starting at `offset`.
///
/// Each chunk is a separate positioned read whose stream is dropped once
/// the chunk is filled, so reading stops close to `length` even when the
/// server sends the rest of the object.
async fn cat<S: TransferSession>(
    fs: &RemoteFs<S>,
    path: &str,
    offset: u64,
    length: Option<u64>,
) -> Result<()> {
    let mut file = fs.open(path).await?;
    if offset > 0 {
        file.seek(offset as i64, Whence::Start.into()).await?;
    }

    let mut stdout = tokio::io::stdout();
    let mut remaining = length.unwrap_or(u64::MAX);
    let mut buf = vec![0u8; CAT_CHUNK_SIZE];

    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = file.read(&mut buf[..want]).await?;
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n]).await?;
        remaining -= n as u64;
    }

    stdout.flush().await?;
    file.close().await?;
    Ok(())
}

/// Print every record produced by the file's format reader.
async fn iter<S: TransferSession>(fs: &RemoteFs<S>, path: &str) -> Result<()> {
    let mut file = fs.open(path).await?;
    let mut reader = file.read_all().await?;

    while reader.next().await {
        if reader.format() == FormatToken::Text {
            let mut line = String::new();
            reader.scan(&mut line).await?;
            println!("{line}");
        } else {
            let mut value = serde_json::Value::Null;
            reader.scan(&mut value).await?;
            println!("{value}");
        }
    }

    file.close().await?;
    Ok(())
}

/// Store stdin into `path` at `offset`.
async fn write<S: TransferSession>(
    fs: &RemoteFs<S>,
    path: &str,
    offset: u64,
    create: bool,
) -> Result<()> {
    let mut file = if create {
        fs.create(path).await?
    } else {
        fs.open(path).await?
    };
    if offset > 0 {
        file.seek(offset as i64, Whence::Start.into()).await?;
    }

    let mut data = Vec::new();
    tokio::io::stdin().read_to_end(&mut data).await?;

    let n = file.write(&data).await?;
    tracing::info!("Wrote {} bytes to {} at offset {}", n, path, offset);

    file.close().await?;
    Ok(())
}

/// Print size and modification time of `path`.
async fn stat<S: TransferSession>(fs: &RemoteFs<S>, path: &str) -> Result<()> {
    let file = fs.open(path).await?;
    let size = file.size().await?;

    let modified = file
        .mod_time()
        .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339())
        .unwrap_or_else(|| "-".to_string());

    println!("{:>12}  {}  {}", size, modified, file.name());

    file.close().await?;
    Ok(())
}
