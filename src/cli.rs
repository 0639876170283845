use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rfile")]
#[command(version)]
#[command(about = "Random-access remote files over local directories or HTTP", long_about = None)]
#[command(after_help = "Examples:\n  \
  rfile --root /srv/data cat notes.txt --offset 10 --length 32\n  \
  rfile --url https://example.com/files iter users.json\n  \
  echo hello | rfile --root /srv/data write greeting.txt --create")]
pub struct Cli {
    /// Serve files from this local directory
    #[arg(long, value_name = "DIR", conflicts_with = "url", required_unless_present = "url")]
    pub root: Option<String>,

    /// Serve files from this HTTP base URL (Range requests)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Verbose logging (-vv for trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode, errors only
    #[arg(short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print raw bytes of a remote file
    Cat {
        #[arg(value_name = "PATH")]
        path: String,

        /// Start reading at this byte
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Stop after this many bytes (default: to end of file)
        #[arg(long)]
        length: Option<u64>,
    },

    /// Print each record: text lines verbatim, JSON values one per line
    Iter {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Write stdin into a remote file
    Write {
        #[arg(value_name = "PATH")]
        path: String,

        /// Start writing at this byte
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Create (or truncate) the file first
        #[arg(long)]
        create: bool,
    },

    /// Show size and modification time
    Stat {
        #[arg(value_name = "PATH")]
        path: String,
    },
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "rfile=error";
        }
        match self.verbose {
            0 => "rfile=warn",
            1 => "rfile=debug",
            _ => "rfile=trace",
        }
    }
}
