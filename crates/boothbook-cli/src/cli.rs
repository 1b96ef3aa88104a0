use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "boothbook", about = "Market booth schedule kept in a Git repository", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file; GITHUB_* and *_FILE variables override it
    #[arg(short, long, global = true, env = "BOOTHBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Book a vendor into a booth for one day
    Register(RegisterArgs),
    /// Move an existing booking to another booth
    Relocate(RelocateArgs),
    /// Drop bookings older than the retention window
    Purge(PurgeArgs),
    /// Print a document as stored on the branch
    Show(ShowArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Serve(_) => "serve",
            Self::Register(_) => "register",
            Self::Relocate(_) => "relocate",
            Self::Purge(_) => "purge",
            Self::Show(_) => "show",
        }
    }
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides `bind_addr` from the config file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct RegisterArgs {
    pub vendor_id: String,
    pub booth_location: String,
    /// YYYY-MM-DD
    pub date: String,
}

#[derive(Args)]
pub struct RelocateArgs {
    pub vendor_id: String,
    /// YYYY-MM-DD
    pub date: String,
    pub new_booth_location: String,
}

#[derive(Args)]
pub struct PurgeArgs {
    /// Run as if today were this date (YYYY-MM-DD, defaults to the UTC day)
    #[arg(long)]
    pub today: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub document: DocumentArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum DocumentArg {
    Vendors,
    Booths,
    Schedule,
}
