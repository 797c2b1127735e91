//! CLI argument parsing for turnstile.

use clap::{Args, Parser, Subcommand};

/// Turnstile: administer ticket locks stored in memcached.
#[derive(Parser, Debug)]
#[command(name = "turnstile")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to conf/turnstile.yml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Memcached address, overriding the configuration
    #[arg(short, long, global = true, env = "TURNSTILE_ADDRESS")]
    pub address: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for turnstile.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create (or reset) a lock record.
    Create(LockArgs),

    /// Take a ticket and wait until it is served.
    ///
    /// Exits with status 1 when `--no-wait` is given and the lock is held.
    Acquire(AcquireArgs),

    /// Serve the next ticket and drop one participant.
    Release(LockArgs),

    /// Make every waiter rebuild the lock on its next poll.
    Initialize(LockArgs),

    /// Retire the lock, waiting for registered participants to drain.
    Close(LockArgs),

    /// Print the lock's counters as JSON.
    Inspect(LockArgs),
}

#[derive(Args, Debug)]
pub struct LockArgs {
    /// Lock name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct AcquireArgs {
    /// Lock name
    pub name: String,

    /// Return immediately instead of waiting for the ticket to be served
    #[arg(long)]
    pub no_wait: bool,
}

impl Command {
    pub fn lock_name(&self) -> &str {
        match self {
            Command::Acquire(args) => &args.name,
            Command::Create(args)
            | Command::Release(args)
            | Command::Initialize(args)
            | Command::Close(args)
            | Command::Inspect(args) => &args.name,
        }
    }
}
