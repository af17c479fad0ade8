//! Command-line interface for accountd, parsed with clap.

use clap::{Parser, Subcommand};

/// Accountd - token-authenticated account service
#[derive(Parser)]
#[command(name = "accountd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run migrations and start the HTTP server (default)
    Serve,

    /// Wait until the configured database accepts connections
    #[command(name = "wait-db")]
    WaitDb,

    /// Create an account with staff and superuser privileges
    #[command(name = "create-superuser")]
    CreateSuperuser {
        /// Email address for the new superuser
        email: String,
        /// Password for the new superuser
        password: String,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}
