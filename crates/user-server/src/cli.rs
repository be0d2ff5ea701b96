//! Command-line arguments.

use clap::Parser;

/// User service: JSON CRUD endpoints over a local SQLite file.
#[derive(Parser, Debug)]
#[command(name = "user-service", version)]
pub struct Cli {
    /// Run schema migrations and exit.
    #[arg(long, default_value_t = false)]
    pub migrate: bool,
}
