//! User service binary.
//!
//! With `--migrate`, synchronizes the database schema and exits. Otherwise
//! serves the `/users` API on port 8081 until the process is killed.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use user_server::{cli::Cli, config::Config, middleware::Middleware, Server};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::default();

    // Initialize tracing. Logs go to stderr; stdout is reserved for the
    // migration result line.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let server = match Server::new(config, Middleware::defaults()) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed init app");
            std::process::exit(1);
        }
    };

    if cli.migrate {
        match server.migrate() {
            Ok(report) => {
                tracing::info!(
                    tables_created = report.tables_created.len(),
                    columns_added = report.columns_added.len(),
                    "schema synchronized"
                );
                println!("migrations done");
            }
            Err(e) => {
                tracing::error!("migrate failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "user-service stopped");
        std::process::exit(1);
    }
}
