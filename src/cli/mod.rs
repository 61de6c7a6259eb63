//! CLI module providing argument parsing and command execution.

pub mod parser;

pub use parser::{Cli, Commands};

use crate::config::ConfigLoader;
use crate::db::run_migrations;
use crate::logger::init_logger;
use crate::server::Server;

/// Loads configuration, initializes logging, and dispatches the parsed
/// command. Missing subcommand means `serve`.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = ConfigLoader::new()?.load()?;
    init_logger(&settings.logger)?;

    match cli.command {
        Some(Commands::Migrate) => {
            run_migrations(&settings.database.url).await?;
            tracing::info!("Migrations complete");
            Ok(())
        }
        Some(Commands::Serve) | None => Server::new(settings).run().await,
    }
}
