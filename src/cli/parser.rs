//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};

// Include shadow-rs generated build information
use shadow_rs::shadow;
shadow!(build);

/// Outbound dialing and queue assignment service
#[derive(Parser, Debug)]
#[command(name = "dialcast")]
#[command(about = "Outbound dialing and queue assignment service")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute; defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server and the dialer loops
    Serve,
    /// Run pending database migrations and exit
    Migrate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_subcommand_parses() {
        let cli = Cli::try_parse_from(["dialcast", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
    }

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["dialcast"]).unwrap();
        assert!(cli.command.is_none());
    }
}
