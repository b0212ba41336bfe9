//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

/// GuardLink - password-protected short links
#[derive(Parser, Debug)]
#[command(name = "guardlink")]
#[command(version)]
#[command(about = "A URL shortener with password-protected links", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Issue a bearer token for a user
    ///
    /// Requires `auth.jwt_secret` to match the running server.
    Token {
        /// User ID placed in the token subject; links are owned by this ID
        user_id: String,

        /// Lifetime in minutes (default: auth.access_token_minutes)
        #[arg(long)]
        minutes: Option<u64>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults() {
        let cli = Cli::try_parse_from(["guardlink"]).unwrap();
        assert_eq!(cli.config, DEFAULT_CONFIG_PATH);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_token_command() {
        let cli =
            Cli::try_parse_from(["guardlink", "token", "alice", "--minutes", "30", "-c", "x.toml"])
                .unwrap();
        assert_eq!(cli.config, "x.toml");
        assert_eq!(
            cli.command,
            Some(Commands::Token {
                user_id: "alice".to_string(),
                minutes: Some(30),
            })
        );
    }

    #[test]
    fn test_config_generate_command() {
        let cli = Cli::try_parse_from(["guardlink", "config", "generate", "out.toml"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommands::Generate {
                    output_path: Some("out.toml".to_string()),
                    force: false,
                },
            })
        );
    }

    #[test]
    fn test_token_requires_user() {
        assert!(Cli::try_parse_from(["guardlink", "token"]).is_err());
    }
}
