//! Command-line interface for campadmin.

mod commands;

use clap::{Parser, Subcommand};

/// campadmin - bootcamp applicant and instructor administration
#[derive(Parser)]
#[command(name = "campadmin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Read from CAMPADMIN_ADMIN_PASSWORD when omitted
        #[arg(long, env = "CAMPADMIN_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Print the first free username derived from a base name
    UniqueUsername {
        base: String,
    },
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["campadmin"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn create_admin_takes_named_arguments() {
        let cli = Cli::try_parse_from([
            "campadmin",
            "create-admin",
            "--username",
            "root",
            "--email",
            "root@example.com",
            "--first-name",
            "Ro",
            "--last-name",
            "Ot",
            "--password",
            "long-enough",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::CreateAdmin { username, .. }) => assert_eq!(username, "root"),
            _ => panic!("expected create-admin"),
        }
    }
}
