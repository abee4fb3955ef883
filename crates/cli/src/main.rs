//! HEMBIT CLI - Seeding, export and admin account tools.
//!
//! # Usage
//!
//! ```bash
//! # Load the seed file into Postgres (first deploy)
//! hembit-cli seed
//!
//! # Replace an existing Postgres document with the seed file
//! hembit-cli seed --force
//!
//! # Dump the current document
//! hembit-cli export -o backup.json
//!
//! # Create an admin user (or promote an existing account)
//! hembit-cli admin create -e ops@hembit.in -n "Ops" -p 'a-long-password'
//!
//! # Reset a user's password
//! hembit-cli admin reset-password -e ops@hembit.in -p 'another-password'
//! ```
//!
//! `seed --force` and the `admin` commands write the document directly.
//! Stop the storefront server first: it keeps the document in memory and
//! its next save would overwrite the change.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - Postgres mode when set, file mode otherwise
//! - `HEMBIT_DATA_PATH` - Seed document (and the database in file mode)
//! - `HEMBIT_ADMIN_EMAIL` / `HEMBIT_ADMIN_PASSWORD` - Seeded administrator

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hembit-cli")]
#[command(author, version, about = "HEMBIT storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the seed file into the Postgres document row
    #[command(after_help = commands::STOP_SERVER_NOTE)]
    Seed {
        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },
    /// Write the current document as pretty JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage admin users
    #[command(after_help = commands::STOP_SERVER_NOTE)]
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user, or promote an existing account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Password for a newly created account
        #[arg(short, long)]
        password: String,
    },
    /// Set a new password for any user
    ResetPassword {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// New password
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so `export` can write JSON to stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hembit_cli=info,hembit_storefront=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { force } => commands::seed::run(force).await?,
        Commands::Export { output } => commands::export::run(output.as_deref()).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, &password).await?;
            }
            AdminAction::ResetPassword { email, password } => {
                commands::admin::reset_password(&email, &password).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_writing_commands_warn_about_running_server() {
        let cli = Cli::command();
        for name in ["seed", "admin"] {
            let help = cli
                .find_subcommand(name)
                .and_then(|cmd| cmd.get_after_help())
                .map(ToString::to_string)
                .unwrap();
            assert!(help.contains("Stop the storefront server"), "{name}: {help}");
        }
        assert!(
            cli.find_subcommand("export")
                .unwrap()
                .get_after_help()
                .is_none()
        );
    }

    #[test]
    fn test_parse_export_and_seed() {
        let cli = Cli::try_parse_from(["hembit-cli", "export", "-o", "dump.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Export { output: Some(_) }));

        let cli = Cli::try_parse_from(["hembit-cli", "seed", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Seed { force: true }));
    }
}
