//! Sejuk CLI - Database migrations and user provisioning.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sejuk-cli migrate
//!
//! # Create a technician account
//! SEJUK_NEW_USER_PASSWORD=... sejuk-cli user create -e ali@sejuk.my -u ali -r technician
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sejuk-cli")]
#[command(author, version, about = "Sejuk Sejuk Service CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (schema and session store)
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account with its profile
    ///
    /// The password is read from `SEJUK_NEW_USER_PASSWORD`.
    Create {
        /// Sign-in email address
        #[arg(short, long)]
        email: String,

        /// Directory username
        #[arg(short, long)]
        username: String,

        /// Role (`admin`, `technician`)
        #[arg(short, long, default_value = "technician")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                username,
                role,
            } => {
                commands::user::create(&email, &username, &role).await?;
            }
        },
    }
    Ok(())
}
