//! Arkive user administration CLI.
//!
//! Interactive create/modify/delete flows over the arkive-core lifecycle
//! manager. Missing fields are prompted for; pre-filled arguments skip
//! their prompts. The same validation rules apply here as on the web
//! registration path.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "arkivectl",
    version,
    about = "Administer Arkive user accounts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new user, prompting for any missing fields
    CreateUser {
        /// Email address for the new account
        #[arg(long)]
        email: Option<String>,
        /// Username for the new account
        #[arg(long)]
        username: Option<String>,
        /// Password (prompted twice when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Role name; falls back to an interactive menu
        #[arg(long)]
        role: Option<String>,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
    /// Modify an existing user's role or email
    ModifyUser {
        /// Username to modify
        #[arg(long)]
        username: Option<String>,
    },
    /// Delete a user and all their data (asks for confirmation)
    DeleteUser {
        /// Username to delete
        #[arg(long)]
        username: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = cli::Context::connect().await?;

    match cli.command {
        Command::CreateUser {
            email,
            username,
            password,
            role,
            name,
        } => {
            cli::create::run(
                &ctx,
                cli::create::CreateArgs {
                    email,
                    username,
                    password,
                    role,
                    name,
                },
            )
            .await
        }
        Command::ModifyUser { username } => {
            cli::modify::run(&ctx, username).await
        }
        Command::DeleteUser { username } => {
            cli::delete::run(&ctx, username).await
        }
    }
}
