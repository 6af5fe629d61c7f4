//! Portal CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! portal-cli migrate
//!
//! # Create the first administrator
//! PORTAL_NEW_PASSWORD=... portal-cli user create -e admin@dinas.id -r admin -n "Admin Dinas"
//!
//! # Review the approval queue
//! portal-cli user list --status pending
//! portal-cli user approve 42
//! portal-cli user reject 43
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user` - Create accounts and change approval status

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use pengawas_core::{ApprovalStatus, Role};

mod commands;

#[derive(Parser)]
#[command(name = "portal-cli")]
#[command(author, version, about = "Supervision portal CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage portal accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Role (`admin`, `pengawas`, `sekolah`)
        #[arg(short, long)]
        role: Role,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Initial password
        #[arg(long, env = "PORTAL_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Approve a pending or rejected account
    Approve {
        /// Account ID
        id: i32,
    },
    /// Reject an account
    Reject {
        /// Account ID
        id: i32,
    },
    /// List accounts by approval status
    List {
        /// Status to list (`pending`, `approved`, `rejected`)
        #[arg(short, long, default_value = "pending")]
        status: ApprovalStatus,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                role,
                name,
                password,
            } => {
                commands::user::create(&email, role, name.as_deref(), &password).await?;
            }
            UserAction::Approve { id } => {
                commands::user::set_status(id, ApprovalStatus::Approved).await?;
            }
            UserAction::Reject { id } => {
                commands::user::set_status(id, ApprovalStatus::Rejected).await?;
            }
            UserAction::List { status } => commands::user::list(status).await?,
        },
    }
    Ok(())
}
