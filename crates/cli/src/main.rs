//! Blood Orange CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run store database migrations
//! bo-cli migrate store
//!
//! # Seed the catalog with sample products
//! bo-cli seed
//!
//! # Promote a user to staff (drops their customer profile when possible)
//! bo-cli staff promote -e manager@example.com -r order_manager
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the catalog with sample products
//! - `staff promote` - Promote users to staff / set their role

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bo-cli")]
#[command(author, version, about = "Blood Orange CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Seed the catalog with sample products
    Seed,
    /// Set a product's unit price (existing order snapshots are untouched)
    Price {
        /// Product slug
        slug: String,

        /// New unit price in Toman
        price: i64,
    },
    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run store database migrations
    Store,
}

#[derive(Subcommand)]
enum StaffAction {
    /// Promote a user to staff
    Promote {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// Capability role to assign (`customer`, `order_manager`)
        #[arg(short, long, default_value = "order_manager")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate { target } => match target {
            MigrateTarget::Store => commands::migrate::store().await?,
        },
        Commands::Seed => commands::seed::catalog().await?,
        Commands::Price { slug, price } => commands::seed::set_price(&slug, price).await?,
        Commands::Staff { action } => match action {
            StaffAction::Promote { email, role } => {
                commands::staff::promote(&email, &role).await?;
            }
        },
    }
    Ok(())
}
