//! Manage sample users in the credential store.

use anyhow::Context;
use clap::{Parser, Subcommand};
use jwt_auth::{
    seed::{self, SeedOutcome},
    store::{PgUserStore, UserStore},
};

#[derive(Debug, Parser)]
#[command(name = "seeder", about = "Seed, list or clear users in the auth database", version)]
struct CliArgs {
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add the sample users
    Seed {
        /// Remove existing users first
        #[arg(long)]
        clear: bool,
    },
    /// Print every user
    List,
    /// Remove every user
    Clear,
    /// Clear, then seed
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "jwt_auth=info,seeder=info".to_string()),
        )
        .init();

    let args = CliArgs::parse();
    let database_url = match args.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
    };
    let store = PgUserStore::connect(&database_url).await?;

    match args.command {
        Command::Seed { clear } => seed(&store, clear).await?,
        Command::List => {
            let users = store.list().await?;
            print!("{}", seed::render_table(&users));
            println!("Total users: {}", users.len());
        }
        Command::Clear => {
            let removed = seed::clear_users(&store).await?;
            println!("Deleted {removed} users");
        }
        Command::Reset => seed(&store, true).await?,
    }
    Ok(())
}

async fn seed(store: &dyn UserStore, clear: bool) -> anyhow::Result<()> {
    match seed::seed_users(store, clear).await? {
        SeedOutcome::Seeded(users) => {
            println!("Seeded {} users", users.len());
            print!("{}", seed::render_table(&users));
            println!("Default password: password123 (admin: admin123)");
        }
        SeedOutcome::AlreadyPopulated(count) => {
            println!("{count} users already exist; pass --clear to replace them");
        }
    }
    Ok(())
}
