use std::path::PathBuf;

use clap::{Parser, Subcommand};
use orderdesk_core::ActorRole;
use tracing_subscriber::EnvFilter;

mod import;
mod stores;

#[derive(Debug, Parser)]
#[command(name = "orderdesk")]
#[command(about = "Order export import and store review")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import a CSV order export in a single transaction
    Import {
        /// Path to the CSV export
        file: PathBuf,
        /// User id recorded on activity entries and, for field roles, on new leads
        #[arg(long)]
        actor_id: Option<i64>,
        /// Role of the importing user (admin, salesman, subsalesman, client)
        #[arg(long, default_value = "admin")]
        actor_role: ActorRole,
        /// Override ORDERDESK_FUZZY_THRESHOLD for this run
        #[arg(long, value_parser = parse_threshold)]
        fuzzy_threshold: Option<f64>,
        /// Run the full import, then roll it back
        #[arg(long)]
        dry_run: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Store review
    Stores {
        #[command(subcommand)]
        command: StoresCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[derive(Debug, Subcommand)]
enum StoresCommands {
    /// List lead stores flagged for review
    Leads,
}

fn parse_threshold(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside 0.0..=1.0"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("orderdesk: no command given, see --help");
        return Ok(());
    };

    let config = orderdesk_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool = orderdesk_db::connect_pool_from_config(&config).await?;

    match command {
        Commands::Import {
            file,
            actor_id,
            actor_role,
            fuzzy_threshold,
            dry_run,
            json,
        } => {
            let options = import::ImportOptions {
                actor: orderdesk_core::Actor::new(actor_id, actor_role),
                fuzzy_threshold: fuzzy_threshold.unwrap_or(config.fuzzy_threshold),
                dry_run,
                json,
            };
            import::run_import(&pool, &file, &options).await?;
        }
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            orderdesk_db::health_check(&pool).await?;
            println!("database reachable");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = orderdesk_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Stores {
            command: StoresCommands::Leads,
        } => stores::run_list_leads(&pool).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
