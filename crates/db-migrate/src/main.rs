//! db-migrate CLI
//!
//! Command-line tool for inspecting a database's migration ledger.

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use db_migrate::prelude::*;

/// Named, run-once schema migrations.
#[derive(Parser)]
#[command(name = "db-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the ledger table if it is missing.
    Init,

    /// List applied migrations.
    Status {
        /// Print the records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether a table exists. Exits with status 1 if it does not.
    TableExists {
        /// Table name.
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = SqliteClient::connect(&cli.database).await?;
    let mut session = client.session().await?;

    match cli.command {
        Commands::Init => {
            info!("Initializing migration ledger...");
            Ledger::new(&mut session).ensure().await?;
            info!(table = LEDGER_TABLE, "Ledger table ready.");
        }

        Commands::Status { json } => {
            let mut ledger = Ledger::new(&mut session);
            ledger.ensure().await?;
            let records = ledger.records().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                info!("No migrations have been applied yet.");
            } else {
                println!("\nApplied migrations:");
                println!("{:-<60}", "");

                for record in &records {
                    println!(
                        " [X] {} ({})",
                        record.name,
                        record.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
                println!();
            }
        }

        Commands::TableExists { name } => {
            let exists = InformationSchema::new(&mut session)
                .table_exists(&name)
                .await?;
            println!("{exists}");
            if !exists {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
