use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iptrail::config::{Config, DatabaseBackend};
use iptrail::lookup::{IpApiClient, LookupService};
use iptrail::storage::{HistoryStore, PostgresStorage, SqliteStorage, HISTORY_LIMIT};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "iptrail-admin")]
#[command(about = "IP Trail history management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the most recent lookups
    History {
        /// Maximum number of records to show
        #[arg(short, long, default_value_t = HISTORY_LIMIT)]
        limit: i64,
    },
    /// Delete every record for an IP address
    Delete {
        /// IP address as stored in history
        ip: String,
    },
    /// Delete all history
    Clear,
    /// Look up an IP address and record it like the web form does
    Lookup {
        /// IP address to look up
        ip: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage: Arc<dyn HistoryStore> = match config.database.backend {
        DatabaseBackend::Sqlite => Arc::new(
            SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
        ),
        DatabaseBackend::Postgres => Arc::new(
            PostgresStorage::new(&config.database.url, config.database.max_connections).await?,
        ),
    };

    // Ensure database is initialized
    storage.init().await?;

    match cli.command {
        Commands::History { limit } => {
            let records = storage.list_recent(limit).await?;
            if records.is_empty() {
                println!("No lookups recorded.");
            } else {
                println!(
                    "{:<40} {:<24} {:<20} {:<30} {}",
                    "IP", "Country", "City", "ISP", "Searched"
                );
                println!("{}", "-".repeat(140));
                for record in records {
                    println!(
                        "{:<40} {:<24} {:<20} {:<30} {}",
                        record.ip,
                        record.country,
                        record.city,
                        record.isp,
                        record.searched_at_display()
                    );
                }
            }
        }
        Commands::Delete { ip } => {
            let removed = storage.delete_by_ip(&ip).await?;
            if removed > 0 {
                println!("✓ Deleted {} record(s) for '{}'", removed, ip);
            } else {
                println!("⚠ No records found for '{}'", ip);
            }
        }
        Commands::Clear => {
            let removed = storage.delete_all().await?;
            println!("✓ Cleared {} record(s)", removed);
        }
        Commands::Lookup { ip } => {
            let geo = Arc::new(
                IpApiClient::from_config(&config.geolocation)
                    .context("failed to create geolocation client")?,
            );
            let service = LookupService::new(Arc::clone(&storage), geo);
            let data = service
                .lookup(ip.trim())
                .await
                .with_context(|| format!("lookup of '{}' failed", ip))?;
            println!("IP:      {}", data.query);
            if let Some(status) = &data.status {
                println!("Status:  {}", status);
            }
            println!("Country: {}", data.country);
            println!("City:    {}", data.city);
            println!("ISP:     {}", data.isp);
            if let Some(note) = data.note.as_ref().or(data.message.as_ref()) {
                println!("Note:    {}", note);
            }
        }
    }

    storage.close().await;

    Ok(())
}
