use anyhow::Result;
use blobstore_core::{BlobClient, ConnectionSettings, StoreConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "blobstore")]
#[command(about = "Blob storage container, blob, and lease tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store URL: memory:// for a throwaway store, file:///path/state.json
    /// to keep state between invocations
    #[arg(short, long, global = true, default_value = "memory://")]
    store: String,

    /// Storage account name used when forming blob URLs
    #[arg(long, global = true, default_value = "devstoreaccount1")]
    account: String,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Container lifecycle, metadata, and ACL operations
    Container {
        #[command(subcommand)]
        command: commands::container::ContainerCommand,
    },

    /// Blob upload, download, listing, snapshot, and copy operations
    Blob {
        #[command(subcommand)]
        command: commands::blob::BlobCommand,
    },

    /// Lease operations on containers and blobs
    Lease {
        #[command(subcommand)]
        command: commands::lease::LeaseCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    // Priority: RUST_LOG env var > verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = StoreConfig::from_url(&cli.store)?;
    let client = BlobClient::from_config(&config, ConnectionSettings::new(cli.account))?;

    match cli.command {
        Commands::Container { command } => {
            commands::container::run(&client, command).await?;
        }
        Commands::Blob { command } => {
            commands::blob::run(&client, command).await?;
        }
        Commands::Lease { command } => {
            commands::lease::run(&client, command).await?;
        }
    }

    Ok(())
}
