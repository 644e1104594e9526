//! Nexus Migration CLI
//!
//! Moves a legacy Nexus SQLite database into a bbolt- or badger-style store.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use nexus_migrate::config::SourceKind;
use nexus_migrate::prepare::backup_path;
use nexus_migrate::{create_migrator, DestinationKind, MigrationConfig};

#[derive(Parser)]
#[command(name = "nexus-migrate")]
#[command(version)]
#[command(about = "Migrate a legacy Nexus SQLite database into an embedded key-value store", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "NEXUS_MIGRATE_CONFIG")]
    config: Option<PathBuf>,

    /// Database to migrate from
    #[arg(long = "origindb", value_enum)]
    origin_db: Option<OriginDbArg>,

    /// Original database file
    #[arg(long = "origindbfile", value_name = "PATH")]
    origin_db_file: Option<PathBuf>,

    /// Database to migrate to
    #[arg(long = "destdb", value_enum)]
    dest_db: Option<DestDbArg>,

    /// What the destination database file should be named
    #[arg(long = "destdbfile", value_name = "PATH")]
    dest_db_file: Option<PathBuf>,

    /// Where the origin file is moved before it is read
    #[arg(long, value_name = "PATH")]
    scratch: Option<PathBuf>,

    /// Seconds to wait for the destination file lock
    #[arg(long, value_name = "SECS")]
    open_timeout: Option<u64>,

    /// Hide the progress spinner
    #[arg(short, long)]
    quiet: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// CLI origin option
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OriginDbArg {
    Sqlite,
}

impl From<OriginDbArg> for SourceKind {
    fn from(arg: OriginDbArg) -> Self {
        match arg {
            OriginDbArg::Sqlite => SourceKind::Sqlite,
        }
    }
}

/// CLI destination option
#[derive(Debug, Clone, Copy, ValueEnum)]
enum DestDbArg {
    Bbolt,
    Badger,
}

impl From<DestDbArg> for DestinationKind {
    fn from(arg: DestDbArg) -> Self {
        match arg {
            DestDbArg::Bbolt => DestinationKind::Bbolt,
            DestDbArg::Badger => DestinationKind::Badger,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("Starting database migration operation...");

    let config = build_config(cli)?;
    run_migration(config).await
}

fn build_config(cli: Cli) -> anyhow::Result<MigrationConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            MigrationConfig::from_file(path)?
        }
        None => MigrationConfig::new(PathBuf::new(), DestinationKind::default(), PathBuf::new()),
    };

    if let Some(kind) = cli.origin_db {
        config.source.kind = kind.into();
    }
    if let Some(path) = cli.origin_db_file {
        config.source.path = path;
    }
    if let Some(backend) = cli.dest_db {
        config.destination.backend = backend.into();
    }
    if let Some(path) = cli.dest_db_file {
        config.destination.path = path;
    }
    if let Some(path) = cli.scratch {
        config.options.scratch_path = path;
    }
    if let Some(secs) = cli.open_timeout {
        config.options.open_timeout_secs = secs;
    }
    if cli.quiet {
        config.options.quiet = true;
    }

    config.validate()?;
    Ok(config)
}

async fn run_migration(config: MigrationConfig) -> anyhow::Result<()> {
    info!(
        "Migrating {:?} into {} store {:?}",
        config.source.path, config.destination.backend, config.destination.path
    );

    let mut migrator = create_migrator(config.destination.backend, config.options.clone());
    let result = migrator
        .migrate(&config.source.path, &config.destination.path)
        .await;

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            if e.origin_relocated() {
                error!(
                    "Origin database was moved to {:?}; an untouched copy is at {:?}",
                    config.options.scratch_path,
                    backup_path(&config.source.path)
                );
            }
            return Err(e.into());
        }
    };

    println!("\nMigration complete!");
    println!("   Players:    {}", stats.players);
    println!("   Skipped:    {}", stats.skipped);
    println!("   Users:      {}", stats.users);
    println!("   Characters: {}", stats.characters);
    println!("   Duration:   {:.2}s", stats.duration_secs);
    println!("   Throughput: {:.0} documents/sec", stats.throughput());

    Ok(())
}
