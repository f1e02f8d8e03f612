//! CLI application for registering payment receipts and rejecting duplicates.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{Context, batch, config, hash, list, register, show};

/// Recibo - Register payment receipt images and reject duplicates
#[derive(Parser)]
#[command(name = "recibo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Database URL, overriding the configured one
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register one or more receipt images
    Register(register::RegisterArgs),

    /// Register every image in a directory or glob pattern
    Batch(batch::BatchArgs),

    /// List registered receipts, newest first
    List(list::ListArgs),

    /// Show a registered receipt
    Show(show::ShowArgs),

    /// Print fingerprints and extracted fields without registering
    Hash(hash::HashArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let ctx = Context {
        config_path: cli.config.as_deref(),
        database: cli.database.as_deref(),
    };

    // Execute command
    match cli.command {
        Commands::Register(args) => register::run(args, ctx).await,
        Commands::Batch(args) => batch::run(args, ctx).await,
        Commands::List(args) => list::run(args, ctx).await,
        Commands::Show(args) => show::run(args, ctx).await,
        Commands::Hash(args) => hash::run(args, ctx).await,
        Commands::Config(args) => config::run(args, ctx).await,
    }
}
