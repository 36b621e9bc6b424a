//! cmdindex CLI
//!
//! Create and list commands stored in the indexer.

use anyhow::Context;
use clap::{Parser, Subcommand};

use cmdindex_infra::{CommandsIndex, HttpIndexerClient, IndexerConfig};
use cmdindex_observability::LogFormat;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cmdindex")]
#[command(about = "Create and query commands in the commands index", long_about = None)]
struct Cli {
    /// Log output format on stderr (json or pretty)
    #[arg(long, global = true, default_value = "json")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Store a new pending command
    Create(commands::create::CreateArgs),
    /// List stored commands, optionally filtered by target and status
    List(commands::list::ListArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cmdindex_observability::tracing::init(
        cli.log_format,
        cmdindex_observability::tracing::DEFAULT_FILTER,
    );

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = IndexerConfig::from_env().context("invalid indexer configuration")?;
    tracing::info!(url = %config.url, index = %config.paths.index, "using indexer");

    let client = HttpIndexerClient::new(&config).context("failed to build indexer client")?;
    let index = CommandsIndex::with_paths(client, config.paths.clone());

    let output = match command {
        Commands::Create(args) => commands::create::execute(&index, args).await?,
        Commands::List(args) => commands::list::execute(&index, args).await?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
