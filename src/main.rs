//! Binary entrypoint for the Townstead CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml`
//! - `load` - load the flat-file database and print a per-type summary
//! - `migrate` - rewrite the whole data tree in the current record layout
//!
//! See the library crate docs for module-level details: `townstead::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use townstead::config::Config;
use townstead::db::migration;
use townstead::db::FlatFileDb;
use townstead::universe::load_universe;

#[derive(Parser)]
#[command(name = "townstead")]
#[command(about = "Flat-file town persistence and economy core")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init,
    /// Load the database and print entity counts
    Load,
    /// Reload every entity and re-save it in the current record layout
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            println!("Wrote default configuration to {}", cli.config);
        }
        Commands::Load => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let mut db = FlatFileDb::new(&config.storage.data_dir);
            let universe = load_universe(&mut db).await?;
            println!("Loaded database from {}", config.storage.data_dir);
            println!("  worlds:      {}", universe.world_count());
            println!("  residents:   {}", universe.resident_count());
            println!("  towns:       {}", universe.town_count());
            println!("  nations:     {}", universe.nation_count());
            println!("  town blocks: {}", universe.town_block_count());
        }
        Commands::Migrate => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            info!("Starting Townstead v{}", env!("CARGO_PKG_VERSION"));
            let report = migration::upgrade(std::path::Path::new(&config.storage.data_dir)).await?;
            println!("Rewrote {} records:", report.total());
            println!("  worlds:      {}", report.worlds);
            println!("  residents:   {}", report.residents);
            println!("  towns:       {}", report.towns);
            println!("  nations:     {}", report.nations);
            println!("  town blocks: {}", report.town_blocks);
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);
    let _ = builder.try_init();
}
