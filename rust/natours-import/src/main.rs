use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use natours_core::{DbOpenConfig, TourStore};

#[derive(Parser, Debug)]
#[command(name = "natours-import", version, about = "Load or wipe natours dev data")]
struct Args {
    /// Path to the SQLite tour store (created if missing)
    #[arg(long = "db", value_name = "PATH", default_value = "natours.db")]
    db_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert every tour from a JSON file
    Import {
        /// JSON array of tour documents
        #[arg(long = "file", value_name = "PATH")]
        file: PathBuf,
    },
    /// Remove all tours
    Delete,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    if let Err(e) = run(Args::parse()) {
        error!(error = %format!("{e:#}"), "natours-import failed");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let store = TourStore::open(&args.db_path, &DbOpenConfig::from_env()).context("open tour store")?;
    match args.command {
        Command::Import { file } => natours_import::import_file(&store, &file).map(|_| ()),
        Command::Delete => natours_import::delete_all(&store).map(|_| ()),
    }
}
