use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use match_browser::config::Config;
use match_browser::{logging, seed, store};

#[derive(Debug, Parser)]
#[command(
    name = "match_seed",
    about = "Create a demo match database for match_browser"
)]
struct Cli {
    /// Target SQLite file; created if missing.
    #[arg(long)]
    db: Option<PathBuf>,

    #[arg(long, default_value_t = seed::DEFAULT_MATCHES)]
    matches: usize,

    #[arg(long, default_value_t = seed::DEFAULT_SEED)]
    seed: u64,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(|| Config::from_env().db_path);

    let mut conn = store::create_database(&db_path)?;
    let summary = seed::seed_demo(&mut conn, cli.matches, cli.seed)?;

    println!("Seed complete");
    println!("DB: {}", db_path.display());
    println!("Leagues: {}", summary.leagues);
    println!("Matches inserted: {}", summary.matches);
    Ok(())
}
