use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use tracing::warn;

use match_browser::charts::{ChartSurface, NoSurface, TerminalSurface, TextSurface};
use match_browser::config::{ChartMode, Config, Overrides};
use match_browser::input::{ConsolePrompts, ScriptPlan, ScriptedInputs, StepInputs};
use match_browser::logging;
use match_browser::session::MatchBrowserSession;

#[derive(Debug, Parser)]
#[command(
    name = "match_browser",
    about = "Browse, edit and chart a football match database"
)]
struct Cli {
    /// SQLite file with the Match and League tables.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Report matches played after this date.
    #[arg(long, value_name = "YYYY-MM-DD")]
    since: Option<NaiveDate>,

    /// Rows in the recent matches report.
    #[arg(long)]
    limit: Option<usize>,

    /// JSON file with insert/update/delete records instead of prompts.
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    #[arg(long, value_enum)]
    charts: Option<ChartMode>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(Overrides {
        db_path: cli.db,
        recent_since: cli.since,
        recent_limit: cli.limit,
        charts: cli.charts,
        script: cli.script,
    });

    let mut out = io::stdout();
    let session = MatchBrowserSession::connect(config.clone(), &mut out)?;

    let mut inputs: Box<dyn StepInputs> = match &config.script {
        Some(path) => Box::new(ScriptedInputs::new(ScriptPlan::from_path(path)?)),
        None => Box::new(ConsolePrompts::new(io::stdin().lock(), io::stdout())),
    };
    let mut charts = chart_surface(config.charts);

    session.run(inputs.as_mut(), charts.as_mut(), &mut out)?;
    session.close(&mut out)?;
    Ok(())
}

fn chart_surface(mode: ChartMode) -> Box<dyn ChartSurface> {
    match mode {
        ChartMode::Terminal if io::stdout().is_terminal() => Box::new(TerminalSurface),
        ChartMode::Terminal => {
            warn!("stdout is not a terminal, printing charts as text");
            Box::new(TextSurface::new(io::stdout()))
        }
        ChartMode::Text => Box::new(TextSurface::new(io::stdout())),
        ChartMode::None => Box::new(NoSurface),
    }
}
