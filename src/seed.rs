use anyhow::{Context, Result, anyhow};
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::{Connection, params};
use tracing::info;

pub const DEFAULT_SEED: u64 = 2008;
pub const DEFAULT_MATCHES: usize = 2_000;

const LEAGUES: &[(i64, &str)] = &[
    (1, "Belgium Jupiler League"),
    (1729, "England Premier League"),
    (4769, "France Ligue 1"),
    (7809, "Germany 1. Bundesliga"),
    (10257, "Italy Serie A"),
    (21518, "Spain LIGA BBVA"),
];

const FIRST_SEASON: i32 = 2008;
const SEASONS: i32 = 8;
const SEASON_DAYS: u64 = 290;
const STAGES: i64 = 38;

// Rough shape of goals per side in European top flights.
const GOAL_TABLE: &[u32] = &[0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 3, 3, 4, 5];

const REFEREES: &[&str] = &["Unknown", "M. Oliver", "F. Brych", "C. Turpin", "D. Orsato"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub leagues: usize,
    pub matches: usize,
}

/// Same `seed`, same rows.
pub fn seed_demo(conn: &mut Connection, matches: usize, seed: u64) -> Result<SeedSummary> {
    let mut rng = StdRng::seed_from_u64(seed);
    let tx = conn.transaction().context("begin seed transaction")?;

    for (id, name) in LEAGUES {
        tx.execute(
            "INSERT OR IGNORE INTO League (id, name) VALUES (?1, ?2)",
            params![id, name],
        )
        .context("insert league")?;
    }

    for _ in 0..matches {
        let (league_id, _) = LEAGUES[rng.gen_range(0..LEAGUES.len())];
        let start_year = FIRST_SEASON + rng.gen_range(0..SEASONS);
        let season = format!("{}/{}", start_year, start_year + 1);
        let date = season_date(start_year, rng.gen_range(0..SEASON_DAYS))?;
        let home = GOAL_TABLE[rng.gen_range(0..GOAL_TABLE.len())];
        let away = GOAL_TABLE[rng.gen_range(0..GOAL_TABLE.len())];
        let stage = rng.gen_range(1..=STAGES);
        let referee = REFEREES[rng.gen_range(0..REFEREES.len())];

        tx.execute(
            r#"
            INSERT INTO Match (date, home_team_goal, away_team_goal, league_id, season, stage, referee)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![date, home, away, league_id, season, stage, referee],
        )
        .context("insert seeded match")?;
    }

    tx.commit().context("commit seed transaction")?;
    info!(leagues = LEAGUES.len(), matches, seed, "demo data seeded");
    Ok(SeedSummary {
        leagues: LEAGUES.len(),
        matches,
    })
}

fn season_date(start_year: i32, offset_days: u64) -> Result<String> {
    let opening = NaiveDate::from_ymd_opt(start_year, 8, 1)
        .ok_or_else(|| anyhow!("invalid season start year {start_year}"))?;
    let day = opening
        .checked_add_days(Days::new(offset_days))
        .ok_or_else(|| anyhow!("season day out of range"))?;
    Ok(format!("{} 00:00:00", day.format("%Y-%m-%d")))
}
