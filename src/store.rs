use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OpenFlags, params};
use tracing::debug;

use crate::config::DATE_FORMAT;

pub const TOP_LEAGUES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDefaults {
    pub league_id: i64,
    pub season: String,
    pub stage: i64,
    pub referee: String,
}

impl Default for MatchDefaults {
    fn default() -> Self {
        Self {
            league_id: 1,
            season: "2019/2020".to_string(),
            stage: 1,
            referee: "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub date: String,
    pub home_team_goal: u32,
    pub away_team_goal: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub id: i64,
    pub home_team_goal: u32,
    pub away_team_goal: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchDeletion {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentMatch {
    pub date: String,
    pub home_team_goal: i64,
    pub away_team_goal: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonCount {
    pub year: String,
    pub matches: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonGoals {
    pub year: String,
    pub avg_goals: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueCount {
    pub league: String,
    pub matches: u64,
}

pub struct MatchStore {
    conn: Connection,
    path: PathBuf,
}

impl MatchStore {
    pub fn open(path: &Path) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .with_context(|| format!("open sqlite db {}", path.display()))?;
        conn.pragma_update(None, "foreign_keys", false)
            .context("disable foreign keys")?;
        debug!(path = %path.display(), "sqlite connection opened");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, err)| err)
            .with_context(|| format!("close sqlite db {}", path.display()))?;
        debug!(path = %path.display(), "sqlite connection closed");
        Ok(())
    }

    /// Matches played strictly after `since`, newest first.
    pub fn recent_matches(&self, since: NaiveDate, limit: usize) -> Result<Vec<RecentMatch>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT date, home_team_goal, away_team_goal
                FROM Match
                WHERE date > ?1
                ORDER BY date DESC
                LIMIT ?2
                "#,
            )
            .context("prepare recent matches query")?;

        let threshold = since.format(DATE_FORMAT).to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![threshold, limit], |row| {
                Ok(RecentMatch {
                    date: row.get(0)?,
                    home_team_goal: row.get(1)?,
                    away_team_goal: row.get(2)?,
                })
            })
            .context("query recent matches")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode recent match row")?);
        }
        debug!(rows = out.len(), %threshold, "recent matches loaded");
        Ok(out)
    }

    pub fn insert_match(&self, m: &NewMatch, defaults: &MatchDefaults) -> Result<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO Match (date, home_team_goal, away_team_goal, league_id, season, stage, referee)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    m.date,
                    m.home_team_goal,
                    m.away_team_goal,
                    defaults.league_id,
                    defaults.season,
                    defaults.stage,
                    defaults.referee,
                ],
            )
            .context("insert match")?;
        let id = self.conn.last_insert_rowid();
        debug!(id, date = %m.date, "match inserted");
        Ok(id)
    }

    /// Returns rows touched; zero when no match has that id.
    pub fn update_score(&self, update: &ScoreUpdate) -> Result<usize> {
        let rows = self
            .conn
            .execute(
                "UPDATE Match SET home_team_goal = ?1, away_team_goal = ?2 WHERE id = ?3",
                params![update.home_team_goal, update.away_team_goal, update.id],
            )
            .context("update match score")?;
        debug!(id = update.id, rows, "match score updated");
        Ok(rows)
    }

    pub fn delete_match(&self, deletion: &MatchDeletion) -> Result<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM Match WHERE id = ?1", params![deletion.id])
            .context("delete match")?;
        debug!(id = deletion.id, rows, "match deleted");
        Ok(rows)
    }

    pub fn matches_per_season(&self) -> Result<Vec<SeasonCount>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT substr(season, 1, 4) AS year, COUNT(*) AS cnt
                FROM Match
                GROUP BY year
                ORDER BY year ASC
                "#,
            )
            .context("prepare matches per season query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SeasonCount {
                    year: season_year(row.get(0)?),
                    matches: row.get::<_, u64>(1)?,
                })
            })
            .context("query matches per season")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode season count row")?);
        }
        Ok(out)
    }

    pub fn average_goals_per_season(&self) -> Result<Vec<SeasonGoals>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT substr(season, 1, 4) AS year,
                       AVG(home_team_goal + away_team_goal) AS avg_goals
                FROM Match
                GROUP BY year
                ORDER BY year ASC
                "#,
            )
            .context("prepare average goals query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((season_year(row.get(0)?), row.get::<_, Option<f64>>(1)?))
            })
            .context("query average goals per season")?;

        let mut out = Vec::new();
        for row in rows {
            let (year, avg) = row.context("decode average goals row")?;
            // A season whose rows all lack goals has no average to plot.
            if let Some(avg_goals) = avg {
                out.push(SeasonGoals { year, avg_goals });
            }
        }
        Ok(out)
    }

    pub fn top_leagues(&self, limit: usize) -> Result<Vec<LeagueCount>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT League.name AS league, COUNT(*) AS cnt
                FROM Match
                JOIN League ON Match.league_id = League.id
                GROUP BY league
                ORDER BY cnt DESC, league ASC
                LIMIT ?1
                "#,
            )
            .context("prepare top leagues query")?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(LeagueCount {
                    league: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    matches: row.get::<_, u64>(1)?,
                })
            })
            .context("query top leagues")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode league count row")?);
        }
        Ok(out)
    }
}

fn season_year(raw: Option<String>) -> String {
    raw.filter(|s| !s.is_empty())
        .unwrap_or_else(|| "-".to_string())
}

pub fn create_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("create sqlite db {}", path.display()))?;
    create_schema(&conn)?;
    Ok(conn)
}

pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS League (
            id INTEGER PRIMARY KEY,
            name TEXT
        );
        CREATE TABLE IF NOT EXISTS Match (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT,
            home_team_goal INTEGER,
            away_team_goal INTEGER,
            league_id INTEGER REFERENCES League(id),
            season TEXT,
            stage INTEGER,
            referee TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_match_date ON Match(date);
        CREATE INDEX IF NOT EXISTS idx_match_league ON Match(league_id);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}
