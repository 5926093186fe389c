use std::io::Write;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::charts::{
    ChartSurface, average_goals_chart, matches_per_season_chart, top_leagues_chart,
};
use crate::config::{Config, DATE_FORMAT};
use crate::input::{InputError, Step, StepInputs};
use crate::store::{MatchDefaults, MatchStore, TOP_LEAGUES};

const MSG_INVALID_INPUT: &str = "⚠️ Invalid input format";
const MSG_NO_INPUT: &str = "Skipped: no input supplied";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Inserted { id: i64 },
    // rows is zero when the id matched nothing
    Applied { rows: usize },
    Skipped(InputError),
    NoInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub recent_rows: usize,
    pub insert: StepOutcome,
    pub update: StepOutcome,
    pub delete: StepOutcome,
}

pub struct MatchBrowserSession {
    store: MatchStore,
    config: Config,
    defaults: MatchDefaults,
}

impl MatchBrowserSession {
    pub fn connect<W: Write>(config: Config, out: &mut W) -> Result<Self> {
        writeln!(out, "\n1. Connecting to database...").context("write console")?;
        let store = MatchStore::open(&config.db_path)?;
        writeln!(out, "✅ Database connected successfully").context("write console")?;
        info!(path = %config.db_path.display(), "session connected");
        Ok(Self::from_store(store, config))
    }

    pub fn from_store(store: MatchStore, config: Config) -> Self {
        Self {
            store,
            config,
            defaults: MatchDefaults::default(),
        }
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    pub fn run<I, C, W>(&self, inputs: &mut I, charts: &mut C, out: &mut W) -> Result<RunSummary>
    where
        I: StepInputs + ?Sized,
        C: ChartSurface + ?Sized,
        W: Write,
    {
        let recent_rows = self.report_recent(out)?;
        let insert = self.insert_step(inputs, out)?;
        let update = self.update_step(inputs, out)?;
        let delete = self.delete_step(inputs, out)?;
        self.visualize(charts, out)?;
        Ok(RunSummary {
            recent_rows,
            insert,
            update,
            delete,
        })
    }

    pub fn report_recent<W: Write>(&self, out: &mut W) -> Result<usize> {
        writeln!(out, "\n2. Fetching recent matches...").context("write console")?;
        let since = self.config.recent_since;
        let rows = self
            .store
            .recent_matches(since, self.config.recent_limit)?;
        writeln!(
            out,
            "\nLast {} matches since {}:",
            self.config.recent_limit,
            since.format(DATE_FORMAT)
        )
        .context("write console")?;
        for m in &rows {
            writeln!(
                out,
                "Date: {}, Score: {}-{}",
                m.date, m.home_team_goal, m.away_team_goal
            )
            .context("write console")?;
        }
        Ok(rows.len())
    }

    pub fn insert_step<I: StepInputs + ?Sized, W: Write>(
        &self,
        inputs: &mut I,
        out: &mut W,
    ) -> Result<StepOutcome> {
        writeln!(out, "\n3. Adding new match...").context("write console")?;
        let outcome = match inputs.insert()? {
            Step::Ready(new_match) => {
                let id = self.store.insert_match(&new_match, &self.defaults)?;
                writeln!(out, "✅ Match added successfully").context("write console")?;
                StepOutcome::Inserted { id }
            }
            Step::Invalid(err) => skipped(out, "insert", err)?,
            Step::Absent => no_input(out, "insert")?,
        };
        Ok(outcome)
    }

    pub fn update_step<I: StepInputs + ?Sized, W: Write>(
        &self,
        inputs: &mut I,
        out: &mut W,
    ) -> Result<StepOutcome> {
        writeln!(out, "\n4. Updating match...").context("write console")?;
        let outcome = match inputs.update()? {
            Step::Ready(update) => {
                let rows = self.store.update_score(&update)?;
                if rows == 0 {
                    debug!(id = update.id, "update matched no rows");
                }
                writeln!(out, "✅ Match updated successfully").context("write console")?;
                StepOutcome::Applied { rows }
            }
            Step::Invalid(err) => skipped(out, "update", err)?,
            Step::Absent => no_input(out, "update")?,
        };
        Ok(outcome)
    }

    pub fn delete_step<I: StepInputs + ?Sized, W: Write>(
        &self,
        inputs: &mut I,
        out: &mut W,
    ) -> Result<StepOutcome> {
        writeln!(out, "\n5. Deleting match...").context("write console")?;
        let outcome = match inputs.delete()? {
            Step::Ready(deletion) => {
                let rows = self.store.delete_match(&deletion)?;
                if rows == 0 {
                    debug!(id = deletion.id, "delete matched no rows");
                }
                writeln!(out, "✅ Match deleted successfully").context("write console")?;
                StepOutcome::Applied { rows }
            }
            Step::Invalid(err) => skipped(out, "delete", err)?,
            Step::Absent => no_input(out, "delete")?,
        };
        Ok(outcome)
    }

    pub fn visualize<C: ChartSurface + ?Sized, W: Write>(
        &self,
        charts: &mut C,
        out: &mut W,
    ) -> Result<()> {
        writeln!(out, "\n6. Generating visualizations...").context("write console")?;
        out.flush().context("flush console")?;

        let per_season = self.store.matches_per_season()?;
        charts.show(&matches_per_season_chart(&per_season))?;

        let goals = self.store.average_goals_per_season()?;
        charts.show(&average_goals_chart(&goals))?;

        let leagues = self.store.top_leagues(TOP_LEAGUES)?;
        charts.show(&top_leagues_chart(&leagues))?;

        info!(
            seasons = per_season.len(),
            leagues = leagues.len(),
            "visualizations shown"
        );
        Ok(())
    }

    pub fn close<W: Write>(self, out: &mut W) -> Result<()> {
        self.store.close()?;
        writeln!(out, "\n❌ Database connection closed").context("write console")?;
        Ok(())
    }
}

fn skipped<W: Write>(out: &mut W, step: &str, err: InputError) -> Result<StepOutcome> {
    info!(step, %err, "step skipped");
    writeln!(out, "{MSG_INVALID_INPUT}").context("write console")?;
    Ok(StepOutcome::Skipped(err))
}

fn no_input<W: Write>(out: &mut W, step: &str) -> Result<StepOutcome> {
    info!(step, "no input for step");
    writeln!(out, "{MSG_NO_INPUT}").context("write console")?;
    Ok(StepOutcome::NoInput)
}
