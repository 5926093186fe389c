use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use thiserror::Error;

use crate::store::{MatchDeletion, NewMatch, ScoreUpdate};

pub const PROMPT_DATE: &str = "Enter match date (YYYY-MM-DD): ";
pub const PROMPT_HOME_GOALS: &str = "Home team goals: ";
pub const PROMPT_AWAY_GOALS: &str = "Away team goals: ";
pub const PROMPT_UPDATE_ID: &str = "Enter match ID to update: ";
pub const PROMPT_NEW_HOME_GOALS: &str = "New home goals: ";
pub const PROMPT_NEW_AWAY_GOALS: &str = "New away goals: ";
pub const PROMPT_DELETE_ID: &str = "Enter match ID to delete: ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{field} expects a whole number, got {raw:?}")]
    NotAnInteger { field: &'static str, raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Ready(T),
    Invalid(InputError),
    // scripted runs only
    Absent,
}

impl<T> From<Result<T, InputError>> for Step<T> {
    fn from(value: Result<T, InputError>) -> Self {
        match value {
            Ok(v) => Step::Ready(v),
            Err(err) => Step::Invalid(err),
        }
    }
}

pub trait StepInputs {
    fn insert(&mut self) -> Result<Step<NewMatch>>;
    fn update(&mut self) -> Result<Step<ScoreUpdate>>;
    fn delete(&mut self) -> Result<Step<MatchDeletion>>;
}

pub fn parse_goals(field: &'static str, raw: &str) -> Result<u32, InputError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| InputError::NotAnInteger {
            field,
            raw: raw.to_string(),
        })
}

pub fn parse_id(field: &'static str, raw: &str) -> Result<i64, InputError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| InputError::NotAnInteger {
            field,
            raw: raw.to_string(),
        })
}

pub struct ConsolePrompts<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ConsolePrompts<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.writer, "{prompt}").context("write prompt")?;
        self.writer.flush().context("flush prompt")?;
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).context("read prompt answer")?;
        if read == 0 {
            return Err(anyhow!("stdin closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> StepInputs for ConsolePrompts<R, W> {
    fn insert(&mut self) -> Result<Step<NewMatch>> {
        let date = self.ask(PROMPT_DATE)?;
        let home_team_goal = match parse_goals("home_team_goal", &self.ask(PROMPT_HOME_GOALS)?) {
            Ok(v) => v,
            Err(err) => return Ok(Step::Invalid(err)),
        };
        let away_team_goal = match parse_goals("away_team_goal", &self.ask(PROMPT_AWAY_GOALS)?) {
            Ok(v) => v,
            Err(err) => return Ok(Step::Invalid(err)),
        };
        Ok(Step::Ready(NewMatch {
            date,
            home_team_goal,
            away_team_goal,
        }))
    }

    fn update(&mut self) -> Result<Step<ScoreUpdate>> {
        let id = match parse_id("id", &self.ask(PROMPT_UPDATE_ID)?) {
            Ok(v) => v,
            Err(err) => return Ok(Step::Invalid(err)),
        };
        let home_team_goal = match parse_goals("home_team_goal", &self.ask(PROMPT_NEW_HOME_GOALS)?)
        {
            Ok(v) => v,
            Err(err) => return Ok(Step::Invalid(err)),
        };
        let away_team_goal = match parse_goals("away_team_goal", &self.ask(PROMPT_NEW_AWAY_GOALS)?)
        {
            Ok(v) => v,
            Err(err) => return Ok(Step::Invalid(err)),
        };
        Ok(Step::Ready(ScoreUpdate {
            id,
            home_team_goal,
            away_team_goal,
        }))
    }

    fn delete(&mut self) -> Result<Step<MatchDeletion>> {
        let step = parse_id("id", &self.ask(PROMPT_DELETE_ID)?).map(|id| MatchDeletion { id });
        Ok(step.into())
    }
}

/// An integer field in a script. Strings are kept so malformed text can be
/// replayed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(serde_json::Number),
    Text(String),
}

impl RawField {
    fn as_text(&self) -> String {
        match self {
            RawField::Number(n) => n.to_string(),
            RawField::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsertEntry {
    pub date: String,
    pub home_team_goal: RawField,
    pub away_team_goal: RawField,
}

impl InsertEntry {
    pub fn validate(&self) -> Result<NewMatch, InputError> {
        Ok(NewMatch {
            date: self.date.clone(),
            home_team_goal: parse_goals("home_team_goal", &self.home_team_goal.as_text())?,
            away_team_goal: parse_goals("away_team_goal", &self.away_team_goal.as_text())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateEntry {
    pub id: RawField,
    pub home_team_goal: RawField,
    pub away_team_goal: RawField,
}

impl UpdateEntry {
    pub fn validate(&self) -> Result<ScoreUpdate, InputError> {
        Ok(ScoreUpdate {
            id: parse_id("id", &self.id.as_text())?,
            home_team_goal: parse_goals("home_team_goal", &self.home_team_goal.as_text())?,
            away_team_goal: parse_goals("away_team_goal", &self.away_team_goal.as_text())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeleteEntry {
    pub id: RawField,
}

impl DeleteEntry {
    pub fn validate(&self) -> Result<MatchDeletion, InputError> {
        Ok(MatchDeletion {
            id: parse_id("id", &self.id.as_text())?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScriptPlan {
    #[serde(default)]
    pub insert: Option<InsertEntry>,
    #[serde(default)]
    pub update: Option<UpdateEntry>,
    #[serde(default)]
    pub delete: Option<DeleteEntry>,
}

impl ScriptPlan {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid script json")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read script {}", path.display()))?;
        Self::from_json(&raw)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedInputs {
    plan: ScriptPlan,
}

impl ScriptedInputs {
    pub fn new(plan: ScriptPlan) -> Self {
        Self { plan }
    }
}

impl StepInputs for ScriptedInputs {
    fn insert(&mut self) -> Result<Step<NewMatch>> {
        Ok(match self.plan.insert.take() {
            Some(entry) => entry.validate().into(),
            None => Step::Absent,
        })
    }

    fn update(&mut self) -> Result<Step<ScoreUpdate>> {
        Ok(match self.plan.update.take() {
            Some(entry) => entry.validate().into(),
            None => Step::Absent,
        })
    }

    fn delete(&mut self) -> Result<Step<MatchDeletion>> {
        Ok(match self.plan.delete.take() {
            Some(entry) => entry.validate().into(),
            None => Step::Absent,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn console(answers: &str) -> ConsolePrompts<Cursor<Vec<u8>>, Vec<u8>> {
        ConsolePrompts::new(Cursor::new(answers.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn goals_must_be_non_negative_whole_numbers() {
        assert_eq!(parse_goals("home_team_goal", " 3 "), Ok(3));
        assert!(parse_goals("home_team_goal", "-1").is_err());
        assert!(parse_goals("home_team_goal", "2.5").is_err());
        assert!(parse_goals("home_team_goal", "").is_err());
        assert_eq!(parse_id("id", "-7"), Ok(-7));
    }

    #[test]
    fn console_insert_reads_three_answers() {
        let mut prompts = console("2020-05-01\n2\n1\n");
        let step = prompts.insert().unwrap();
        assert_eq!(
            step,
            Step::Ready(NewMatch {
                date: "2020-05-01".to_string(),
                home_team_goal: 2,
                away_team_goal: 1,
            })
        );
        let shown = String::from_utf8(prompts.writer.clone()).unwrap();
        assert_eq!(shown, format!("{PROMPT_DATE}{PROMPT_HOME_GOALS}{PROMPT_AWAY_GOALS}"));
    }

    #[test]
    fn console_step_stops_at_first_bad_number() {
        let mut prompts = console("2020-05-01\ntwo\n1\n7\n");
        let step = prompts.insert().unwrap();
        assert_eq!(
            step,
            Step::Invalid(InputError::NotAnInteger {
                field: "home_team_goal",
                raw: "two".to_string(),
            })
        );
        // The unread away-goals answer is consumed by the next prompt.
        let next = prompts.delete().unwrap();
        assert_eq!(next, Step::Ready(MatchDeletion { id: 1 }));
    }

    #[test]
    fn console_eof_is_fatal() {
        let mut prompts = console("");
        assert!(prompts.update().is_err());

        // Closing mid-step is fatal too, even after a valid answer.
        let mut prompts = console("3\n");
        assert!(prompts.update().is_err());
    }

    #[test]
    fn script_accepts_numbers_and_numeric_strings() {
        let plan = ScriptPlan::from_json(
            r#"{
                "insert": {"date": "2020-05-01", "home_team_goal": 2, "away_team_goal": "1"},
                "update": {"id": 4, "home_team_goal": "x", "away_team_goal": 3}
            }"#,
        )
        .unwrap();
        let mut inputs = ScriptedInputs::new(plan);
        assert!(matches!(inputs.insert().unwrap(), Step::Ready(_)));
        assert!(matches!(inputs.update().unwrap(), Step::Invalid(_)));
        assert_eq!(inputs.delete().unwrap(), Step::Absent);
        assert_eq!(inputs.insert().unwrap(), Step::Absent);
    }

    #[test]
    fn script_rejects_fractional_numbers() {
        let entry = DeleteEntry {
            id: RawField::Number(serde_json::Number::from_f64(1.5).unwrap()),
        };
        assert!(entry.validate().is_err());
    }
}
