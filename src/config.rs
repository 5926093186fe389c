use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;

pub const DEFAULT_DB_PATH: &str = "database.sqlite";
pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const ENV_DB_PATH: &str = "MATCH_DB_PATH";
const ENV_RECENT_SINCE: &str = "MATCH_RECENT_SINCE";
const ENV_RECENT_LIMIT: &str = "MATCH_RECENT_LIMIT";
const ENV_CHARTS: &str = "MATCH_CHARTS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartMode {
    Terminal,
    Text,
    None,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub recent_since: NaiveDate,
    pub recent_limit: usize,
    pub charts: ChartMode,
    pub script: Option<PathBuf>,
}

// CLI values win over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub db_path: Option<PathBuf>,
    pub recent_since: Option<NaiveDate>,
    pub recent_limit: Option<usize>,
    pub charts: Option<ChartMode>,
    pub script: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            recent_since: default_recent_since(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            charts: ChartMode::Terminal,
            script: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let db_path = lookup(ENV_DB_PATH)
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);
        let recent_since = lookup(ENV_RECENT_SINCE)
            .and_then(|val| parse_date(&val))
            .unwrap_or(defaults.recent_since);
        let recent_limit = lookup(ENV_RECENT_LIMIT)
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(defaults.recent_limit);
        let charts = lookup(ENV_CHARTS)
            .and_then(|val| ChartMode::from_str(val.trim(), true).ok())
            .unwrap_or(defaults.charts);

        Self {
            db_path,
            recent_since,
            recent_limit,
            charts,
            script: None,
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(path) = overrides.db_path {
            self.db_path = path;
        }
        if let Some(since) = overrides.recent_since {
            self.recent_since = since;
        }
        if let Some(limit) = overrides.recent_limit {
            self.recent_limit = limit;
        }
        if let Some(charts) = overrides.charts {
            self.charts = charts;
        }
        if overrides.script.is_some() {
            self.script = overrides.script;
        }
        self
    }
}

pub fn default_recent_since() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_fixed_report() {
        let cfg = Config::from_lookup(lookup_from(&[]));
        assert_eq!(cfg.db_path, PathBuf::from("database.sqlite"));
        assert_eq!(cfg.recent_since.to_string(), "2015-01-01");
        assert_eq!(cfg.recent_limit, 10);
        assert_eq!(cfg.charts, ChartMode::Terminal);
        assert!(cfg.script.is_none());
    }

    #[test]
    fn env_values_are_parsed_and_bad_ones_ignored() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("MATCH_DB_PATH", " /tmp/soccer.sqlite "),
            ("MATCH_RECENT_SINCE", "2016-07-01"),
            ("MATCH_RECENT_LIMIT", "ten"),
            ("MATCH_CHARTS", "TEXT"),
        ]));
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/soccer.sqlite"));
        assert_eq!(cfg.recent_since.to_string(), "2016-07-01");
        assert_eq!(cfg.recent_limit, DEFAULT_RECENT_LIMIT);
        assert_eq!(cfg.charts, ChartMode::Text);
    }

    #[test]
    fn overrides_win_over_env() {
        let cfg = Config::from_lookup(lookup_from(&[("MATCH_RECENT_LIMIT", "3")])).with_overrides(
            Overrides {
                recent_limit: Some(5),
                charts: Some(ChartMode::None),
                ..Overrides::default()
            },
        );
        assert_eq!(cfg.recent_limit, 5);
        assert_eq!(cfg.charts, ChartMode::None);
        assert_eq!(cfg.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }
}
