use chrono::NaiveDate;
use rusqlite::params;
use tempfile::TempDir;

use match_browser::store::{
    self, MatchDefaults, MatchDeletion, MatchStore, NewMatch, RecentMatch, ScoreUpdate,
};

fn empty_store() -> (TempDir, MatchStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("matches.sqlite");
    let conn = store::create_database(&path).expect("schema should be created");
    conn.execute(
        "INSERT INTO League (id, name) VALUES (1, 'Belgium Jupiler League')",
        [],
    )
    .expect("league should insert");
    drop(conn);
    let store = MatchStore::open(&path).expect("store should open");
    (dir, store)
}

fn add_match(store: &MatchStore, date: &str, home: i64, away: i64) -> i64 {
    store
        .connection()
        .execute(
            "INSERT INTO Match (date, home_team_goal, away_team_goal, league_id, season, stage, referee)
             VALUES (?1, ?2, ?3, 1, '2015/2016', 3, 'Someone')",
            params![date, home, away],
        )
        .expect("match should insert");
    store.connection().last_insert_rowid()
}

fn all_scores(store: &MatchStore) -> Vec<(i64, i64, i64)> {
    let mut stmt = store
        .connection()
        .prepare("SELECT id, home_team_goal, away_team_goal FROM Match ORDER BY id")
        .unwrap();
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

fn since(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

#[test]
fn opening_a_missing_database_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.sqlite");
    assert!(MatchStore::open(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn creating_a_database_under_a_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"x").unwrap();
    let err = store::create_database(&blocker.join("matches.sqlite")).unwrap_err();
    assert!(format!("{err:#}").contains("create dir"));
}

#[test]
fn recent_matches_filter_sort_and_limit() {
    let (_dir, store) = empty_store();
    for date in [
        "2014-12-31 00:00:00",
        "2015-01-01",
        "2015-03-01 00:00:00",
        "2016-05-01 00:00:00",
        "2015-08-09 00:00:00",
        "2017-01-01 00:00:00",
    ] {
        add_match(&store, date, 1, 0);
    }

    let top = store.recent_matches(since("2015-01-01"), 3).unwrap();
    let dates: Vec<&str> = top.iter().map(|m| m.date.as_str()).collect();
    assert_eq!(
        dates,
        vec![
            "2017-01-01 00:00:00",
            "2016-05-01 00:00:00",
            "2015-08-09 00:00:00"
        ]
    );

    let all = store.recent_matches(since("2015-01-01"), 10).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|m| m.date.as_str() > "2015-01-01"));
    assert!(all.windows(2).all(|w| w[0].date >= w[1].date));
}

#[test]
fn recent_matches_on_empty_table_is_empty() {
    let (_dir, store) = empty_store();
    let rows = store.recent_matches(since("2015-01-01"), 10).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn insert_uses_fixed_defaults() {
    let (_dir, store) = empty_store();
    let id = store
        .insert_match(
            &NewMatch {
                date: "whenever".to_string(),
                home_team_goal: 2,
                away_team_goal: 1,
            },
            &MatchDefaults::default(),
        )
        .unwrap();

    let row: (String, i64, i64, i64, String, i64, String) = store
        .connection()
        .query_row(
            "SELECT date, home_team_goal, away_team_goal, league_id, season, stage, referee
             FROM Match WHERE id = ?1",
            params![id],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                ))
            },
        )
        .unwrap();
    assert_eq!(
        row,
        (
            "whenever".to_string(),
            2,
            1,
            1,
            "2019/2020".to_string(),
            1,
            "Unknown".to_string()
        )
    );
    assert_eq!(all_scores(&store).len(), 1);
}

#[test]
fn update_touches_only_the_matching_row() {
    let (_dir, store) = empty_store();
    let a = add_match(&store, "2016-01-01", 0, 0);
    let b = add_match(&store, "2016-01-02", 1, 1);

    let rows = store
        .update_score(&ScoreUpdate {
            id: b,
            home_team_goal: 4,
            away_team_goal: 2,
        })
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(all_scores(&store), vec![(a, 0, 0), (b, 4, 2)]);
}

#[test]
fn update_of_unknown_id_is_silent() {
    let (_dir, store) = empty_store();
    let a = add_match(&store, "2016-01-01", 0, 0);
    let rows = store
        .update_score(&ScoreUpdate {
            id: a + 100,
            home_team_goal: 9,
            away_team_goal: 9,
        })
        .unwrap();
    assert_eq!(rows, 0);
    assert_eq!(all_scores(&store), vec![(a, 0, 0)]);
}

#[test]
fn delete_removes_exactly_one_row() {
    let (_dir, store) = empty_store();
    let a = add_match(&store, "2016-01-01", 0, 0);
    let b = add_match(&store, "2016-01-02", 1, 1);

    assert_eq!(store.delete_match(&MatchDeletion { id: a + b + 10 }).unwrap(), 0);
    assert_eq!(all_scores(&store).len(), 2);

    assert_eq!(store.delete_match(&MatchDeletion { id: a }).unwrap(), 1);
    assert_eq!(all_scores(&store), vec![(b, 1, 1)]);
}

#[test]
fn close_releases_the_connection() {
    let (dir, store) = empty_store();
    add_match(&store, "2016-01-01", 3, 2);
    store.close().expect("close should succeed");

    let reopened = MatchStore::open(&dir.path().join("matches.sqlite")).unwrap();
    let rows = reopened.recent_matches(since("2000-01-01"), 10).unwrap();
    assert_eq!(
        rows,
        vec![RecentMatch {
            date: "2016-01-01".to_string(),
            home_team_goal: 3,
            away_team_goal: 2,
        }]
    );
}
