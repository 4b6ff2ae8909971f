#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use paddock::config::Config;
use paddock::db;
use paddock::races::{RaceDay, RaceResultsSource};
use paddock::state::AppState;

/// Race source that echoes the requested date back
pub struct FixedRaces;

#[async_trait]
impl RaceResultsSource for FixedRaces {
    async fn races_for(&self, date: NaiveDate) -> RaceDay {
        RaceDay {
            status: "success".into(),
            races: vec![serde_json::json!({ "date": date.to_string(), "track": "Stafford" })],
            message: None,
        }
    }
}

pub fn test_state_with(config: Config) -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let pool = db::create_pool(&db_path, &config.database).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");
    (AppState::with_races(pool, config, Arc::new(FixedRaces)), temp_dir)
}

pub fn test_state() -> (AppState, TempDir) {
    test_state_with(Config::default())
}

/// Create a profile for `user_id` and return its profile id
pub async fn profile_id(state: &AppState, user_id: &str) -> String {
    state.profiles.ensure_profile(user_id).await.unwrap().id
}
