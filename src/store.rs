use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use tracing::error;

use crate::error::BoardResult;
use crate::speedrun::client::SpeedrunApi;
use crate::speedrun::models::{FormattedRun, LeaderboardQuery, LeaderboardRun};
use crate::utils::format_time;

/// Fetched runs older than this are refetched on the next request.
pub const CACHE_DURATION_SECONDS: i64 = 5 * 60;

/// Seam between the state container and the upstream client, so consumers
/// and tests can swap the transport.
#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    async fn fetch_leaderboard(
        &self,
        query: &LeaderboardQuery,
    ) -> BoardResult<Vec<LeaderboardRun>>;
}

#[async_trait]
impl LeaderboardSource for SpeedrunApi {
    async fn fetch_leaderboard(
        &self,
        query: &LeaderboardQuery,
    ) -> BoardResult<Vec<LeaderboardRun>> {
        SpeedrunApi::fetch_leaderboard(self, query).await
    }
}

#[derive(Debug, Default)]
struct State {
    runs: Vec<LeaderboardRun>,
    loading: bool,
    error: Option<String>,
    last_fetch: Option<DateTime<Utc>>,
    current_config: Option<String>,
    version: u64,
}

impl State {
    fn is_fresh(&self) -> bool {
        match self.last_fetch {
            Some(last_fetch) => {
                Utc::now() - last_fetch < Duration::seconds(CACHE_DURATION_SECONDS)
            }
            None => false,
        }
    }
}

/// Mediates loading/error/success for one leaderboard view.
///
/// Constructed explicitly and handed to consumers; reads return snapshots.
/// `version` increments on every visible transition so pollers can detect
/// changes without holding references into the store. Overlapping
/// `fetch_data` calls proceed independently and the later resolution wins.
pub struct LeaderboardStore {
    source: Arc<dyn LeaderboardSource>,
    state: Mutex<State>,
}

impl LeaderboardStore {
    pub fn new(source: Arc<dyn LeaderboardSource>) -> Self {
        Self {
            source,
            state: Mutex::new(State::default()),
        }
    }

    pub async fn fetch_data(&self, query: &LeaderboardQuery, force_refresh: bool) {
        let fingerprint = query.fingerprint();

        // Scoped to force the lock to drop before 'await' so the future is Send.
        {
            let mut state = self.state.lock().unwrap();

            // A changed configuration always invalidates, fresh or not. Must
            // run before the freshness gate below.
            if state.current_config.as_deref() != Some(fingerprint.as_str()) {
                state.current_config = Some(fingerprint);
                state.last_fetch = None;
            }

            if !force_refresh && state.is_fresh() && !state.runs.is_empty() {
                return;
            }

            state.loading = true;
            state.error = None;
            state.version += 1;
        }

        let outcome = self.source.fetch_leaderboard(query).await;

        let mut state = self.state.lock().unwrap();
        match outcome {
            Ok(runs) => {
                state.runs = runs;
                state.last_fetch = Some(Utc::now());
            }
            Err(e) => {
                error!("Leaderboard fetch error: {e}");
                // Previous runs are kept; only the message changes.
                state.error = Some(e.to_string());
            }
        }
        state.loading = false;
        state.version += 1;
    }

    pub fn runs(&self) -> Vec<LeaderboardRun> {
        self.state.lock().unwrap().runs.clone()
    }

    pub fn formatted_runs(&self) -> Vec<FormattedRun> {
        self.state
            .lock()
            .unwrap()
            .runs
            .iter()
            .map(|run| FormattedRun {
                place: run.place,
                player_name: run.player_name.clone(),
                time_seconds: run.time_seconds,
                formatted_time: format_time(run.time_seconds),
            })
            .collect()
    }

    pub fn loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().last_fetch
    }

    pub fn is_cache_valid(&self) -> bool {
        self.state.lock().unwrap().is_fresh()
    }

    pub fn version(&self) -> u64 {
        self.state.lock().unwrap().version
    }
}
