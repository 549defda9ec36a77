use podium::config;
use podium::speedrun::client::SpeedrunApi;
use podium::speedrun::models::LeaderboardQuery;
use podium::store::LeaderboardStore;
use podium::utils::suffix;

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = &config::SETTINGS;

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(settings.get_trace_level())
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Setting default subscriber failed");

    let mut variables = HashMap::new();
    for pair in &settings.variables {
        match pair.split_once('=') {
            Some((variable_id, value_id)) => {
                variables.insert(variable_id.to_string(), value_id.to_string());
            }
            None => warn!(
                "Ignoring malformed variable selection '{}', expected <variable-id>=<value-id>.",
                pair
            ),
        }
    }

    let api = SpeedrunApi::from_settings();
    let store = LeaderboardStore::new(Arc::new(api));

    let query = LeaderboardQuery::new(
        settings.game_id.clone(),
        settings.category_id.clone(),
        settings.top,
    )
    .with_variables(variables);

    info!(
        "Fetching top {} for {}/{}.",
        query.top, query.game_id, query.category_id
    );
    store.fetch_data(&query, settings.force_refresh).await;

    match store.error() {
        Some(error) => Err(error.into()),
        None => {
            for run in store.formatted_runs() {
                println!(
                    "{:>3}{} {:>10}  {}",
                    run.place,
                    suffix(run.place),
                    run.formatted_time,
                    run.player_name
                );
            }
            Ok(())
        }
    }
}
