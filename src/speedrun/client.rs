use crate::{
    cache::TtlCache,
    config,
    error::{BoardError, BoardResult},
    speedrun::{
        models::{Category, Game, LeaderboardQuery, LeaderboardRun, Variable},
        normalize::{
            self, Envelope, RawCategory, RawGame, RawLeaderboard, RawVariable,
        },
    },
};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client, StatusCode,
};
use std::{fmt, time::Duration};
use tracing::debug;

/// Queries shorter than this return empty without touching the network or
/// the cache. A minimum-input guard, not an error.
const MIN_SEARCH_LENGTH: usize = 3;
const MAX_SEARCH_RESULTS: u32 = 10;

enum Endpoint {
    Leaderboard(String, String),
    Games,
    GameCategories(String),
    CategoryVariables(String),
    Game(String),
    Category(String),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endpoint::Leaderboard(game_id, category_id) => {
                write!(f, "/leaderboards/{}/category/{}", game_id, category_id)
            }
            Endpoint::Games => write!(f, "/games"),
            Endpoint::GameCategories(game_id) => {
                write!(f, "/games/{}/categories", game_id)
            }
            Endpoint::CategoryVariables(category_id) => {
                write!(f, "/categories/{}/variables", category_id)
            }
            Endpoint::Game(game_id) => write!(f, "/games/{}", game_id),
            Endpoint::Category(category_id) => write!(f, "/categories/{}", category_id),
        }
    }
}

pub struct SpeedrunApi {
    http_client: Client,
    base_url: String,
    games: TtlCache<Vec<Game>>,
    categories: TtlCache<Vec<Category>>,
    variables: TtlCache<Vec<Variable>>,
    game_by_id: TtlCache<Game>,
    category_by_id: TtlCache<Category>,
}

impl SpeedrunApi {
    pub fn new(base_url: String, timeout: Duration, api_key: String) -> Self {
        let mut headers = HeaderMap::new();
        // Attached to every call; may be the empty string when unset.
        headers.insert(
            "X-API-Key",
            HeaderValue::from_str(&api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
        );
        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .unwrap();
        Self {
            http_client,
            base_url,
            games: TtlCache::new(),
            categories: TtlCache::new(),
            variables: TtlCache::new(),
            game_by_id: TtlCache::new(),
            category_by_id: TtlCache::new(),
        }
    }

    pub fn from_settings() -> Self {
        let settings = &config::SETTINGS;
        Self::new(
            settings.speedrun_base_url.clone(),
            Duration::from_secs(settings.speedrun_api_timeout_sec),
            settings.speedrun_api_key.clone(),
        )
    }

    /// One round trip for a whole board: player identities ride along via
    /// `embed=players` so no follow-up calls are needed. Results are not
    /// cached here; freshness of the primary query belongs to the store.
    pub async fn fetch_leaderboard(
        &self,
        query: &LeaderboardQuery,
    ) -> BoardResult<Vec<LeaderboardRun>> {
        let endpoint =
            Endpoint::Leaderboard(query.game_id.clone(), query.category_id.clone());

        let mut params = vec![
            ("top".to_string(), query.top.to_string()),
            ("embed".to_string(), "players".to_string()),
        ];
        for (variable_id, value_id) in &query.variables {
            params.push((format!("var-{}", variable_id), value_id.clone()));
        }

        let body = self.get(&endpoint, &params).await?;
        let envelope: Envelope<RawLeaderboard> =
            serde_json::from_str(&body).map_err(|_| BoardError::Parse)?;

        let embedded = envelope
            .data
            .players
            .map(|directory| directory.data)
            .unwrap_or_default();
        Ok(normalize::normalize_runs(&envelope.data.runs, &embedded))
    }

    pub async fn search_games(&self, query: &str) -> BoardResult<Vec<Game>> {
        if query.chars().count() < MIN_SEARCH_LENGTH {
            return Ok(Vec::new());
        }

        let cache_key = format!("games:search:{}", query.to_lowercase());
        if let Some(games) = self.games.get(&cache_key) {
            debug!("Cache hit for {cache_key}");
            return Ok(games);
        }

        let params = vec![
            ("name".to_string(), query.to_string()),
            ("max".to_string(), MAX_SEARCH_RESULTS.to_string()),
        ];
        let body = self.get(&Endpoint::Games, &params).await?;
        let envelope: Envelope<Vec<RawGame>> =
            serde_json::from_str(&body).map_err(|_| BoardError::Parse)?;
        let games: Vec<Game> = envelope
            .data
            .into_iter()
            .map(normalize::normalize_game)
            .collect();

        self.games.set(cache_key, games.clone());
        Ok(games)
    }

    pub async fn get_game_categories(&self, game_id: &str) -> BoardResult<Vec<Category>> {
        let cache_key = format!("categories:{}", game_id);
        if let Some(categories) = self.categories.get(&cache_key) {
            debug!("Cache hit for {cache_key}");
            return Ok(categories);
        }

        let endpoint = Endpoint::GameCategories(game_id.to_string());
        let body = self.get(&endpoint, &[]).await?;
        let envelope: Envelope<Vec<RawCategory>> =
            serde_json::from_str(&body).map_err(|_| BoardError::Parse)?;
        let categories = normalize::normalize_categories(envelope.data);

        self.categories.set(cache_key, categories.clone());
        Ok(categories)
    }

    pub async fn get_category_variables(&self, category_id: &str) -> BoardResult<Vec<Variable>> {
        let cache_key = format!("variables:{}", category_id);
        if let Some(variables) = self.variables.get(&cache_key) {
            debug!("Cache hit for {cache_key}");
            return Ok(variables);
        }

        let endpoint = Endpoint::CategoryVariables(category_id.to_string());
        let body = self.get(&endpoint, &[]).await?;
        let envelope: Envelope<Vec<RawVariable>> =
            serde_json::from_str(&body).map_err(|_| BoardError::Parse)?;
        let variables = normalize::normalize_variables(envelope.data)?;

        self.variables.set(cache_key, variables.clone());
        Ok(variables)
    }

    pub async fn get_game_by_id(&self, game_id: &str) -> BoardResult<Game> {
        let cache_key = format!("game:{}", game_id);
        if let Some(game) = self.game_by_id.get(&cache_key) {
            debug!("Cache hit for {cache_key}");
            return Ok(game);
        }

        let endpoint = Endpoint::Game(game_id.to_string());
        let body = self.get(&endpoint, &[]).await?;
        let envelope: Envelope<RawGame> =
            serde_json::from_str(&body).map_err(|_| BoardError::Parse)?;
        let game = normalize::normalize_game(envelope.data);

        self.game_by_id.set(cache_key, game.clone());
        Ok(game)
    }

    pub async fn get_category_by_id(&self, category_id: &str) -> BoardResult<Category> {
        let cache_key = format!("category:{}", category_id);
        if let Some(category) = self.category_by_id.get(&cache_key) {
            debug!("Cache hit for {cache_key}");
            return Ok(category);
        }

        let endpoint = Endpoint::Category(category_id.to_string());
        let body = self.get(&endpoint, &[]).await?;
        let envelope: Envelope<RawCategory> =
            serde_json::from_str(&body).map_err(|_| BoardError::Parse)?;
        let category = normalize::normalize_category(envelope.data);

        self.category_by_id.set(cache_key, category.clone());
        Ok(category)
    }

    async fn get(&self, endpoint: &Endpoint, params: &[(String, String)]) -> BoardResult<String> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.http_client.get(&url).query(params).send().await?;

        match response.status() {
            StatusCode::OK => response.text().await.map_err(|_| BoardError::Parse),
            // The API answers NOT_FOUND for unknown game and category ids.
            StatusCode::NOT_FOUND => Err(BoardError::Http(format!(
                "{}. The game or category id might be wrong.",
                StatusCode::NOT_FOUND
            ))),
            _ => Err(BoardError::Http(format!("{}", response.status()))),
        }
    }
}
