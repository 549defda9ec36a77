use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One ranked entry of a fetched board. Replaced wholesale on the next
/// successful fetch, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRun {
    pub place: u32,
    pub player_name: String,
    pub time_seconds: f64,
}

/// A run plus its display time, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedRun {
    pub place: u32,
    pub player_name: String,
    pub time_seconds: f64,
    pub formatted_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum CategoryKind {
    #[serde(rename = "per-game")]
    PerGame,
    #[serde(rename = "per-level")]
    PerLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableValue {
    pub id: String,
    pub label: String,
}

/// A subcategory-defining dimension of a category, e.g. a game mode that
/// partitions the board into distinct ranking pools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub id: String,
    pub name: String,
    pub is_subcategory: bool,
    pub mandatory: bool,
    pub values: Vec<VariableValue>,
    pub default_value: Option<String>,
}

/// A logical leaderboard request: which board, how deep, and which
/// subcategory pools.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardQuery {
    pub game_id: String,
    pub category_id: String,
    pub top: u32,
    /// variable id -> selected value id
    pub variables: HashMap<String, String>,
}

impl LeaderboardQuery {
    pub fn new(game_id: String, category_id: String, top: u32) -> Self {
        Self {
            game_id,
            category_id,
            top,
            variables: HashMap::new(),
        }
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    /// Pre-selects the default value of every mandatory subcategory variable
    /// that declares one, leaving explicit selections untouched.
    pub fn with_default_selections(mut self, variables: &[Variable]) -> Self {
        for variable in variables {
            if !variable.mandatory || self.variables.contains_key(&variable.id) {
                continue;
            }
            if let Some(default) = &variable.default_value {
                self.variables
                    .insert(variable.id.clone(), default.clone());
            }
        }
        self
    }

    /// Deterministic identity of this query, used for cache-hit and
    /// invalidation decisions. Variable selections are sorted by id so the
    /// map's insertion order never leaks into the fingerprint.
    pub fn fingerprint(&self) -> String {
        let vars_key = self
            .variables
            .iter()
            .sorted()
            .map(|(id, value)| format!("{}={}", id, value))
            .join("&");
        format!(
            "{}:{}:{}:{}",
            self.game_id, self.category_id, self.top, vars_key
        )
    }
}
