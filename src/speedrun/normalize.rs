//! Raw upstream JSON shapes and their reduction to canonical entities.
//!
//! Everything here is pure. Malformed documents fail at deserialization and
//! surface as parse errors; the only silent fallbacks are the "Unknown"
//! player sentinel and the documented per-game / subcategory filters.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{BoardError, BoardResult};
use crate::speedrun::models::{
    Category, CategoryKind, Game, LeaderboardRun, Variable, VariableValue,
};

/// Used when a run's player cannot be resolved.
pub const UNKNOWN_PLAYER: &str = "Unknown";

/// Every upstream response wraps its payload in a `data` field.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRel {
    User,
    Guest,
}

/// Player reference as it appears both inline in a run and in the
/// `embed=players` directory. Guests carry an inline `name`; registered
/// users carry an `id` and, in the directory, their international name.
#[derive(Debug, Deserialize)]
pub struct RawPlayer {
    pub rel: PlayerRel,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub names: Option<RawNames>,
}

#[derive(Debug, Deserialize)]
pub struct RawNames {
    pub international: String,
}

#[derive(Debug, Deserialize)]
pub struct RawLeaderboard {
    pub runs: Vec<RawRunEntry>,
    #[serde(default)]
    pub players: Option<RawPlayerDirectory>,
}

#[derive(Debug, Deserialize)]
pub struct RawPlayerDirectory {
    pub data: Vec<RawPlayer>,
}

#[derive(Debug, Deserialize)]
pub struct RawRunEntry {
    pub place: u32,
    pub run: RawRun,
}

#[derive(Debug, Deserialize)]
pub struct RawRun {
    pub times: RawTimes,
    #[serde(default)]
    pub players: Vec<RawPlayer>,
}

#[derive(Debug, Deserialize)]
pub struct RawTimes {
    pub primary_t: f64,
}

#[derive(Debug, Deserialize)]
pub struct RawGame {
    pub id: String,
    pub names: RawNames,
    pub abbreviation: String,
}

#[derive(Debug, Deserialize)]
pub struct RawCategory {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
}

#[derive(Debug, Deserialize)]
pub struct RawVariable {
    pub id: String,
    pub name: String,
    #[serde(rename = "is-subcategory")]
    pub is_subcategory: bool,
    pub mandatory: bool,
    pub values: RawVariableValues,
    #[serde(default, rename = "default")]
    pub default_value: Option<String>,
}

/// The upstream nests the value map one level down (`values.values`).
/// Values are kept as raw JSON so the map's own iteration order survives
/// (serde_json is built with `preserve_order`).
#[derive(Debug, Deserialize)]
pub struct RawVariableValues {
    pub values: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawVariableValue {
    label: String,
}

/// Resolves each run's primary player and keeps the upstream placement
/// untouched, ties included. Never re-ranks.
pub fn normalize_runs(
    raw_runs: &[RawRunEntry],
    embedded_players: &[RawPlayer],
) -> Vec<LeaderboardRun> {
    // id -> international name, registered users only
    let mut directory: HashMap<&str, &str> = HashMap::new();
    for player in embedded_players {
        if let (PlayerRel::User, Some(id), Some(names)) = (&player.rel, &player.id, &player.names)
        {
            directory.insert(id.as_str(), names.international.as_str());
        }
    }

    raw_runs
        .iter()
        .map(|entry| {
            let player_name = entry
                .run
                .players
                .first()
                .and_then(|player| match (&player.rel, &player.name, &player.id) {
                    (PlayerRel::Guest, Some(name), _) => Some(name.clone()),
                    (PlayerRel::User, _, Some(id)) => {
                        directory.get(id.as_str()).map(|name| name.to_string())
                    }
                    _ => None,
                })
                .unwrap_or_else(|| UNKNOWN_PLAYER.to_string());

            LeaderboardRun {
                place: entry.place,
                player_name,
                time_seconds: entry.run.times.primary_t,
            }
        })
        .collect()
}

pub fn normalize_game(raw: RawGame) -> Game {
    Game {
        id: raw.id,
        name: raw.names.international,
        abbreviation: raw.abbreviation,
    }
}

pub fn normalize_category(raw: RawCategory) -> Category {
    Category {
        id: raw.id,
        name: raw.name,
        kind: raw.kind,
    }
}

/// Level-scoped categories never show up in the picker, only per-game ones.
pub fn normalize_categories(raw: Vec<RawCategory>) -> Vec<Category> {
    raw.into_iter()
        .filter(|category| category.kind == CategoryKind::PerGame)
        .map(normalize_category)
        .collect()
}

/// Keeps subcategory-defining variables only and flattens their value map,
/// in upstream order, into a plain sequence.
pub fn normalize_variables(raw: Vec<RawVariable>) -> BoardResult<Vec<Variable>> {
    raw.into_iter()
        .filter(|variable| variable.is_subcategory)
        .map(|variable| {
            let values = variable
                .values
                .values
                .into_iter()
                .map(|(id, value)| {
                    let value: RawVariableValue =
                        serde_json::from_value(value).map_err(|_| BoardError::Parse)?;
                    Ok(VariableValue {
                        id,
                        label: value.label,
                    })
                })
                .collect::<BoardResult<Vec<VariableValue>>>()?;

            Ok(Variable {
                id: variable.id,
                name: variable.name,
                is_subcategory: variable.is_subcategory,
                mandatory: variable.mandatory,
                values,
                default_value: variable.default_value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaderboard_from(value: serde_json::Value) -> RawLeaderboard {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn guest_players_use_their_inline_name() {
        let board = leaderboard_from(json!({
            "runs": [
                {
                    "place": 1,
                    "run": {
                        "times": { "primary_t": 1234.5 },
                        "players": [ { "rel": "guest", "name": "Foo" } ]
                    }
                }
            ]
        }));

        let runs = normalize_runs(&board.runs, &[]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].player_name, "Foo");
        assert_eq!(runs[0].place, 1);
        assert_eq!(runs[0].time_seconds, 1234.5);
    }

    #[test]
    fn registered_players_resolve_through_the_embedded_directory() {
        let board = leaderboard_from(json!({
            "runs": [
                {
                    "place": 1,
                    "run": {
                        "times": { "primary_t": 100.0 },
                        "players": [ { "rel": "user", "id": "abc" } ]
                    }
                }
            ],
            "players": {
                "data": [
                    { "rel": "user", "id": "abc", "names": { "international": "Bar" } }
                ]
            }
        }));

        let embedded = board.players.map(|d| d.data).unwrap_or_default();
        let runs = normalize_runs(&board.runs, &embedded);
        assert_eq!(runs[0].player_name, "Bar");
    }

    #[test]
    fn unresolved_players_fall_back_to_the_sentinel() {
        let board = leaderboard_from(json!({
            "runs": [
                {
                    "place": 3,
                    "run": {
                        "times": { "primary_t": 50.0 },
                        "players": [ { "rel": "user", "id": "zzz" } ]
                    }
                },
                {
                    "place": 4,
                    "run": {
                        "times": { "primary_t": 60.0 },
                        "players": []
                    }
                }
            ]
        }));

        let runs = normalize_runs(&board.runs, &[]);
        assert_eq!(runs[0].player_name, UNKNOWN_PLAYER);
        assert_eq!(runs[1].player_name, UNKNOWN_PLAYER);
    }

    #[test]
    fn tied_places_are_preserved_verbatim() {
        let board = leaderboard_from(json!({
            "runs": [
                { "place": 1, "run": { "times": { "primary_t": 10.0 }, "players": [ { "rel": "guest", "name": "A" } ] } },
                { "place": 1, "run": { "times": { "primary_t": 10.0 }, "players": [ { "rel": "guest", "name": "B" } ] } },
                { "place": 3, "run": { "times": { "primary_t": 12.0 }, "players": [ { "rel": "guest", "name": "C" } ] } }
            ]
        }));

        let places: Vec<u32> = normalize_runs(&board.runs, &[])
            .iter()
            .map(|run| run.place)
            .collect();
        assert_eq!(places, vec![1, 1, 3]);
    }

    #[test]
    fn only_the_first_listed_player_counts() {
        let board = leaderboard_from(json!({
            "runs": [
                {
                    "place": 1,
                    "run": {
                        "times": { "primary_t": 10.0 },
                        "players": [
                            { "rel": "guest", "name": "Primary" },
                            { "rel": "guest", "name": "CoRunner" }
                        ]
                    }
                }
            ]
        }));

        let runs = normalize_runs(&board.runs, &[]);
        assert_eq!(runs[0].player_name, "Primary");
    }

    #[test]
    fn category_listing_drops_per_level_entries() {
        let raw: Vec<RawCategory> = serde_json::from_value(json!([
            { "id": "zd39j4nd", "name": "Any%", "type": "per-game" },
            { "id": "8241lkw2", "name": "First Level", "type": "per-level" },
            { "id": "o205xnq2", "name": "100%", "type": "per-game" }
        ]))
        .unwrap();

        let categories = normalize_categories(raw);
        assert_eq!(categories.len(), 2);
        assert!(categories
            .iter()
            .all(|category| category.kind == CategoryKind::PerGame));
    }

    #[test]
    fn single_category_keeps_its_kind_unfiltered() {
        let raw: RawCategory = serde_json::from_value(json!(
            { "id": "8241lkw2", "name": "First Level", "type": "per-level" }
        ))
        .unwrap();

        assert_eq!(normalize_category(raw).kind, CategoryKind::PerLevel);
    }

    #[test]
    fn variable_listing_keeps_subcategories_only() {
        let raw: Vec<RawVariable> = serde_json::from_value(json!([
            {
                "id": "wl33kewl",
                "name": "Mode",
                "is-subcategory": true,
                "mandatory": true,
                "values": { "values": { "4lxn1y4l": { "label": "Normal" } } },
                "default": "4lxn1y4l"
            },
            {
                "id": "onv4k8n2",
                "name": "Platform note",
                "is-subcategory": false,
                "mandatory": false,
                "values": { "values": {} }
            }
        ]))
        .unwrap();

        let variables = normalize_variables(raw).unwrap();
        assert_eq!(variables.len(), 1);
        assert_eq!(variables[0].id, "wl33kewl");
        assert_eq!(variables[0].default_value.as_deref(), Some("4lxn1y4l"));
    }

    #[test]
    fn variable_values_keep_upstream_order() {
        let raw: Vec<RawVariable> = serde_json::from_value(json!([
            {
                "id": "wl33kewl",
                "name": "Mode",
                "is-subcategory": true,
                "mandatory": true,
                "values": {
                    "values": {
                        "zzz91x0l": { "label": "Steel Soul" },
                        "4lxn1y4l": { "label": "Normal" },
                        "mm10d2lq": { "label": "Godseeker" }
                    }
                }
            }
        ]))
        .unwrap();

        let variables = normalize_variables(raw).unwrap();
        let labels: Vec<&str> = variables[0]
            .values
            .iter()
            .map(|value| value.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Steel Soul", "Normal", "Godseeker"]);
    }

    #[test]
    fn variable_value_without_label_is_a_parse_error() {
        let raw: Vec<RawVariable> = serde_json::from_value(json!([
            {
                "id": "wl33kewl",
                "name": "Mode",
                "is-subcategory": true,
                "mandatory": true,
                "values": { "values": { "4lxn1y4l": {} } }
            }
        ]))
        .unwrap();

        assert!(matches!(
            normalize_variables(raw),
            Err(BoardError::Parse)
        ));
    }
}
