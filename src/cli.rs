use clap::Parser;
use serde::Serialize;

fn is_false(b: &bool) -> bool {
    !b
}

#[derive(Debug, Parser, Serialize)]
pub struct Cli {
    /// Game id or abbreviation to rank
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,

    /// Category id within the game
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    /// How many places to show
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,

    /// Subcategory selection, repeatable: --var <variable-id>=<value-id>
    #[arg(long = "var", value_name = "ID=VALUE")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,

    /// Refetch even when the cached board is still fresh
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub force_refresh: bool,
}
