use crate::cli::Cli;
use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::Path;
use tracing::Level;

const TRACE_LEVELS: [&'static str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

pub static SETTINGS: Lazy<Settings> = Lazy::new(|| Settings::new());

// Settings are a singleton generated at runtime. All settings may be
// configured via environment variables. Example:
// SPEEDRUN_API_KEY="xxx" would set speedrun_api_key to the xxx value.
#[derive(Deserialize, Debug)]
pub struct Settings {
    #[serde(default = "default_trace_level")]
    trace_level: String,
    #[serde(default = "default_speedrun_base_url")]
    pub speedrun_base_url: String,
    // Attached as X-API-Key to every upstream call; may be empty.
    #[serde(default = "default_speedrun_api_key")]
    pub speedrun_api_key: String,
    #[serde(default = "default_speedrun_api_timeout_sec")]
    pub speedrun_api_timeout_sec: u64,
    #[serde(default = "default_game_id")]
    pub game_id: String,
    #[serde(default = "default_category_id")]
    pub category_id: String,
    #[serde(default = "default_top")]
    pub top: u32,
    // Subcategory selections as "variable-id=value-id" pairs.
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

impl Settings {
    pub fn new() -> Self {
        let local_settings_yaml_file = ".env.local.yaml";
        let settings: Settings = match Path::new(local_settings_yaml_file).exists() {
            true => {
                println!(
                    "\n######################################\n\
                       ##   Found '.env.local.yaml' file,  ##\n\
                       ##   loading local configuration.   ##\n\
                       ######################################\n\
                    "
                );
                Figment::new()
                    .merge(Yaml::file(local_settings_yaml_file))
                    .merge(Env::raw())
                    .merge(Serialized::defaults(Cli::parse()))
                    .extract()
                    .unwrap()
            }
            false => Figment::new()
                .merge(Env::raw())
                .merge(Serialized::defaults(Cli::parse()))
                .extract()
                .unwrap(),
        };

        settings
    }

    pub fn get_trace_level(&self) -> Level {
        get_trace_level(&self.trace_level)
    }
}

fn get_trace_level(level_str: &str) -> Level {
    match level_str {
        level if level == TRACE_LEVELS[0] => Level::TRACE,
        level if level == TRACE_LEVELS[1] => Level::DEBUG,
        level if level == TRACE_LEVELS[2] => Level::INFO,
        level if level == TRACE_LEVELS[3] => Level::WARN,
        level if level == TRACE_LEVELS[4] => Level::ERROR,
        // Default trace level
        _ => Level::INFO,
    }
}

fn default_trace_level() -> String {
    "INFO".to_string()
}

fn default_speedrun_base_url() -> String {
    "https://www.speedrun.com/api/v1".to_string()
}

fn default_speedrun_api_key() -> String {
    "".to_string()
}

fn default_speedrun_api_timeout_sec() -> u64 {
    5
}

fn default_game_id() -> String {
    "silksong".to_string()
}

fn default_category_id() -> String {
    "zd39j4nd".to_string()
}

fn default_top() -> u32 {
    20
}
