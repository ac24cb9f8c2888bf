use std::collections::HashSet;
use std::env;
use std::fs;
use chrono_tz::Tz;
use log::LevelFilter;
use serde::Deserialize;
use crate::analysis::AlignmentRule;
use crate::errors::ConfigError;

/// Max number of external sites cross-checked per city
pub const MAX_SITES: usize = 4;

#[derive(Deserialize, Clone, Debug)]
pub struct Site {
    pub name: String,
    pub url: String,
    pub selector: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub long: f64,
    #[serde(default)]
    pub sites: Vec<Site>,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct ForecastParameters {
    pub timezone: Tz,
    pub target_hours: Vec<u32>,
    pub annotate_hours: Vec<u32>,
    pub uncertain_temp_range: f64,
    pub uncertain_rain_range: f64,
}

impl Default for ForecastParameters {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Paris,
            target_hours: vec![9, 12, 15, 18, 21, 0],
            annotate_hours: vec![15, 21],
            uncertain_temp_range: 3.0,
            uncertain_rain_range: 20.0,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Files {
    pub docs_dir: String,
    pub chart_dir: String,
}

impl Default for Files {
    fn default() -> Self {
        Self { docs_dir: "docs".to_string(), chart_dir: "docs".to_string() }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ChartParameters {
    pub font_path: Option<String>,
    pub bold_font_path: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct AnalysisParameters {
    pub enabled: bool,
    pub model: String,
    pub temperature: f64,
    pub rules: Option<Vec<AlignmentRule>>,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            rules: None,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct NotificationParameters {
    pub title: String,
    pub priority: i8,
    pub sound: Option<String>,
}

impl Default for NotificationParameters {
    fn default() -> Self {
        Self {
            title: "☀️ Daily Weather Update".to_string(),
            priority: 1,
            sound: Some("pushover".to_string()),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
    pub env_file: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_path: "weather-notify.log".to_string(),
            log_level: LevelFilter::Info,
            log_to_stdout: true,
            env_file: "weather.env".to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub forecast: ForecastParameters,
    #[serde(default)]
    pub files: Files,
    #[serde(default)]
    pub chart: ChartParameters,
    #[serde(default)]
    pub analysis: AnalysisParameters,
    #[serde(default)]
    pub notification: NotificationParameters,
    pub cities: Vec<City>,
}

/// API keys, read from the environment (optionally populated from an env file)
pub struct ApiKeys {
    pub openweather: Option<String>,
    pub weatherapi: Option<String>,
    pub pushover_token: Option<String>,
    pub pushover_user: Option<String>,
    pub openai: Option<String>,
}

impl ApiKeys {
    pub const OPENWEATHER: &'static str = "OPENWEATHER_API_KEY";
    pub const WEATHERAPI: &'static str = "WEATHERAPI_API_KEY";
    pub const PUSHOVER_TOKEN: &'static str = "PUSHOVER_API_TOKEN";
    pub const PUSHOVER_USER: &'static str = "PUSHOVER_USER_KEY";
    pub const OPENAI: &'static str = "OPENAI_API_KEY";

    /// Reads all known keys from the process environment. Empty values count as missing.
    pub fn from_env() -> ApiKeys {
        ApiKeys {
            openweather: read_key(Self::OPENWEATHER),
            weatherapi: read_key(Self::WEATHERAPI),
            pushover_token: read_key(Self::PUSHOVER_TOKEN),
            pushover_user: read_key(Self::PUSHOVER_USER),
            openai: read_key(Self::OPENAI),
        }
    }

    /// Returns a key that the calling stage can't run without
    ///
    /// # Arguments
    ///
    /// * 'key' - the key as read from the environment
    /// * 'name' - environment variable name, used for the error message
    pub fn required(key: &Option<String>, name: &str) -> Result<String, ConfigError> {
        key.clone().ok_or_else(|| ConfigError::MissingKey(name.to_string()))
    }
}

fn read_key(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loads the env file into the process environment, existing variables are not overwritten.
/// Returns false if the file doesn't exist.
///
/// # Arguments
///
/// * 'env_file' - path to the env file
pub fn load_env_file(env_file: &str) -> Result<bool, ConfigError> {
    match dotenvy::from_filename(env_file) {
        Ok(_) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(ConfigError::from(e)),
    }
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)?;
    parse_config(&toml)
}

/// Parses and validates configuration from a toml string
///
/// # Arguments
///
/// * 'toml' - the configuration document
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(toml)?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.cities.is_empty() {
        return Err(ConfigError::from("no cities configured"));
    }
    for city in &config.cities {
        if city.name.trim().is_empty() {
            return Err(ConfigError::from("city with empty name"));
        }
        if city.sites.len() > MAX_SITES {
            return Err(ConfigError::Invalid(
                format!("{} has {} sites, at most {} allowed", city.name, city.sites.len(), MAX_SITES)));
        }
    }

    let hours = &config.forecast.target_hours;
    if hours.is_empty() {
        return Err(ConfigError::from("target_hours is empty"));
    }
    if hours.iter().chain(config.forecast.annotate_hours.iter()).any(|h| *h > 23) {
        return Err(ConfigError::from("hours must be within 0-23"));
    }
    if hours.iter().collect::<HashSet<_>>().len() != hours.len() {
        return Err(ConfigError::from("target_hours contains duplicates"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AlignmentTag;

    const MINIMAL: &str = r#"
[[cities]]
name = "Paris"
lat = 48.8566
long = 2.3522
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse_config(MINIMAL).unwrap();

        assert_eq!(config.forecast.target_hours, vec![9, 12, 15, 18, 21, 0]);
        assert_eq!(config.forecast.annotate_hours, vec![15, 21]);
        assert_eq!(config.forecast.timezone, chrono_tz::Europe::Paris);
        assert_eq!(config.forecast.uncertain_temp_range, 3.0);
        assert_eq!(config.forecast.uncertain_rain_range, 20.0);
        assert_eq!(config.files.docs_dir, "docs");
        assert_eq!(config.general.log_level, LevelFilter::Info);
        assert!(!config.analysis.enabled);
        assert!(config.cities[0].sites.is_empty());
    }

    #[test]
    fn full_config_is_parsed() {
        let toml = r#"
[general]
log_path = "/tmp/wn.log"
log_level = "debug"
log_to_stdout = false

[forecast]
timezone = "Europe/Brussels"
target_hours = [9, 12, 15]

[analysis]
enabled = true
model = "gpt-4o-mini"
temperature = 0.2

[[analysis.rules]]
tag = "divergent"
cues = ["way off"]

[notification]
title = "Weather"
priority = 0

[[cities]]
name = "Brussels"
lat = 50.8503
long = 4.3517

[[cities.sites]]
name = "YR.no"
url = "https://www.yr.no/en/forecast/daily-table/2-2800866/Belgium/Brussels-Capital/Brussels"
selector = "table"
"#;
        let config = parse_config(toml).unwrap();

        assert_eq!(config.general.log_level, LevelFilter::Debug);
        assert_eq!(config.forecast.timezone, chrono_tz::Europe::Brussels);
        assert_eq!(config.analysis.model, "gpt-4o-mini");
        let rules = config.analysis.rules.as_ref().unwrap();
        assert_eq!(rules[0].tag, AlignmentTag::Divergent);
        assert_eq!(config.notification.priority, 0);
        assert_eq!(config.notification.sound.as_deref(), Some("pushover"));
        assert_eq!(config.cities[0].sites[0].selector, "table");
        assert_eq!(config.cities[0].name, "Brussels");
    }

    #[test]
    fn invalid_hours_are_rejected() {
        let toml = format!("[forecast]\ntarget_hours = [9, 24]\n{}", MINIMAL);
        assert!(matches!(parse_config(&toml), Err(ConfigError::Invalid(_))));

        let toml = format!("[forecast]\ntarget_hours = [9, 9]\n{}", MINIMAL);
        assert!(matches!(parse_config(&toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_city_list_is_rejected() {
        assert!(matches!(parse_config("cities = []"), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn too_many_sites_are_rejected() {
        let mut toml = MINIMAL.to_string();
        for i in 0..5 {
            toml += &format!("[[cities.sites]]\nname = \"s{}\"\nurl = \"http://s{}\"\nselector = \"table\"\n", i, i);
        }
        assert!(matches!(parse_config(&toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_required_key_is_reported_by_name() {
        let err = ApiKeys::required(&None, ApiKeys::OPENWEATHER).unwrap_err();
        assert!(err.to_string().contains("OPENWEATHER_API_KEY"));
        assert_eq!(ApiKeys::required(&Some("k".to_string()), ApiKeys::OPENAI).unwrap(), "k");
    }

    #[test]
    fn missing_env_file_is_tolerated() {
        assert!(!load_env_file("/nonexistent/weather.env").unwrap());
    }
}
