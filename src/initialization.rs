use std::env;
use log::{info, warn};
use crate::config::{load_config, load_env_file, ApiKeys, Config};
use crate::errors::InitError;
use crate::logging;
use crate::manager_openai::OpenAI;
use crate::manager_openweather::OpenWeather;
use crate::manager_pushover::Pushover;
use crate::manager_scraper::Scraper;
use crate::manager_weatherapi::WeatherApi;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "WEATHER_NOTIFY_CONFIG";
const DEFAULT_CONFIG: &str = "config.toml";

/// Loads configuration, sets up logging and reads API keys from the environment, after
/// first loading the configured env file if there is one
///
pub fn init() -> Result<(Config, ApiKeys), InitError> {
    let config_path = env::var(CONFIG_ENV).unwrap_or(DEFAULT_CONFIG.to_string());
    let config = load_config(&config_path)?;

    logging::init(&config.general)?;

    // Print version
    info!("weather-notify version: {}", env!("CARGO_PKG_VERSION"));
    info!("configuration loaded from {}", config_path);

    if !load_env_file(&config.general.env_file)? {
        warn!("env file {} not found, using process environment only", config.general.env_file);
    }

    Ok((config, ApiKeys::from_env()))
}

/// Instantiates both weather API clients
///
/// # Arguments
///
/// * 'keys' - API keys
pub fn weather_sources(keys: &ApiKeys) -> Result<(OpenWeather, WeatherApi), InitError> {
    let openweather = OpenWeather::new(&ApiKeys::required(&keys.openweather, ApiKeys::OPENWEATHER)?)?;
    let weatherapi = WeatherApi::new(&ApiKeys::required(&keys.weatherapi, ApiKeys::WEATHERAPI)?)?;

    Ok((openweather, weatherapi))
}

/// Instantiates the Pushover notifier
///
/// # Arguments
///
/// * 'config' - configuration, for message title, priority and sound
/// * 'keys' - API keys
pub fn notifier(config: &Config, keys: &ApiKeys) -> Result<Pushover, InitError> {
    let token = ApiKeys::required(&keys.pushover_token, ApiKeys::PUSHOVER_TOKEN)?;
    let user = ApiKeys::required(&keys.pushover_user, ApiKeys::PUSHOVER_USER)?;

    Ok(Pushover::new(&token, &user, &config.notification)?)
}

/// Instantiates the site scraper and the completion client used for analysis
///
/// # Arguments
///
/// * 'config' - configuration, for model and temperature
/// * 'keys' - API keys
pub fn analysis_backends(config: &Config, keys: &ApiKeys) -> Result<(Scraper, OpenAI), InitError> {
    let api_key = ApiKeys::required(&keys.openai, ApiKeys::OPENAI)?;
    let scraper = Scraper::new()?;
    let openai = OpenAI::new(&api_key, &config.analysis.model, config.analysis.temperature)?;

    Ok((scraper, openai))
}
