use std::fmt;
use std::fmt::Formatter;
use chrono::NaiveDate;
use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;
use crate::manager_openai::errors::OpenAIError;
use crate::manager_openweather::errors::OpenWeatherError;
use crate::manager_pushover::errors::PushoverError;
use crate::manager_weatherapi::errors::WeatherApiError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ConfigError::Io: {0}")]
    Io(#[from] std::io::Error),
    #[error("ConfigError::Toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("ConfigError::EnvFile: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("ConfigError::MissingKey: environment variable {0} is not set")]
    MissingKey(String),
    #[error("ConfigError::Invalid: {0}")]
    Invalid(String),
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError::Invalid(e.to_string()) }
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("PersistError::Io: {0}")]
    Io(#[from] std::io::Error),
    #[error("PersistError::Document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("PersistError::NotFound: no forecast document at {0}")]
    NotFound(String),
    #[error("PersistError::Stale: forecast document is for {found}, expected {expected}")]
    Stale { found: NaiveDate, expected: NaiveDate },
}

#[derive(Error, Debug)]
#[error("error rendering chart: {0}")]
pub struct ChartError(pub String);
impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        ChartError(format!("drawing error: {}", e))
    }
}
impl From<std::io::Error> for ChartError {
    fn from(e: std::io::Error) -> Self {
        ChartError(format!("io error: {}", e))
    }
}

#[derive(Error, Debug)]
#[error("error setting up logging: {0}")]
pub struct LoggingError(pub String);
impl From<std::io::Error> for LoggingError {
    fn from(e: std::io::Error) -> Self { LoggingError(e.to_string()) }
}
impl From<log::SetLoggerError> for LoggingError {
    fn from(e: log::SetLoggerError) -> Self { LoggingError(e.to_string()) }
}

pub struct InitError(pub String);

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "InitError: {}", self.0)
    }
}
impl fmt::Debug for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "InitError({:?})", self.0)
    }
}
impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self { InitError(e.to_string()) }
}
impl From<LoggingError> for InitError {
    fn from(e: LoggingError) -> Self { InitError(e.to_string()) }
}
impl From<OpenWeatherError> for InitError {
    fn from(e: OpenWeatherError) -> Self { InitError(e.to_string()) }
}
impl From<WeatherApiError> for InitError {
    fn from(e: WeatherApiError) -> Self { InitError(e.to_string()) }
}
impl From<OpenAIError> for InitError {
    fn from(e: OpenAIError) -> Self { InitError(e.to_string()) }
}
impl From<PushoverError> for InitError {
    fn from(e: PushoverError) -> Self { InitError(e.to_string()) }
}
impl From<reqwest::Error> for InitError {
    fn from(e: reqwest::Error) -> Self { InitError(format!("http client error: {}", e)) }
}
