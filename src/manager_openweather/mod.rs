pub mod errors;

use std::time::Duration;
use chrono::DateTime;
use log::{error, info};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use crate::config::City;
use crate::manager_openweather::errors::OpenWeatherError;
use crate::models::forecast::Sample;
use crate::models::openweather::{ForecastEntry, ForecastResponse};
use crate::pipeline::ForecastSource;
use crate::retry;
use crate::target_hours::{interpolate_at, TargetDay};

const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Client for the OpenWeather 5 day / 3 hour forecast
pub struct OpenWeather {
    client: Client,
    api_key: String,
}

impl OpenWeather {
    /// Returns an OpenWeather client
    ///
    /// # Arguments
    ///
    /// * 'api_key' - the OpenWeather API key
    pub fn new(api_key: &str) -> Result<OpenWeather, OpenWeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(OpenWeather { client, api_key: api_key.to_string() })
    }

    /// Retrieves the 3-hourly forecast for a city and interpolates it onto the target grid.
    /// A reply without forecast entries is logged and gives an empty result.
    ///
    /// # Arguments
    ///
    /// * 'city' - the city, its coordinates are used for the lookup
    /// * 'day' - the target grid to produce samples for
    pub fn get_forecast(&self, city: &City, day: &TargetDay) -> Result<Vec<Sample>, OpenWeatherError> {
        let lat = city.lat.to_string();
        let lon = city.long.to_string();
        let query = vec![
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("units", "metric"),
            ("appid", self.api_key.as_str()),
        ];

        let res = self.client
            .get(FORECAST_URL)
            .query(&query)
            .send()?;

        let status = res.status();
        let json = res.text()?;
        if status != StatusCode::OK {
            error!("OpenWeather returned {} for {}: {}", status, city.name, json);
            return Ok(Vec::new());
        }

        let samples = samples_from_body(&json, &city.name, day)?;
        info!("OpenWeather: {} samples for {}", samples.len(), city.name);

        Ok(samples)
    }
}

impl ForecastSource for OpenWeather {
    fn name(&self) -> &str {
        "OpenWeather"
    }

    fn fetch(&self, city: &City, day: &TargetDay) -> anyhow::Result<Vec<Sample>> {
        Ok(retry!(|| self.get_forecast(city, day))?)
    }
}

/// Parses a forecast reply and converts it to samples on the grid. A reply without a forecast
/// list, such as `{"cod":"404","message":"city not found"}`, is logged and gives no samples.
///
/// # Arguments
///
/// * 'json' - reply body
/// * 'city' - city name, for logging
/// * 'day' - the target grid
pub fn samples_from_body(json: &str, city: &str, day: &TargetDay) -> Result<Vec<Sample>, OpenWeatherError> {
    let response: ForecastResponse = serde_json::from_str(json)?;

    match response.list {
        Some(entries) => Ok(samples_from_entries(&entries, day)),
        None => {
            let message = response.message.map(|m| m.to_string()).unwrap_or_default();
            error!("OpenWeather reply for {} has no forecast list: {}", city, message);
            Ok(Vec::new())
        }
    }
}

/// Converts raw 3-hourly entries into one sample per target slot.
///
/// Entry times are converted to the grid's time zone and rain probability is scaled to percent.
/// Each slot gets a time weighted interpolation between the surrounding entries, or the nearest
/// entry when the slot is outside the covered range.
///
/// # Arguments
///
/// * 'entries' - forecast entries as delivered by the API
/// * 'day' - the target grid
pub fn samples_from_entries(entries: &[ForecastEntry], day: &TargetDay) -> Vec<Sample> {
    let mut points = entries.iter()
        .filter_map(|e| {
            let time = DateTime::from_timestamp(e.dt, 0)?.with_timezone(&day.tz);
            Some(Sample::new(time, e.main.temp, e.pop * 100.0))
        })
        .collect::<Vec<Sample>>();
    points.sort_by(|a, b| a.time.cmp(&b.time));

    day.slots()
        .iter()
        .filter_map(|slot| interpolate_at(&points, slot.time))
        .collect()
}
