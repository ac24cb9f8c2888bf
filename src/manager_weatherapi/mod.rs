pub mod errors;

use std::time::Duration;
use chrono::{NaiveDateTime, TimeZone};
use log::{error, info};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use crate::config::City;
use crate::manager_weatherapi::errors::WeatherApiError;
use crate::models::forecast::Sample;
use crate::models::weatherapi::{ForecastResponse, Hour};
use crate::pipeline::ForecastSource;
use crate::retry;
use crate::target_hours::TargetDay;

const FORECAST_URL: &str = "https://api.weatherapi.com/v1/forecast.json";
/// Today, tomorrow and the day after, so the midnight closing tomorrow is covered
const FORECAST_DAYS: &str = "3";

/// Client for the WeatherAPI hourly forecast
pub struct WeatherApi {
    client: Client,
    api_key: String,
}

impl WeatherApi {
    /// Returns a WeatherApi client
    ///
    /// # Arguments
    ///
    /// * 'api_key' - the WeatherAPI key
    pub fn new(api_key: &str) -> Result<WeatherApi, WeatherApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(WeatherApi { client, api_key: api_key.to_string() })
    }

    /// Retrieves a three day hourly forecast for a city, looked up by name, and picks the entries
    /// that fall exactly on the target grid. An error reply is logged and gives an empty result.
    ///
    /// # Arguments
    ///
    /// * 'city' - the city to look up
    /// * 'day' - the target grid
    pub fn get_forecast(&self, city: &City, day: &TargetDay) -> Result<Vec<Sample>, WeatherApiError> {
        let query = vec![
            ("key", self.api_key.as_str()),
            ("q", city.name.as_str()),
            ("days", FORECAST_DAYS),
            ("aqi", "no"),
            ("alerts", "no"),
        ];

        let res = self.client
            .get(FORECAST_URL)
            .query(&query)
            .send()?;

        let status = res.status();
        let json = res.text()?;
        if status != StatusCode::OK {
            error!("WeatherAPI returned {} for {}: {}", status, city.name, json);
            return Ok(Vec::new());
        }

        let samples = samples_from_body(&json, &city.name, day)?;
        info!("WeatherAPI: {} samples for {}", samples.len(), city.name);

        Ok(samples)
    }
}

impl ForecastSource for WeatherApi {
    fn name(&self) -> &str {
        "WeatherAPI"
    }

    fn fetch(&self, city: &City, day: &TargetDay) -> anyhow::Result<Vec<Sample>> {
        Ok(retry!(|| self.get_forecast(city, day))?)
    }
}

/// Parses a forecast reply and picks the entries on the grid from all returned days. An error
/// reply, or one without a forecast, is logged and gives no samples.
///
/// # Arguments
///
/// * 'json' - reply body
/// * 'city' - city name, for logging
/// * 'day' - the target grid
pub fn samples_from_body(json: &str, city: &str, day: &TargetDay) -> Result<Vec<Sample>, WeatherApiError> {
    let response: ForecastResponse = serde_json::from_str(json)?;
    if let Some(e) = response.error {
        error!("WeatherAPI error for {}: {} ({:?})", city, e.message, e.code);
        return Ok(Vec::new());
    }

    match response.forecast {
        Some(forecast) => {
            let hours = forecast.forecastday
                .iter()
                .flat_map(|d| d.hour.iter())
                .collect::<Vec<&Hour>>();
            Ok(samples_from_hours(&hours, day))
        },
        None => {
            error!("WeatherAPI reply for {} has no forecast", city);
            Ok(Vec::new())
        }
    }
}

/// Picks the hourly entries that sit exactly on a target slot.
///
/// Entry times are local to the location and are read in the grid's time zone. Entries with
/// unreadable times are skipped. The result is in slot order, slots without a matching entry
/// are absent.
///
/// # Arguments
///
/// * 'hours' - hourly entries from all forecast days
/// * 'day' - the target grid
pub fn samples_from_hours(hours: &[&Hour], day: &TargetDay) -> Vec<Sample> {
    let mut samples = hours.iter()
        .filter_map(|h| {
            let naive = NaiveDateTime::parse_from_str(&h.time, "%Y-%m-%d %H:%M").ok()?;
            let time = day.tz.from_local_datetime(&naive).earliest()?;
            day.slot_at(time)?;
            Some(Sample::new(time, h.temp_c, h.chance_of_rain))
        })
        .collect::<Vec<Sample>>();
    samples.sort_by(|a, b| a.time.cmp(&b.time));
    samples.dedup_by(|a, b| a.time == b.time);

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono_tz::Europe::Paris;
    use crate::aggregation::align;
    use crate::target_hours::TargetHours;

    fn grid() -> TargetDay {
        TargetDay::for_date(
            &TargetHours::new(&[9, 12, 15, 18, 21, 0]),
            NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            Paris)
    }

    fn hour(time: &str, temp_c: f64, chance_of_rain: f64) -> Hour {
        Hour { time: time.to_string(), temp_c, chance_of_rain }
    }

    #[test]
    fn only_target_hours_of_the_target_day_are_kept() {
        let raw = vec![
            hour("2025-06-13 09:00", 1.0, 0.0),
            hour("2025-06-14 08:00", 13.0, 0.0),
            hour("2025-06-14 09:00", 15.0, 0.0),
            hour("2025-06-14 12:00", 20.0, 10.0),
            hour("2025-06-14 15:00", 24.0, 20.0),
            hour("2025-06-14 18:00", 22.0, 50.0),
            hour("2025-06-14 21:00", 19.0, 0.0),
            hour("2025-06-15 00:00", 16.0, 0.0),
            hour("2025-06-15 09:00", 30.0, 0.0),
        ];
        let refs = raw.iter().collect::<Vec<&Hour>>();

        let samples = samples_from_hours(&refs, &grid());

        assert_eq!(samples.len(), 6);
        assert_eq!(samples.iter().map(|s| s.temp).collect::<Vec<f64>>(), vec![15.0, 20.0, 24.0, 22.0, 19.0, 16.0]);
        assert_eq!(samples[3].rain, 50.0);
    }

    #[test]
    fn missing_midnight_is_left_out() {
        let raw = vec![
            hour("2025-06-14 21:00", 19.0, 0.0),
            hour("2025-06-14 09:00", 15.0, 0.0),
            hour("not a time", 0.0, 0.0),
        ];
        let refs = raw.iter().collect::<Vec<&Hour>>();

        let samples = samples_from_hours(&refs, &grid());

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].temp, 15.0);
        assert_eq!(samples[1].temp, 19.0);
    }

    /// Reply body with 24 hourly entries per day, temperature is `day * 100 + hour`
    fn reply(days: &[u32]) -> String {
        let forecastday = days.iter()
            .map(|d| {
                let hours = (0..24)
                    .map(|h| format!(r#"{{"time":"2025-06-{:02} {:02}:00","temp_c":{},"chance_of_rain":{}}}"#, d, h, d * 100 + h, h))
                    .collect::<Vec<String>>()
                    .join(",");
                format!(r#"{{"date":"2025-06-{:02}","hour":[{}]}}"#, d, hours)
            })
            .collect::<Vec<String>>()
            .join(",");

        format!(r#"{{"location":{{"name":"Paris"}},"forecast":{{"forecastday":[{}]}}}}"#, forecastday)
    }

    #[test]
    fn three_day_reply_covers_closing_midnight() {
        let samples = samples_from_body(&reply(&[13, 14, 15]), "Paris", &grid()).unwrap();

        assert_eq!(samples.iter().map(|s| s.hour()).collect::<Vec<u32>>(), vec![9, 12, 15, 18, 21, 0]);
        assert_eq!(samples[0].temp, 1409.0);
        assert_eq!(samples[5].temp, 1500.0);
        assert_eq!(samples[5].time, Paris.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn own_midnight_survives_alignment() {
        let b = samples_from_body(&reply(&[13, 14, 15]), "Paris", &grid()).unwrap();
        let a = grid().slots()
            .iter()
            .map(|s| Sample::new(s.time, -5.0, 0.0))
            .collect::<Vec<Sample>>();

        let (_, b) = align(a, b);

        assert_eq!(b.len(), 6);
        assert_eq!(b[5].temp, 1500.0);
    }

    #[test]
    fn two_day_reply_lacks_closing_midnight() {
        let samples = samples_from_body(&reply(&[13, 14]), "Paris", &grid()).unwrap();

        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| s.hour() != 0));
    }

    #[test]
    fn error_reply_gives_no_samples() {
        let json = r#"{"error":{"code":1006,"message":"No matching location found."}}"#;
        let response: ForecastResponse = serde_json::from_str(json).unwrap();
        assert!(response.forecast.is_none());
        assert_eq!(response.error.unwrap().code, Some(1006));

        assert!(samples_from_body(json, "Paris", &grid()).unwrap().is_empty());
        assert!(samples_from_body("{}", "Paris", &grid()).unwrap().is_empty());
    }

    #[test]
    fn malformed_reply_is_an_error() {
        assert!(samples_from_body("not json", "Paris", &grid()).is_err());
    }
}
