use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Main {
    pub temp: f64,
}

#[derive(Deserialize, Debug)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: Main,
    /// Probability of precipitation, 0-1
    #[serde(default)]
    pub pop: f64,
}

/// 5 day / 3 hour forecast. Error replies from the API carry `cod` and `message` but no `list`.
#[derive(Deserialize, Debug)]
pub struct ForecastResponse {
    pub list: Option<Vec<ForecastEntry>>,
    pub message: Option<serde_json::Value>,
}
