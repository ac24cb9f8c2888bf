use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Hour {
    /// Location local time, `YYYY-MM-DD HH:MM`
    pub time: String,
    pub temp_c: f64,
    #[serde(default)]
    pub chance_of_rain: f64,
}

#[derive(Deserialize, Debug)]
pub struct ForecastDay {
    pub hour: Vec<Hour>,
}

#[derive(Deserialize, Debug)]
pub struct Forecast {
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Deserialize, Debug)]
pub struct ApiError {
    pub code: Option<i64>,
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct ForecastResponse {
    pub forecast: Option<Forecast>,
    pub error: Option<ApiError>,
}
