use thiserror::Error;

#[derive(Error, Debug)]
#[error("error in communication with WeatherAPI: {0}")]
pub struct WeatherApiError(pub String);
impl From<serde_json::Error> for WeatherApiError {
    fn from(e: serde_json::Error) -> WeatherApiError {
        WeatherApiError(format!("json document error: {}", e))
    }
}
impl From<reqwest::Error> for WeatherApiError {
    fn from(e: reqwest::Error) -> WeatherApiError {
        WeatherApiError(format!("http request error: {}", e))
    }
}
