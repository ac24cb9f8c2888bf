use thiserror::Error;

#[derive(Error, Debug)]
#[error("error in communication with OpenWeather: {0}")]
pub struct OpenWeatherError(pub String);
impl From<serde_json::Error> for OpenWeatherError {
    fn from(e: serde_json::Error) -> OpenWeatherError {
        OpenWeatherError(format!("json document error: {}", e))
    }
}
impl From<reqwest::Error> for OpenWeatherError {
    fn from(e: reqwest::Error) -> OpenWeatherError {
        OpenWeatherError(format!("http request error: {}", e))
    }
}
