use thiserror::Error;

#[derive(Error, Debug)]
#[error("error in communication with Pushover: {0}")]
pub struct PushoverError(pub String);
impl From<reqwest::Error> for PushoverError {
    fn from(e: reqwest::Error) -> PushoverError {
        PushoverError(format!("http request error: {}", e))
    }
}
impl From<std::io::Error> for PushoverError {
    fn from(e: std::io::Error) -> PushoverError {
        PushoverError(format!("attachment error: {}", e))
    }
}
