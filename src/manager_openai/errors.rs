use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenAIError {
    #[error("OpenAIError::Http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OpenAIError::Api: status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("OpenAIError::Document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("OpenAIError::EmptyResponse: completion carried no content")]
    EmptyResponse,
}
