use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f64,
}

#[derive(Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

#[derive(Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}
