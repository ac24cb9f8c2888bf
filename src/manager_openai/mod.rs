pub mod errors;

use std::time::Duration;
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use crate::analysis::Completion;
use crate::manager_openai::errors::OpenAIError;
use crate::models::openai::{ChatMessage, ChatRequest, ChatResponse, ErrorResponse};
use crate::retry;

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const SYSTEM_PROMPT: &str = "You are a helpful weather analyst.";

/// Chat completion client
pub struct OpenAI {
    client: Client,
    api_key: String,
    model: String,
    temperature: f64,
}

impl OpenAI {
    /// Returns an OpenAI client
    ///
    /// # Arguments
    ///
    /// * 'api_key' - API key used as bearer token
    /// * 'model' - the chat model to use
    /// * 'temperature' - sampling temperature
    pub fn new(api_key: &str, model: &str, temperature: f64) -> Result<OpenAI, OpenAIError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(OpenAI {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    /// Sends a single user prompt, preceded by the analyst system prompt, and returns the
    /// content of the first choice
    ///
    /// # Arguments
    ///
    /// * 'prompt' - the user prompt
    pub fn chat(&self, prompt: &str) -> Result<String, OpenAIError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.temperature,
        };

        let res = self.client
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = res.status();
        let json = res.text()?;
        if status != StatusCode::OK {
            let message = serde_json::from_str::<ErrorResponse>(&json)
                .map(|e| e.error.message)
                .unwrap_or(json);
            return Err(OpenAIError::Api { status: status.as_u16(), message });
        }

        debug!("completion reply: {}", json);
        content_of(&json)
    }
}

impl Completion for OpenAI {
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(retry!(|| self.chat(prompt))?)
    }
}

/// Extracts the trimmed content of the first choice of a completion reply
///
/// # Arguments
///
/// * 'json' - the raw reply body
fn content_of(json: &str) -> Result<String, OpenAIError> {
    let response: ChatResponse = serde_json::from_str(json)?;

    response.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or(OpenAIError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_choice_content_is_returned() {
        let json = r#"{"choices":[
            {"index":0,"message":{"role":"assistant","content":"  🧠 AI Summary: dry and warm.\nConfidence: High \n"}},
            {"index":1,"message":{"role":"assistant","content":"other"}}
        ]}"#;

        assert_eq!(content_of(json).unwrap(), "🧠 AI Summary: dry and warm.\nConfidence: High");
    }

    #[test]
    fn missing_content_is_an_error() {
        assert!(matches!(content_of(r#"{"choices":[]}"#), Err(OpenAIError::EmptyResponse)));
        assert!(matches!(
            content_of(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#),
            Err(OpenAIError::EmptyResponse)));
        assert!(matches!(content_of("not json"), Err(OpenAIError::Document(_))));
    }
}
