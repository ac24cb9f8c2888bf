pub mod errors;

use std::fs;
use std::path::Path;
use std::time::Duration;
use log::{error, info, warn};
use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::StatusCode;
use crate::config::NotificationParameters;
use crate::manager_pushover::errors::PushoverError;
use crate::models::pushover::MessageResponse;
use crate::pipeline::Notifier;

const MESSAGES_URL: &str = "https://api.pushover.net/1/messages.json";

/// Pushover message sender
pub struct Pushover {
    client: Client,
    token: String,
    user: String,
    title: String,
    priority: i8,
    sound: Option<String>,
}

impl Pushover {
    /// Returns a Pushover sender
    ///
    /// # Arguments
    ///
    /// * 'token' - application API token
    /// * 'user' - user key of the recipient
    /// * 'params' - title, priority and sound for every message
    pub fn new(token: &str, user: &str, params: &NotificationParameters) -> Result<Pushover, PushoverError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Pushover {
            client,
            token: token.to_string(),
            user: user.to_string(),
            title: params.title.clone(),
            priority: params.priority,
            sound: params.sound.clone(),
        })
    }

    /// Sends a message, with an optional png attached.
    ///
    /// A reply other than 200 is logged and reported as `Ok(false)`, only transport and
    /// attachment errors are returned as errors.
    ///
    /// # Arguments
    ///
    /// * 'message' - the message body
    /// * 'image' - path to a png to attach
    pub fn send(&self, message: &str, image: Option<&Path>) -> Result<bool, PushoverError> {
        let mut form = Form::new()
            .text("token", self.token.clone())
            .text("user", self.user.clone())
            .text("message", message.to_string())
            .text("title", self.title.clone())
            .text("priority", self.priority.to_string());

        if let Some(sound) = &self.sound {
            form = form.text("sound", sound.clone());
        }

        if let Some(path) = image {
            let bytes = fs::read(path)?;
            let part = Part::bytes(bytes)
                .file_name("image.png")
                .mime_str("image/png")?;
            form = form.part("attachment", part);
        }

        let res = self.client
            .post(MESSAGES_URL)
            .multipart(form)
            .send()?;

        let status = res.status();
        let body = res.text()?;
        if status != StatusCode::OK {
            error!("Pushover returned {}: {}", status, body);
            return Ok(false);
        }

        match serde_json::from_str::<MessageResponse>(&body) {
            Ok(reply) if reply.status != 1 => {
                warn!("Pushover accepted message with status {}: {:?}", reply.status, reply.errors);
            },
            Ok(reply) => {
                info!("notification sent, request {}", reply.request.unwrap_or_default());
            },
            Err(e) => {
                warn!("notification sent, reply not readable: {}", e);
            },
        }

        Ok(true)
    }
}

impl Notifier for Pushover {
    fn notify(&self, message: &str, image: Option<&Path>) -> anyhow::Result<()> {
        self.send(message, image)?;
        Ok(())
    }
}
