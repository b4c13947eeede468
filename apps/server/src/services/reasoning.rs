// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reasoning collaborator client (OpenAI-compatible chat completions).

use std::future::Future;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;

use crate::config::ReasoningConfig;
use crate::error::CollaboratorError;

const SERVICE: &str = "reasoning service";
const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f64 = 0.1;

/// Looks at a drawing and answers the dimension prompt.
pub trait DrawingReasoner: Send + Sync {
    /// Raw message content of the reply.
    fn reason(
        &self,
        image: &[u8],
        prompt: &str,
    ) -> impl Future<Output = Result<String, CollaboratorError>> + Send;
}

pub struct ReasoningClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// MIME type from the leading magic bytes, JPEG when unknown.
pub fn image_mime(image: &[u8]) -> &'static str {
    match image {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/jpeg",
    }
}

fn request_body(model: &str, image: &[u8], prompt: &str) -> serde_json::Value {
    let data_url = format!("data:{};base64,{}", image_mime(image), STANDARD.encode(image));
    serde_json::json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                { "type": "image_url", "image_url": { "url": data_url } },
            ],
        }],
        "max_tokens": MAX_TOKENS,
        "temperature": TEMPERATURE,
    })
}

fn message_content(completion: ChatCompletion) -> Result<String, CollaboratorError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(CollaboratorError::Decode {
            service: SERVICE,
            message: "reply has no message content".into(),
        })
}

impl ReasoningClient {
    pub fn new(http: reqwest::Client, config: &ReasoningConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

impl DrawingReasoner for ReasoningClient {
    async fn reason(&self, image: &[u8], prompt: &str) -> Result<String, CollaboratorError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body(&self.model, image, prompt))
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Reasoning service rejected request");
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let completion: ChatCompletion = resp
            .json()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(SERVICE, e))?;

        let content = message_content(completion)?;
        tracing::debug!(chars = content.len(), model = %self.model, "Reasoning reply received");
        Ok(content)
    }
}
