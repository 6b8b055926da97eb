//! OpenAI chat-completions client.
//!
//! One call shape: a system message plus a user message, temperature pinned
//! by configuration (0.0 — as deterministic as the hosted model allows),
//! and the first choice's text returned verbatim.

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::LlmConfig;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatClient {
    /// Requires `OPENAI_API_KEY`; construction fails without it.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => bail!("OPENAI_API_KEY not found in environment variables."),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Send a system + user message pair and return the assistant's text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI chat API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing choices[0].message.content"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_first_choice_content() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "The exit load is nil." } },
                { "message": { "role": "assistant", "content": "ignored" } },
            ]
        });
        assert_eq!(
            parse_chat_response(&json).unwrap(),
            "The exit load is nil."
        );
    }

    #[test]
    fn parse_rejects_empty_choices() {
        let json = serde_json::json!({ "choices": [] });
        assert!(parse_chat_response(&json).is_err());
    }

    #[test]
    fn parse_rejects_missing_content() {
        let json = serde_json::json!({
            "choices": [ { "message": { "role": "assistant" } } ]
        });
        assert!(parse_chat_response(&json).is_err());
    }
}
