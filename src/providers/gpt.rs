use anyhow::{Context, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::model::{Message, MessageRole};

const MAX_TOKENS: u32 = 800;
const TEMPERATURE: u32 = 1;
const TOP_P: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GptRequest {
    messages: Vec<GptMessage>,
    max_tokens: u32,
    temperature: u32,
    top_p: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct GptMessage {
    role: MessageRole,
    content: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl GptRequest {
    pub fn new(messages: &[Message]) -> Self {
        Self {
            messages: messages
                .iter()
                .map(|msg| GptMessage {
                    role: msg.role,
                    content: vec![ContentPart {
                        kind: "text",
                        text: msg.content.clone(),
                    }],
                })
                .collect(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
        }
    }

    pub fn headers(api_key: &str) -> Result<HeaderMap> {
        let mut key = HeaderValue::from_str(api_key)
            .context("The configured api_key cannot be sent in an api-key header")?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static("api-key"), key);
        Ok(headers)
    }
}
