use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;

use crate::model::{Message, MessageRole};

const MAX_TOKENS: u32 = 800;
const TEMPERATURE: u32 = 1;
const TOP_P: f64 = 0.1;
const BEST_OF: u32 = 1;
const PRESENCE_PENALTY: u32 = 0;
const FLAG_OFF: &str = "false";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlamaRequest {
    messages: Vec<LlamaMessage>,
    max_tokens: u32,
    temperature: u32,
    top_p: f64,
    best_of: u32,
    presence_penalty: u32,
    // The serving stack expects these as strings, not JSON booleans.
    use_beam_search: &'static str,
    ignore_eos: &'static str,
    skip_special_tokens: &'static str,
    stream: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct LlamaMessage {
    role: MessageRole,
    content: String,
}

impl LlamaRequest {
    pub fn new(messages: &[Message]) -> Self {
        Self {
            messages: messages
                .iter()
                .map(|msg| LlamaMessage {
                    role: msg.role,
                    content: msg.content.clone(),
                })
                .collect(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            best_of: BEST_OF,
            presence_penalty: PRESENCE_PENALTY,
            use_beam_search: FLAG_OFF,
            ignore_eos: FLAG_OFF,
            skip_special_tokens: FLAG_OFF,
            stream: FLAG_OFF,
        }
    }

    pub fn headers(api_key: &str) -> Result<HeaderMap> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .context("The configured api_key cannot be sent in an Authorization header")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }
}
