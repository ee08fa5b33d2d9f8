pub mod gpt;
pub(crate) mod http_errors;
pub mod llama;

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;

use crate::config::LlmType;
use crate::model::{Message, query_messages};

pub use gpt::GptRequest;
pub use llama::LlamaRequest;

/// Request body and headers ready to be posted to the endpoint.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatRequest {
    Llama(LlamaRequest),
    Gpt(GptRequest),
}

impl ChatRequest {
    pub fn new(llm_type: LlmType, messages: &[Message]) -> Self {
        match llm_type {
            LlmType::Llama => Self::Llama(LlamaRequest::new(messages)),
            LlmType::Gpt => Self::Gpt(GptRequest::new(messages)),
        }
    }

    pub fn headers(&self, api_key: &str) -> Result<HeaderMap> {
        match self {
            Self::Llama(_) => LlamaRequest::headers(api_key),
            Self::Gpt(_) => GptRequest::headers(api_key),
        }
    }

    pub fn to_body(&self) -> Result<Vec<u8>> {
        let body = match self {
            Self::Llama(request) => serde_json::to_vec(request),
            Self::Gpt(request) => serde_json::to_vec(request),
        };
        body.context("Failed to serialize request body")
    }
}

pub fn build(
    llm_type: LlmType,
    api_key: &str,
    system_prompt: &str,
    user_query: &str,
) -> Result<PreparedRequest> {
    let request = ChatRequest::new(llm_type, &query_messages(system_prompt, user_query));
    Ok(PreparedRequest {
        body: request.to_body()?,
        headers: request.headers(api_key)?,
    })
}

#[cfg(test)]
mod tests {
    use reqwest::header::AUTHORIZATION;
    use serde_json::Value;

    use super::{ChatRequest, build};
    use crate::config::LlmType;
    use crate::model::query_messages;

    fn body_json(llm_type: LlmType, user_query: &str) -> Value {
        let prepared = build(llm_type, "key", "system text", user_query).expect("build");
        serde_json::from_slice(&prepared.body).expect("body should be JSON")
    }

    #[test]
    fn new_selects_variant_from_llm_type() {
        let messages = query_messages("s", "u");
        assert!(matches!(
            ChatRequest::new(LlmType::Llama, &messages),
            ChatRequest::Llama(_)
        ));
        assert!(matches!(
            ChatRequest::new(LlmType::Gpt, &messages),
            ChatRequest::Gpt(_)
        ));
    }

    #[test]
    fn llama_messages_are_plain_strings_for_any_query() {
        for query in ["list files", "", "quote \" and\nnewline"] {
            let value = body_json(LlmType::Llama, query);
            let messages = value["messages"].as_array().expect("messages array");
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0]["role"], "system");
            assert_eq!(messages[1]["role"], "user");
            assert_eq!(messages[0]["content"], "system text");
            assert_eq!(messages[1]["content"], query);
            assert_eq!(value["max_tokens"], 800);
        }
    }

    #[test]
    fn gpt_messages_are_text_parts_for_any_query() {
        for query in ["get pods", "", "ünïcode"] {
            let value = body_json(LlmType::Gpt, query);
            let messages = value["messages"].as_array().expect("messages array");
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[1]["content"][0]["type"], "text");
            assert_eq!(messages[1]["content"][0]["text"], query);
            assert!(value.get("best_of").is_none());
        }
    }

    #[test]
    fn build_selects_header_scheme() {
        let llama = build(LlmType::Llama, "k", "s", "u").expect("llama build");
        assert_eq!(llama.headers[AUTHORIZATION], "Bearer k");

        let gpt = build(LlmType::Gpt, "k", "s", "u").expect("gpt build");
        assert_eq!(gpt.headers["api-key"], "k");
        assert!(!gpt.headers.contains_key(AUTHORIZATION));
    }
}
