use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::RewriteConfig;
use crate::error::{Result, SublingoError};
use super::{build_trim_prompt, parse_json_object, require_result, BaseRewriter, Rewriter, TrimRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Rewriter backed by an OpenAI-compatible chat completions endpoint
pub struct ChatCompletionRewriter {
    base: BaseRewriter,
}

impl ChatCompletionRewriter {
    pub fn new(config: RewriteConfig) -> Result<Self> {
        Ok(Self {
            base: BaseRewriter::new(config)?,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.base.config.model,
            "messages": [
                ChatMessage {
                    role: "system".to_string(),
                    content: "You shorten subtitles and answer only with a JSON object.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            "response_format": { "type": "json_object" },
        })
    }

    async fn request_once(&self, prompt: &str) -> Result<Value> {
        let url = self.base.url("v1/chat/completions");
        debug!("Sending rewrite request to: {}", url);

        let mut request = self.base.client.post(&url).json(&self.request_body(prompt));
        if let Some(api_key) = self.base.config.api_key.as_deref() {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SublingoError::Rewrite(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SublingoError::Rewrite(format!(
                "Chat completion API error {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| SublingoError::Rewrite(format!("Failed to parse response: {}", e)))?;

        let content = extract_content(chat)?;
        debug!("Raw chat completion content: {}", content);
        parse_json_object(&content).and_then(require_result)
    }
}

fn extract_content(chat: ChatResponse) -> Result<String> {
    chat.choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| SublingoError::MalformedResponse("Response contained no choices".to_string()))
}

#[async_trait]
impl Rewriter for ChatCompletionRewriter {
    async fn shorten(&self, request: &TrimRequest) -> Result<Value> {
        let prompt = build_trim_prompt(request);
        self.base.with_retries(|| self.request_once(&prompt)).await
    }
}
