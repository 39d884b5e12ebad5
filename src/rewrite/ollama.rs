use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::RewriteConfig;
use crate::error::{Result, SublingoError};
use super::{build_trim_prompt, parse_json_object, require_result, BaseRewriter, Rewriter, TrimRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// Rewriter backed by an Ollama server
pub struct OllamaRewriter {
    base: BaseRewriter,
}

impl OllamaRewriter {
    pub fn new(config: RewriteConfig) -> Result<Self> {
        Ok(Self {
            base: BaseRewriter::new(config)?,
        })
    }

    async fn request_once(&self, prompt: &str) -> Result<Value> {
        let request = GenerateRequest {
            model: self.base.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json".to_string(),
        };

        let url = self.base.url("api/generate");
        debug!("Sending rewrite request to: {}", url);

        let response = self
            .base
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SublingoError::Rewrite(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SublingoError::Rewrite(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SublingoError::Rewrite(format!("Failed to parse response: {}", e)))?;

        debug!("Raw Ollama response: {}", generated.response);
        parse_json_object(&generated.response).and_then(require_result)
    }
}

#[async_trait]
impl Rewriter for OllamaRewriter {
    async fn shorten(&self, request: &TrimRequest) -> Result<Value> {
        let prompt = build_trim_prompt(request);
        self.base.with_retries(|| self.request_once(&prompt)).await
    }
}
