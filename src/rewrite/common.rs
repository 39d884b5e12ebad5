use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RewriteConfig;
use crate::error::{Result, SublingoError};
use super::TrimRequest;

/// Shared HTTP client, prompt and response handling for rewrite backends
pub struct BaseRewriter {
    pub client: Client,
    pub config: RewriteConfig,
}

impl BaseRewriter {
    pub fn new(config: RewriteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Endpoint URL with a path appended, tolerating a trailing slash
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Run `op`, retrying failures with exponential backoff
    pub async fn with_retries<F, Fut, T>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.config.max_retries => {
                    let delay = self
                        .config
                        .retry_delay_ms
                        .saturating_mul(1u64 << attempt.min(16));
                    warn!(
                        "Rewrite request failed: {}, retry: {}/{}",
                        e,
                        attempt + 1,
                        self.config.max_retries
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Build the prompt asking the model to shorten a subtitle line
pub fn build_trim_prompt(request: &TrimRequest) -> String {
    format!(
        "## Role\n\
         You are a professional subtitle editor.\n\
         \n\
         ## Task\n\
         The subtitle below takes too long to read. Shorten it so it can be \
         comfortably read within {:.2} seconds.\n\
         \n\
         1. Keep the original language; do not translate\n\
         2. Keep the core meaning and key information\n\
         3. Remove filler words, repetition and non-essential modifiers\n\
         4. Do not add explanations or new content\n\
         \n\
         ## Subtitle\n\
         {}\n\
         \n\
         ## Output in only JSON format\n\
         {{\"analysis\": \"brief analysis of what can be removed\", \"result\": \"the shortened subtitle\"}}",
        request.duration, request.text
    )
}

/// Extract a JSON object from a model reply that may wrap it in markdown
/// code fences or surrounding prose.
pub fn parse_json_object(raw: &str) -> Result<Value> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(SublingoError::MalformedResponse("Empty response".to_string()));
    }

    let cleaned = remove_markdown_code_blocks(text);
    let mut candidates = vec![text.to_string()];
    if cleaned != text {
        candidates.push(cleaned.clone());
    }
    for source in [text, cleaned.as_str()] {
        if let (Some(start), Some(end)) = (source.find('{'), source.rfind('}')) {
            if start < end {
                candidates.push(source[start..=end].to_string());
            }
        }
    }

    for candidate in &candidates {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            if value.is_object() {
                return Ok(value);
            }
            debug!("Parsed JSON is not an object: {}", candidate);
        }
    }

    Err(SublingoError::MalformedResponse(format!(
        "Expected a JSON object, got: {}",
        text.chars().take(200).collect::<String>()
    )))
}

/// The trimmed, non-blank `result` string of a rewrite reply
pub fn result_text(value: &Value) -> Result<&str> {
    let result = value
        .get("result")
        .and_then(Value::as_str)
        .ok_or_else(|| SublingoError::MalformedResponse("Missing string field 'result'".to_string()))?
        .trim();

    if result.is_empty() {
        return Err(SublingoError::MalformedResponse("Empty 'result' field".to_string()));
    }
    Ok(result)
}

/// Accept a parsed reply only when it carries a usable `result`, so that
/// incomplete replies are retried like failed requests.
pub fn require_result(value: Value) -> Result<Value> {
    result_text(&value)?;
    Ok(value)
}

/// Remove markdown code blocks from text
fn remove_markdown_code_blocks(text: &str) -> String {
    let text = text.trim();

    if let Some(inner) = text.strip_prefix("```json").and_then(|t| t.strip_suffix("```")) {
        return inner.trim().to_string();
    }

    if let Some(inner) = text.strip_prefix("```").and_then(|t| t.strip_suffix("```")) {
        return inner.trim().to_string();
    }

    text.to_string()
}
