// Subtitle rewrite backends
//
// A rewriter asks a language model to shorten a subtitle line so it fits its
// time window. Implementations are created through a factory:
// - Ollama: `/api/generate` with JSON output
// - ChatCompletion: OpenAI-compatible `/v1/chat/completions`

pub mod chat;
pub mod common;
pub mod ollama;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use common::*;
use crate::config::{RewriteBackend, RewriteConfig};
use crate::error::Result;

/// A request to shorten `text` so it can be read within `duration` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimRequest {
    pub text: String,
    pub duration: f64,
}

/// Text-shortening capability.
///
/// Returns the model's structured answer as a JSON object; a usable answer
/// carries the shortened line in its `result` field.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn shorten(&self, request: &TrimRequest) -> Result<serde_json::Value>;
}

/// Factory for creating rewriter instances
pub struct RewriterFactory;

impl RewriterFactory {
    /// Create a rewriter for the configured backend
    pub fn create_rewriter(config: RewriteConfig) -> Result<Arc<dyn Rewriter>> {
        let rewriter: Arc<dyn Rewriter> = match config.backend {
            RewriteBackend::Ollama => Arc::new(ollama::OllamaRewriter::new(config)?),
            RewriteBackend::ChatCompletion => Arc::new(chat::ChatCompletionRewriter::new(config)?),
        };
        Ok(rewriter)
    }
}
