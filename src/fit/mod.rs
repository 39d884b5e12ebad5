// Duration fitting
//
// A subtitle line whose estimated speaking time, at the fastest acceptable
// speed, exceeds its time window is shortened by a rewriter. Any rewrite
// failure degrades to deterministic punctuation stripping, so fitting a
// line never fails.

pub mod estimate;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use estimate::{DurationEstimator, SyllableEstimator};
use crate::config::{Config, SpeedFactorConfig};
use crate::error::{Result, SublingoError};
use crate::rewrite::{result_text, Rewriter, RewriterFactory, TrimRequest};
use crate::subtitle::SubtitleLine;

const STRIPPED_MARKS: [char; 12] = [',', '.', '!', '?', ';', ':', '，', '。', '！', '？', '；', '：'];

/// How a line was handled by the fitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FitOutcome {
    /// Estimated duration already fits; text returned as is
    Unchanged,
    /// Rewriter produced a shorter line
    Rewritten,
    /// Rewrite failed; punctuation was replaced with spaces
    Stripped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub text: String,
    pub outcome: FitOutcome,
    /// Estimated duration of the input at maximum speed, in seconds
    pub estimated: f64,
}

/// Shortens subtitle lines that cannot be read within their time window.
#[derive(Clone)]
pub struct DurationFitter {
    estimator: Arc<dyn DurationEstimator>,
    rewriter: Arc<dyn Rewriter>,
    speed_factor: SpeedFactorConfig,
    rewrite_timeout: Duration,
}

impl DurationFitter {
    pub fn new(
        estimator: Arc<dyn DurationEstimator>,
        rewriter: Arc<dyn Rewriter>,
        speed_factor: SpeedFactorConfig,
    ) -> Self {
        Self {
            estimator,
            rewriter,
            speed_factor,
            rewrite_timeout: Duration::from_secs(crate::config::FitConfig::default().rewrite_timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.rewrite_timeout = timeout;
        self
    }

    /// Build a fitter with the syllable estimator and the configured rewrite backend
    pub fn from_config(config: &Config) -> Result<Self> {
        config.speed_factor.validate()?;
        let estimator = Arc::new(SyllableEstimator::from_config(&config.fit));
        let rewriter = RewriterFactory::create_rewriter(config.rewrite.clone())?;

        Ok(Self::new(estimator, rewriter, config.speed_factor)
            .with_timeout(Duration::from_secs(config.fit.rewrite_timeout_secs)))
    }

    pub fn speed_factor(&self) -> SpeedFactorConfig {
        self.speed_factor
    }

    /// Speaking time of `text` at the maximum speed factor
    pub fn estimated_duration(&self, text: &str) -> f64 {
        self.estimator.estimate(text) / self.speed_factor.max
    }

    /// Return `text` shortened so it fits in `duration` seconds.
    pub async fn fit(&self, text: &str, duration: f64) -> String {
        self.fit_with_outcome(text, duration).await.text
    }

    pub async fn fit_with_outcome(&self, text: &str, duration: f64) -> FitResult {
        let estimated = self.estimated_duration(text);
        if estimated <= duration {
            return FitResult {
                text: text.to_string(),
                outcome: FitOutcome::Unchanged,
                estimated,
            };
        }

        info!(
            "Line too long ({:.2}s > {:.2}s), shortening: {}",
            estimated, duration, text
        );

        match self.rewrite(text, duration).await {
            Ok(shortened) => {
                debug!("Shortened: {} -> {}", text, shortened);
                FitResult {
                    text: shortened,
                    outcome: FitOutcome::Rewritten,
                    estimated,
                }
            }
            Err(e) => {
                warn!("Rewrite failed ({}), stripping punctuation instead", e);
                FitResult {
                    text: strip_punctuation(text),
                    outcome: FitOutcome::Stripped,
                    estimated,
                }
            }
        }
    }

    /// Fit a subtitle line in place; only its text changes.
    pub async fn fit_line(&self, line: &mut SubtitleLine) -> FitOutcome {
        let result = self.fit_with_outcome(&line.text, line.duration()).await;
        line.text = result.text;
        result.outcome
    }

    async fn rewrite(&self, text: &str, duration: f64) -> Result<String> {
        let request = TrimRequest {
            text: text.to_string(),
            duration,
        };

        let response = tokio::time::timeout(self.rewrite_timeout, self.rewriter.shorten(&request))
            .await
            .map_err(|_| SublingoError::Timeout(self.rewrite_timeout.as_secs()))??;

        extract_result(&response)
    }
}

fn extract_result(response: &Value) -> Result<String> {
    result_text(response).map(str::to_string)
}

/// Replace sentence and clause punctuation with spaces and trim the ends.
pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| if STRIPPED_MARKS.contains(&c) { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}
