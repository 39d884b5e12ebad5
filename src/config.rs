use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SublingoError};

// Default values for fields added after the first config format
fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub segment: SegmentConfig,
    pub speed_factor: SpeedFactorConfig,
    pub fit: FitConfig,
    pub rewrite: RewriteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Transcript language, or "auto" to use the language detected by ASR
    pub language: String,
    /// Languages whose words are joined with a single space
    pub language_split_with_space: Vec<String>,
    /// Languages whose words are joined without a separator
    pub language_split_without_space: Vec<String>,
    /// Languages measured by character count in the long-sentence split
    pub cjk_languages: Vec<String>,
    /// Sentences with fewer words than this are never split at commas
    pub comma_split_min_words: usize,
    /// Flush a comma-split chunk once appending would exceed this word count
    pub comma_chunk_max_words: usize,
    /// Hard limit on words per sentence for space-delimited languages
    pub max_words: usize,
    /// Hard limit on characters per sentence for CJK languages
    pub max_cjk_chars: usize,
    /// Scratch directory for per-stage checkpoints
    pub checkpoint_dir: PathBuf,
}

/// Bounds on how much faster than natural pace a line may be performed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedFactorConfig {
    pub min: f64,
    pub accept: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitConfig {
    /// Maximum number of subtitle lines fitted concurrently
    pub max_workers: usize,
    /// Upper bound on a single rewrite request, retries included
    pub rewrite_timeout_secs: u64,
    /// Estimated seconds per spoken syllable
    pub seconds_per_syllable: f64,
    /// Pause added for each clause mark (comma, semicolon, colon)
    pub mid_pause_secs: f64,
    /// Pause added for each sentence-ending mark
    pub end_pause_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RewriteBackend {
    /// Ollama `/api/generate` with JSON format
    Ollama,
    /// OpenAI-compatible `/v1/chat/completions`
    ChatCompletion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Which API the rewriter talks to
    pub backend: RewriteBackend,
    /// Base URL of the rewrite service
    pub endpoint: String,
    /// Model used for shortening subtitles
    pub model: String,
    /// Bearer token for chat completion backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Maximum retries for failed rewrite requests
    pub max_retries: u32,
    /// Base delay between retries, doubled after each attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// HTTP timeout for a single request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment: SegmentConfig {
                language: "auto".to_string(),
                language_split_with_space: ["en", "es", "fr", "de", "it", "ru"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                language_split_without_space: ["zh", "ja"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                cjk_languages: ["zh", "ja", "ko"].iter().map(|s| s.to_string()).collect(),
                comma_split_min_words: 40,
                comma_chunk_max_words: 25,
                max_words: 60,
                max_cjk_chars: 80,
                checkpoint_dir: PathBuf::from(".sublingo/log"),
            },
            speed_factor: SpeedFactorConfig::default(),
            fit: FitConfig::default(),
            rewrite: RewriteConfig {
                backend: RewriteBackend::Ollama,
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2:3b".to_string(),
                api_key: None,
                max_retries: 5,
                retry_delay_ms: default_retry_delay_ms(),
                request_timeout_secs: default_request_timeout_secs(),
            },
        }
    }
}

impl Default for SpeedFactorConfig {
    fn default() -> Self {
        Self {
            min: 1.0,
            accept: 1.2,
            max: 1.4,
        }
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            rewrite_timeout_secs: 120,
            seconds_per_syllable: 0.225,
            mid_pause_secs: 0.15,
            end_pause_secs: 0.3,
        }
    }
}

impl SpeedFactorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min > 0.0 && self.max > 0.0) {
            return Err(SublingoError::Config(
                "Speed factor values must be positive".to_string(),
            ));
        }
        if self.min > self.accept || self.accept > self.max {
            return Err(SublingoError::Config(format!(
                "Speed factor must satisfy min <= accept <= max (got {} / {} / {})",
                self.min, self.accept, self.max
            )));
        }
        Ok(())
    }
}

impl SegmentConfig {
    /// Word joiner for a language code: a space, or nothing for languages
    /// written without word separators.
    pub fn joiner(&self, language: &str) -> Result<&'static str> {
        if self.language_split_with_space.iter().any(|l| l == language) {
            Ok(" ")
        } else if self.language_split_without_space.iter().any(|l| l == language) {
            Ok("")
        } else {
            Err(SublingoError::UnsupportedLanguage(language.to_string()))
        }
    }

    pub fn is_cjk(&self, language: &str) -> bool {
        self.cjk_languages.iter().any(|l| l == language)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(both) = self
            .language_split_with_space
            .iter()
            .find(|l| self.language_split_without_space.contains(l))
        {
            return Err(SublingoError::Config(format!(
                "Language '{}' is listed as both space-joined and no-space-joined",
                both
            )));
        }
        if self.comma_chunk_max_words == 0 || self.comma_split_min_words == 0 {
            return Err(SublingoError::Config(
                "Comma split thresholds must be positive".to_string(),
            ));
        }
        if self.max_words < 2 {
            return Err(SublingoError::Config(
                "max_words must be at least 2".to_string(),
            ));
        }
        if self.max_cjk_chars <= 10 {
            return Err(SublingoError::Config(
                "max_cjk_chars must be greater than 10".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SublingoError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SublingoError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SublingoError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SublingoError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.segment.validate()?;
        self.speed_factor.validate()?;

        if self.fit.max_workers == 0 {
            return Err(SublingoError::Config(
                "fit.max_workers must be at least 1".to_string(),
            ));
        }
        if self.fit.rewrite_timeout_secs == 0 {
            return Err(SublingoError::Config(
                "fit.rewrite_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.fit.seconds_per_syllable <= 0.0 {
            return Err(SublingoError::Config(
                "fit.seconds_per_syllable must be positive".to_string(),
            ));
        }
        if self.rewrite.endpoint.trim().is_empty() {
            return Err(SublingoError::Config(
                "rewrite.endpoint is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_joiner_lookup() {
        let config = Config::default();
        assert_eq!(config.segment.joiner("en").unwrap(), " ");
        assert_eq!(config.segment.joiner("zh").unwrap(), "");
        assert!(matches!(
            config.segment.joiner("xx"),
            Err(SublingoError::UnsupportedLanguage(code)) if code == "xx"
        ));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_speed_factor_ordering() {
        let inverted = SpeedFactorConfig { min: 1.5, accept: 1.2, max: 1.4 };
        assert!(inverted.validate().is_err());

        let negative = SpeedFactorConfig { min: -1.0, accept: 1.0, max: 1.0 };
        assert!(negative.validate().is_err());

        let flat = SpeedFactorConfig { min: 1.0, accept: 1.0, max: 1.0 };
        assert!(flat.validate().is_ok());
    }

    #[test]
    fn test_zero_rewrite_timeout_rejected() {
        let mut config = Config::default();
        config.fit.rewrite_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(SublingoError::Config(msg)) if msg.contains("rewrite_timeout_secs")));

        config.fit.rewrite_timeout_secs = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlapping_language_lists_rejected() {
        let mut config = Config::default();
        config.segment.language_split_without_space.push("en".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.segment.max_words = 42;
        config.rewrite.backend = RewriteBackend::ChatCompletion;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.segment.max_words, 42);
        assert_eq!(loaded.rewrite.backend, RewriteBackend::ChatCompletion);
        assert_eq!(loaded.speed_factor, SpeedFactorConfig::default());
    }

    #[test]
    fn test_invalid_file_fails_validation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.speed_factor.accept = 2.0;
        config.save_to_file(&path).unwrap();

        assert!(matches!(Config::from_file(&path), Err(SublingoError::Config(_))));
    }
}
