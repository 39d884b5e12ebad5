use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::{Result, SublingoError};

/// One ASR fragment. Timestamps are kept for the alignment step that runs
/// after segmentation; the segmenter itself only reads `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub text: String,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    /// Language detected by ASR, when the source reports one
    pub language: Option<String>,
    pub chunks: Vec<TranscriptChunk>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Chunks(Vec<TranscriptChunk>),
    Document {
        #[serde(default)]
        language: Option<String>,
        segments: Vec<TranscriptChunk>,
    },
}

impl Transcript {
    /// Load a transcript: `.json` files hold ASR output, anything else is
    /// read as one token per line.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SublingoError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path).await?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let transcript = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_lines(&content)
        };

        info!(
            "Loaded {} transcript chunks from {}",
            transcript.chunks.len(),
            path.display()
        );
        Ok(transcript)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let transcript = match serde_json::from_str::<TranscriptFile>(content)? {
            TranscriptFile::Chunks(chunks) => Self { language: None, chunks },
            TranscriptFile::Document { language, segments } => Self {
                language: language.filter(|l| !l.trim().is_empty()),
                chunks: segments,
            },
        };
        Ok(transcript)
    }

    pub fn from_lines(content: &str) -> Self {
        let chunks = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| TranscriptChunk {
                text: line.to_string(),
                start: None,
                end: None,
            })
            .collect();

        Self { language: None, chunks }
    }

    /// Raw token stream in transcript order
    pub fn tokens(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.text.clone()).collect()
    }
}
