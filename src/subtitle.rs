use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{Result, SublingoError};

static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

/// A subtitle line with its externally assigned time window (seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleLine {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SubtitleLine {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Generate SRT subtitle file from subtitle lines
pub async fn generate_srt<P: AsRef<Path>>(lines: &[SubtitleLine], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    fs::write(output_path, to_srt_string(lines)).await?;

    info!("SRT file generated successfully");
    Ok(())
}

pub fn to_srt_string(lines: &[SubtitleLine]) -> String {
    let mut srt_content = String::new();

    for (index, line) in lines.iter().enumerate() {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_time(line.start),
            format_srt_time(line.end),
            line.text.trim()
        ));
    }

    srt_content
}

/// Read an SRT file into subtitle lines
pub async fn load_srt<P: AsRef<Path>>(path: P) -> Result<Vec<SubtitleLine>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SublingoError::FileNotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path).await?;
    parse_srt(&content)
}

/// Parse SRT content. Blocks without a timestamp or text are skipped; a
/// multi-line cue is joined with newlines.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleLine>> {
    let mut lines = Vec::new();
    let mut window: Option<(f64, f64)> = None;
    let mut text = String::new();

    let mut flush = |window: &mut Option<(f64, f64)>, text: &mut String| {
        if let Some((start, end)) = window.take() {
            if text.trim().is_empty() {
                warn!("Skipping empty subtitle at {}", format_srt_time(start));
            } else {
                lines.push(SubtitleLine::new(start, end, text.trim()));
            }
        }
        text.clear();
    };

    for raw in content.lines() {
        let trimmed = raw.trim().trim_start_matches('\u{feff}');

        if trimmed.is_empty() {
            flush(&mut window, &mut text);
            continue;
        }

        if window.is_none() {
            if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                window = Some((capture_seconds(&caps, 1), capture_seconds(&caps, 5)));
            }
            // sequence numbers and stray text before a timestamp are ignored
            continue;
        }

        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(trimmed);
    }
    flush(&mut window, &mut text);

    if lines.is_empty() && !content.trim().is_empty() {
        return Err(SublingoError::Subtitle(
            "No valid subtitle entries were found in the SRT content".to_string(),
        ));
    }

    Ok(lines)
}

fn capture_seconds(caps: &regex::Captures, start_idx: usize) -> f64 {
    let field = |i: usize| -> u64 {
        caps.get(start_idx + i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let millis = (field(0) * 3600 + field(1) * 60 + field(2)) * 1000 + field(3);
    millis as f64 / 1000.0
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
fn format_srt_time(seconds: f64) -> String {
    let total_milliseconds = (seconds * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
