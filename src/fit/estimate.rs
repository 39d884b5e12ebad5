#[cfg(test)]
use mockall::automock;

use crate::config::FitConfig;

const MID_PAUSE_MARKS: [char; 7] = [',', '，', '、', ';', '；', ':', '：'];
const END_PAUSE_MARKS: [char; 8] = ['.', '!', '?', '。', '！', '？', '．', '｡'];
const VOWELS: &str = "aeiouyàáâãäåèéêëìíîïòóôõöùúûüýÿæœ";

/// Estimates how long a line takes to speak, in seconds.
#[cfg_attr(test, automock)]
pub trait DurationEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> f64;
}

/// Syllable-count estimator.
///
/// CJK ideographs, kana and hangul count as one syllable each. Latin words
/// count vowel groups (at least one per word), digits count per digit.
/// Clause punctuation adds a short pause, sentence punctuation a longer one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyllableEstimator {
    pub seconds_per_syllable: f64,
    pub mid_pause_secs: f64,
    pub end_pause_secs: f64,
}

impl Default for SyllableEstimator {
    fn default() -> Self {
        Self::from_config(&FitConfig::default())
    }
}

impl SyllableEstimator {
    pub fn new(seconds_per_syllable: f64, mid_pause_secs: f64, end_pause_secs: f64) -> Self {
        Self {
            seconds_per_syllable,
            mid_pause_secs,
            end_pause_secs,
        }
    }

    pub fn from_config(config: &FitConfig) -> Self {
        Self::new(
            config.seconds_per_syllable,
            config.mid_pause_secs,
            config.end_pause_secs,
        )
    }

    pub fn count_syllables(text: &str) -> usize {
        let mut count = 0;
        let mut word = String::new();

        for c in text.chars() {
            if is_cjk_char(c) {
                count += latin_syllables(&word);
                word.clear();
                count += 1;
            } else if c.is_ascii_digit() {
                count += latin_syllables(&word);
                word.clear();
                count += 1;
            } else if c.is_alphabetic() || c == '\'' {
                word.push(c);
            } else {
                count += latin_syllables(&word);
                word.clear();
            }
        }

        count + latin_syllables(&word)
    }

    fn pauses(text: &str) -> (usize, usize) {
        let trimmed = text.trim();
        let mut mid = 0;
        let mut end = 0;
        let mut last_was_end = false;

        for c in trimmed.chars() {
            if END_PAUSE_MARKS.contains(&c) {
                // "?!" or "..." is one pause
                if !last_was_end {
                    end += 1;
                }
                last_was_end = true;
                continue;
            }
            last_was_end = false;
            if MID_PAUSE_MARKS.contains(&c) {
                mid += 1;
            }
        }

        (mid, end)
    }
}

impl DurationEstimator for SyllableEstimator {
    fn estimate(&self, text: &str) -> f64 {
        let syllables = Self::count_syllables(text);
        let (mid, end) = Self::pauses(text);

        syllables as f64 * self.seconds_per_syllable
            + mid as f64 * self.mid_pause_secs
            + end as f64 * self.end_pause_secs
    }
}

fn is_cjk_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{AC00}'..='\u{D7AF}'
    ) && c != '\u{30FB}' && c != '\u{30FC}'
}

fn latin_syllables(word: &str) -> usize {
    let word = word.trim_matches('\'').to_lowercase();
    if word.is_empty() {
        return 0;
    }

    let mut groups = 0;
    let mut in_vowel = false;
    for c in word.chars() {
        let vowel = VOWELS.contains(c);
        if vowel && !in_vowel {
            groups += 1;
        }
        in_vowel = vowel;
    }

    // silent trailing e ("line", "made") but not "le" endings ("table")
    if groups > 1 && word.ends_with('e') && !word.ends_with("le") && !word.ends_with("ee") {
        groups -= 1;
    }

    groups.max(1)
}
