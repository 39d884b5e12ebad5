use tracing::debug;

use super::text::{word_count, word_starts};

/// Length budget used by the hard split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthLimit {
    /// Character budget, for languages written without spaces
    Chars(usize),
    /// Word budget, for space-delimited languages
    Words(usize),
}

impl LengthLimit {
    pub fn measure(&self, sentence: &str) -> usize {
        match self {
            LengthLimit::Chars(_) => sentence.chars().count(),
            LengthLimit::Words(_) => word_count(sentence),
        }
    }

    pub fn max(&self) -> usize {
        match self {
            LengthLimit::Chars(max) | LengthLimit::Words(max) => *max,
        }
    }
}

/// Cut every sentence over the limit into near-equal contiguous parts.
pub fn split_long_sentences(sentences: Vec<String>, limit: LengthLimit) -> Vec<String> {
    let mut result = Vec::with_capacity(sentences.len());

    for sentence in sentences {
        if limit.measure(&sentence) <= limit.max() {
            result.push(sentence);
            continue;
        }

        debug!("Splitting long sentence: {}...", preview(&sentence, 30));

        match limit {
            LengthLimit::Chars(max) => {
                let chars: Vec<char> = sentence.chars().collect();
                let parts = even_slices(&chars, max.saturating_sub(10).max(1));
                result.extend(parts.into_iter().map(|p| p.iter().collect::<String>()));
            }
            LengthLimit::Words(max) => {
                let words: Vec<&str> = sentence.split_whitespace().collect();
                let bucket = (max / 2).max(1);
                for part in even_slices(&words, bucket) {
                    let part = part.join(" ");
                    if word_count(&part) <= max {
                        result.push(part);
                    } else {
                        // whitespace tokens holding several word runs ("a-b-c-d")
                        result.extend(split_at_word_runs(&part, bucket));
                    }
                }
            }
        }
    }

    result
}

/// Divide `items` into `ceil(len / bucket)` contiguous slices whose lengths
/// differ by at most one; no slice is longer than `bucket`.
fn even_slices<T>(items: &[T], bucket: usize) -> Vec<&[T]> {
    let count = items.len();
    if count == 0 {
        return Vec::new();
    }

    let num_parts = count.div_ceil(bucket);
    let base_len = count / num_parts;
    let longer = count % num_parts;

    let mut slices = Vec::with_capacity(num_parts);
    let mut start = 0;
    for i in 0..num_parts {
        let len = if i < longer { base_len + 1 } else { base_len };
        slices.push(&items[start..start + len]);
        start += len;
    }
    slices
}

/// Cut `text` at the starts of word runs so each piece holds at most
/// `bucket` runs.
fn split_at_word_runs(text: &str, bucket: usize) -> Vec<String> {
    let starts = word_starts(text);
    let cuts: Vec<usize> = even_slices(&starts, bucket)
        .into_iter()
        .skip(1)
        .map(|slice| slice[0])
        .collect();

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut from = 0;
    for cut in cuts {
        pieces.push(text[from..cut].trim().to_string());
        from = cut;
    }
    pieces.push(text[from..].trim().to_string());
    pieces
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
