use super::text::{word_count, COMMA_MARKS};

/// Split long sentences at commas, greedily packing comma-delimited parts
/// into chunks of at most `chunk_max_words` words.
///
/// Sentences under `min_words` words, and sentences without an internal
/// comma, pass through untouched.
pub fn split_by_comma(sentences: Vec<String>, min_words: usize, chunk_max_words: usize) -> Vec<String> {
    let mut result = Vec::with_capacity(sentences.len());

    for sentence in sentences {
        if word_count(&sentence) < min_words {
            result.push(sentence);
            continue;
        }
        result.extend(split_sentence(&sentence, chunk_max_words));
    }

    result
}

fn split_sentence(sentence: &str, chunk_max_words: usize) -> Vec<String> {
    let parts: Vec<&str> = sentence.split_inclusive(&COMMA_MARKS[..]).collect();
    if parts.len() <= 1 {
        return vec![sentence.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for part in parts {
        let candidate = format!("{}{}", current, part);
        if word_count(&candidate) > chunk_max_words && !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
            current = part.to_string();
        } else {
            current = candidate;
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}
