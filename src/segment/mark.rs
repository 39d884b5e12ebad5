use super::text::{clean_token, is_secondary_mark, is_terminal_mark};

/// Join the token stream and split it at sentence-ending punctuation.
///
/// The closing mark stays attached to its sentence. A run of marks with no
/// content in between (`"Wait!!"`, `"Hmm..."`) is re-attached to the sentence
/// before it, and a leftover sentence made of a single clause mark is merged
/// into its predecessor. Punctuation with nothing before it is dropped.
pub fn split_by_mark(tokens: &[String], joiner: &str) -> Vec<String> {
    let text = tokens
        .iter()
        .map(|t| clean_token(t))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(joiner);

    let mut sentences: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if !is_terminal_mark(ch) {
            current.push(ch);
            continue;
        }

        let content = current.trim();
        if !content.is_empty() {
            let mut sentence = content.to_string();
            sentence.push(ch);
            sentences.push(sentence);
        } else if let Some(last) = sentences.last_mut() {
            last.push(ch);
        }
        current.clear();
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    merge_standalone_marks(sentences)
}

fn merge_standalone_marks(sentences: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(sentences.len());

    for sentence in sentences {
        let stripped = sentence.trim();
        if is_secondary_mark(stripped) {
            if let Some(last) = merged.last_mut() {
                last.push_str(stripped);
            }
        } else {
            merged.push(sentence);
        }
    }

    merged
}
