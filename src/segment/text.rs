use once_cell::sync::Lazy;
use regex::Regex;

static WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Marks that close a sentence.
pub const TERMINAL_MARKS: [char; 8] = ['.', '!', '?', '。', '！', '？', '．', '｡'];

/// Marks that never stand as a sentence of their own.
pub const SECONDARY_MARKS: [&str; 11] = [",", ".", "，", "。", "？", "！", ";", "；", ":", "．", "｡"];

/// Marks at which an over-long sentence may be cut.
pub const COMMA_MARKS: [char; 2] = [',', '，'];

pub fn is_terminal_mark(c: char) -> bool {
    TERMINAL_MARKS.contains(&c)
}

pub fn is_secondary_mark(text: &str) -> bool {
    SECONDARY_MARKS.contains(&text)
}

/// Approximate word count: runs of word characters.
pub fn word_count(text: &str) -> usize {
    WORD_REGEX.find_iter(text).count()
}

/// Strip the quote and whitespace noise ASR leaves around a token. Inner
/// whitespace runs, line breaks included, collapse to a single space.
pub fn clean_token(token: &str) -> String {
    token
        .trim()
        .trim_matches('"')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Byte offsets at which each word-character run starts
pub fn word_starts(text: &str) -> Vec<usize> {
    WORD_REGEX.find_iter(text).map(|m| m.start()).collect()
}

/// Trim every sentence and drop the ones left empty.
pub fn drop_empty(sentences: Vec<String>) -> Vec<String> {
    sentences
        .into_iter()
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else if trimmed.len() == s.len() {
                Some(s)
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("Hello, world!"), 2);
        assert_eq!(word_count("don't stop"), 3);
        assert_eq!(word_count("   "), 0);
        // a CJK run without separators is one word
        assert_eq!(word_count("你好世界"), 1);
    }

    #[test]
    fn test_clean_token() {
        assert_eq!(clean_token("  \"hello\" "), "hello");
        assert_eq!(clean_token("\"\""), "");
        assert_eq!(clean_token("world"), "world");
        assert_eq!(clean_token("two\nlines\r\n  here"), "two lines here");
    }

    #[test]
    fn test_fullwidth_full_stops_are_terminal() {
        assert!(is_terminal_mark('．'));
        assert!(is_terminal_mark('｡'));
        assert!(is_secondary_mark("．"));
    }

    #[test]
    fn test_word_starts() {
        assert_eq!(word_starts("ab-cd ef"), vec![0, 3, 6]);
        assert!(word_starts(" - ").is_empty());
    }

    #[test]
    fn test_drop_empty() {
        let input = vec![" a ".to_string(), "".to_string(), "  ".to_string(), "b".to_string()];
        assert_eq!(drop_empty(input), vec!["a", "b"]);
    }
}
