// Rule-based sentence segmentation
//
// The transcript goes through four stages, each a pure `Vec<String> -> Vec<String>`:
// - Mark: join tokens and split at sentence-ending punctuation
// - Comma: break long sentences at commas
// - Connector: pass-through, connector splitting happens downstream
// - Long: hard split of anything still over the length budget
//
// Stage outputs can be persisted through a `StageCheckpoint` so a crashed run
// resumes after the last completed stage.

pub mod checkpoint;
pub mod comma;
pub mod connector;
pub mod long;
pub mod mark;
pub mod text;

use std::fmt;
use tracing::{info, warn};

pub use checkpoint::{FileCheckpoint, NoCheckpoint, StageCheckpoint};
pub use comma::split_by_comma;
pub use connector::split_by_connector;
pub use long::{split_long_sentences, LengthLimit};
pub use mark::split_by_mark;
pub use text::word_count;

use crate::config::SegmentConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Mark,
    Comma,
    Connector,
    Long,
}

impl Stage {
    /// Stages in execution order
    pub const ALL: [Stage; 4] = [Stage::Mark, Stage::Comma, Stage::Connector, Stage::Long];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Mark => "mark",
            Stage::Comma => "comma",
            Stage::Connector => "connector",
            Stage::Long => "long",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Stage::Mark => "split_by_mark.txt",
            Stage::Comma => "split_by_comma.txt",
            Stage::Connector => "split_by_connector.txt",
            Stage::Long => "split_by_nlp.txt",
        }
    }

    fn index(&self) -> usize {
        match self {
            Stage::Mark => 0,
            Stage::Comma => 1,
            Stage::Connector => 2,
            Stage::Long => 3,
        }
    }

    fn previous(&self) -> Option<Stage> {
        self.index().checked_sub(1).map(|i| Stage::ALL[i])
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Splits one transcript into subtitle-sized sentences.
///
/// A segmenter is bound to one language (its joiner is resolved up front, so
/// an unsupported code fails at construction) and carries its own config
/// snapshot; independent documents can be segmented in parallel with
/// separate instances.
pub struct Segmenter {
    language: String,
    joiner: &'static str,
    config: SegmentConfig,
    checkpoint: Box<dyn StageCheckpoint>,
}

impl Segmenter {
    pub fn new(config: &SegmentConfig, language: &str) -> Result<Self> {
        let joiner = config.joiner(language)?;
        info!("Using {} language joiner: '{}'", language, joiner);

        Ok(Self {
            language: language.to_string(),
            joiner,
            config: config.clone(),
            checkpoint: Box::new(NoCheckpoint),
        })
    }

    pub fn with_checkpoint(mut self, checkpoint: Box<dyn StageCheckpoint>) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn joiner(&self) -> &'static str {
        self.joiner
    }

    pub fn length_limit(&self) -> LengthLimit {
        if self.config.is_cjk(&self.language) {
            LengthLimit::Chars(self.config.max_cjk_chars)
        } else {
            LengthLimit::Words(self.config.max_words)
        }
    }

    /// Run a single stage. For `Stage::Mark` the input is the raw token stream.
    pub fn apply_stage(&self, stage: Stage, input: Vec<String>) -> Vec<String> {
        let output = match stage {
            Stage::Mark => split_by_mark(&input, self.joiner),
            Stage::Comma => split_by_comma(
                input,
                self.config.comma_split_min_words,
                self.config.comma_chunk_max_words,
            ),
            Stage::Connector => split_by_connector(input),
            Stage::Long => split_long_sentences(input, self.length_limit()),
        };
        text::drop_empty(output)
    }

    /// Segment a token stream, resuming from a checkpoint when one exists.
    pub fn run(&self, tokens: &[String]) -> Vec<String> {
        let (mut sentences, start) = match self.resume_point() {
            Some((Stage::Long, sentences)) => {
                info!("Segmentation already complete, loaded {} sentences", sentences.len());
                return sentences;
            }
            Some((stage, sentences)) => {
                info!("Resuming segmentation after {} stage ({} sentences)", stage, sentences.len());
                (sentences, stage.index() + 1)
            }
            None => (tokens.to_vec(), 0),
        };

        for stage in Stage::ALL.into_iter().skip(start) {
            let before = sentences.len();
            sentences = self.apply_stage(stage, sentences);
            info!("Split by {}: {} -> {} sentences", stage, before, sentences.len());
            self.persist(stage, &sentences);
        }

        sentences
    }

    fn resume_point(&self) -> Option<(Stage, Vec<String>)> {
        for stage in Stage::ALL.iter().rev() {
            match self.checkpoint.load(*stage) {
                Ok(Some(sentences)) => return Some((*stage, sentences)),
                Ok(None) => {}
                Err(e) => warn!("Failed to load {} checkpoint: {}", stage, e),
            }
        }
        None
    }

    fn persist(&self, stage: Stage, sentences: &[String]) {
        if let Err(e) = self.checkpoint.save(stage, sentences) {
            warn!("Failed to save {} checkpoint: {}", stage, e);
            return;
        }
        if let Some(previous) = stage.previous() {
            if let Err(e) = self.checkpoint.discard(previous) {
                warn!("Failed to discard {} checkpoint: {}", previous, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::SublingoError;
    use tempfile::tempdir;

    fn tokens(text: &str) -> Vec<String> {
        text.split_whitespace().map(|w| w.to_string()).collect()
    }

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_unsupported_language_rejected() {
        let config = Config::default();
        assert!(matches!(
            Segmenter::new(&config.segment, "xx"),
            Err(SublingoError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_length_limit_by_language() {
        let config = Config::default();
        let en = Segmenter::new(&config.segment, "en").unwrap();
        let zh = Segmenter::new(&config.segment, "zh").unwrap();
        assert_eq!(en.length_limit(), LengthLimit::Words(60));
        assert_eq!(zh.length_limit(), LengthLimit::Chars(80));
    }

    #[test]
    fn test_run_simple_transcript() {
        let config = Config::default();
        let segmenter = Segmenter::new(&config.segment, "en").unwrap();
        let result = segmenter.run(&tokens("Hello world. Wait!"));
        assert_eq!(result, vec!["Hello world.", "Wait!"]);
    }

    #[test]
    fn test_run_ninety_word_sentence() {
        let config = Config::default();
        let segmenter = Segmenter::new(&config.segment, "en").unwrap();
        let sentence = format!("{}.", numbered_words(90));

        let result = segmenter.run(&tokens(&sentence));

        assert!(result.len() >= 2);
        assert!(result.iter().all(|s| word_count(s) <= 60));
        assert_eq!(result.join(" "), sentence);
    }

    #[test]
    fn test_run_preserves_token_order() {
        let config = Config::default();
        let segmenter = Segmenter::new(&config.segment, "en").unwrap();
        let input = format!(
            "Short one. {}, {}, {}. Another short one! {}",
            numbered_words(20),
            numbered_words(20),
            numbered_words(20),
            numbered_words(70)
        );

        let result = segmenter.run(&tokens(&input));

        let squash = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(squash(&result.concat()), squash(&input));
        assert!(result.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn test_run_cjk_transcript() {
        let config = Config::default();
        let segmenter = Segmenter::new(&config.segment, "zh").unwrap();
        let long = "长".repeat(100);
        let input = vec!["你好".to_string(), "世界。".to_string(), long.clone()];

        let result = segmenter.run(&input);

        assert_eq!(result[0], "你好世界。");
        assert!(result[1..].iter().all(|s| s.chars().count() <= 80));
        assert_eq!(result[1..].concat(), long);
    }

    #[test]
    fn test_run_long_unpunctuated_cjk_run() {
        let config = Config::default();
        let segmenter = Segmenter::new(&config.segment, "zh").unwrap();
        let long = "中".repeat(2000);

        let result = segmenter.run(&[long.clone()]);

        assert!(result.iter().all(|s| s.chars().count() <= 80));
        assert_eq!(result.concat(), long);
    }

    #[test]
    fn test_line_breaks_survive_checkpoint_round_trip() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let checkpoint = FileCheckpoint::new(dir.path()).unwrap();
        let segmenter = Segmenter::new(&config.segment, "en")
            .unwrap()
            .with_checkpoint(Box::new(checkpoint.clone()));

        let input = vec!["First\nline".to_string(), "ends.".to_string(), "Second.".to_string()];
        let result = segmenter.run(&input);

        assert_eq!(result, vec!["First line ends.", "Second."]);
        assert_eq!(checkpoint.load(Stage::Long).unwrap(), Some(result));
    }

    #[test]
    fn test_run_persists_only_final_stage() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let checkpoint = FileCheckpoint::new(dir.path()).unwrap();
        let segmenter = Segmenter::new(&config.segment, "en")
            .unwrap()
            .with_checkpoint(Box::new(checkpoint.clone()));

        let result = segmenter.run(&tokens("One. Two."));

        assert_eq!(checkpoint.load(Stage::Long).unwrap(), Some(result));
        for stage in [Stage::Mark, Stage::Comma, Stage::Connector] {
            assert!(!checkpoint.path_for(stage).exists());
        }
    }

    #[test]
    fn test_run_resumes_from_checkpoint() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let checkpoint = FileCheckpoint::new(dir.path()).unwrap();
        checkpoint
            .save(Stage::Comma, &["Recovered sentence.".to_string()])
            .unwrap();

        let segmenter = Segmenter::new(&config.segment, "en")
            .unwrap()
            .with_checkpoint(Box::new(checkpoint.clone()));

        // the token stream is ignored once a stage has been recovered
        let result = segmenter.run(&tokens("Completely different input."));
        assert_eq!(result, vec!["Recovered sentence."]);
    }

    #[test]
    fn test_run_returns_completed_output() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let checkpoint = FileCheckpoint::new(dir.path()).unwrap();
        checkpoint
            .save(Stage::Long, &["Done already.".to_string()])
            .unwrap();

        let segmenter = Segmenter::new(&config.segment, "en")
            .unwrap()
            .with_checkpoint(Box::new(checkpoint));

        assert_eq!(segmenter.run(&tokens("Ignored.")), vec!["Done already."]);
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let mut config = Config::default();
        config.segment.max_words = 10;
        let segmenter = Segmenter::new(&config.segment, "en").unwrap();

        let result = segmenter.run(&tokens(&numbered_words(25)));
        assert!(result.len() > 1);
        assert!(result.iter().all(|s| word_count(s) <= 10));
    }

    #[test]
    fn test_empty_transcript() {
        let config = Config::default();
        let segmenter = Segmenter::new(&config.segment, "en").unwrap();
        assert!(segmenter.run(&[]).is_empty());
    }
}
