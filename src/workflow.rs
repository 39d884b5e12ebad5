use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, SublingoError};
use crate::fit::{DurationFitter, FitOutcome};
use crate::segment::{FileCheckpoint, Segmenter, StageCheckpoint};
use crate::subtitle::{generate_srt, load_srt, SubtitleLine};
use crate::transcript::Transcript;

const TRANSCRIPT_EXTENSIONS: [&str; 2] = ["json", "txt"];
const SENTENCES_SUFFIX: &str = "_sentences.txt";

/// Per-outcome line counts of a fitting run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FitSummary {
    pub unchanged: usize,
    pub rewritten: usize,
    pub stripped: usize,
}

impl FitSummary {
    fn record(&mut self, outcome: FitOutcome) {
        match outcome {
            FitOutcome::Unchanged => self.unchanged += 1,
            FitOutcome::Rewritten => self.rewritten += 1,
            FitOutcome::Stripped => self.stripped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.unchanged + self.rewritten + self.stripped
    }
}

pub struct Workflow {
    config: Config,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fitter with the configured estimator and rewrite backend
    pub fn fitter(&self) -> Result<DurationFitter> {
        DurationFitter::from_config(&self.config)
    }

    /// Pick the segmentation language: explicit argument, then config, then
    /// whatever the transcript reports. "auto" defers to the next source.
    pub fn resolve_language(&self, requested: Option<&str>, transcript: &Transcript) -> Result<String> {
        let explicit = requested
            .into_iter()
            .chain(std::iter::once(self.config.segment.language.as_str()))
            .map(str::trim)
            .find(|lang| !lang.is_empty() && !lang.eq_ignore_ascii_case("auto"));

        if let Some(lang) = explicit {
            return Ok(lang.to_lowercase());
        }

        transcript
            .language
            .as_deref()
            .map(|lang| lang.trim().to_lowercase())
            .ok_or_else(|| {
                SublingoError::Config(
                    "Cannot determine transcript language; pass --language or set segment.language"
                        .to_string(),
                )
            })
    }

    /// Segment one transcript into a newline-delimited sentence file
    pub async fn segment_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
        language: Option<&str>,
    ) -> Result<()> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();
        info!("Segmenting transcript: {}", input_path.display());

        if output_path.exists() {
            warn!("Output already exists, skipping: {}", output_path.display());
            return Ok(());
        }

        let transcript = Transcript::load(input_path).await?;
        let language = self.resolve_language(language, &transcript)?;

        let checkpoint = FileCheckpoint::new(self.checkpoint_dir_for(input_path))?;

        let segmenter = Segmenter::new(&self.config.segment, &language)?
            .with_checkpoint(Box::new(checkpoint.clone()));
        let sentences = segmenter.run(&transcript.tokens());

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut content = sentences.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(output_path, content).await?;

        if let Err(e) = checkpoint.clear() {
            warn!("Failed to clear checkpoints in {}: {}", checkpoint.dir().display(), e);
        }

        info!(
            "Wrote {} sentences to {}",
            sentences.len(),
            output_path.display()
        );
        Ok(())
    }

    /// Checkpoint directory for one transcript: its absolute path mirrored
    /// under `segment.checkpoint_dir`.
    pub fn checkpoint_dir_for(&self, input_path: &Path) -> PathBuf {
        let absolute = std::fs::canonicalize(input_path).unwrap_or_else(|_| input_path.to_path_buf());
        let mut dir = self.config.segment.checkpoint_dir.clone();
        for component in absolute.components() {
            if let Component::Normal(part) = component {
                dir.push(part);
            }
        }
        dir
    }

    /// Segment every transcript under a directory
    pub async fn segment_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_dir: P,
        output_dir: Option<Q>,
        language: Option<&str>,
    ) -> Result<()> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(SublingoError::Config("Input path is not a directory".to_string()));
        }

        let output_dir = match output_dir {
            Some(dir) => dir.as_ref().to_path_buf(),
            None => input_dir.to_path_buf(),
        };
        fs::create_dir_all(&output_dir).await?;

        let transcripts = find_transcripts(input_dir);
        info!("Found {} transcripts to segment", transcripts.len());

        for transcript_path in transcripts {
            let output_path = sentences_path(&transcript_path, input_dir, &output_dir);
            match self.segment_file(&transcript_path, &output_path, language).await {
                Ok(_) => info!("Successfully segmented: {}", transcript_path.display()),
                Err(e) => warn!("Failed to segment {}: {}", transcript_path.display(), e),
            }
        }

        Ok(())
    }

    /// Fit every line of an SRT file to its time window
    pub async fn fit_subtitles<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        fitter: &DurationFitter,
        input_path: P,
        output_path: Q,
    ) -> Result<FitSummary> {
        let input_path = input_path.as_ref();
        info!("Fitting subtitles: {}", input_path.display());

        let lines = load_srt(input_path).await?;

        let pb = ProgressBar::new(lines.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let (fitted, summary) =
            fit_lines(fitter, lines, self.config.fit.max_workers, Some(pb.clone())).await;
        pb.finish_and_clear();

        generate_srt(&fitted, output_path).await?;

        info!(
            "Fitted {} lines: {} unchanged, {} rewritten, {} stripped",
            summary.total(),
            summary.unchanged,
            summary.rewritten,
            summary.stripped
        );
        Ok(summary)
    }
}

/// Fit lines concurrently, at most `max_workers` at a time. Output order
/// matches input order; a line whose task panicked is kept as is.
pub async fn fit_lines(
    fitter: &DurationFitter,
    lines: Vec<SubtitleLine>,
    max_workers: usize,
    progress: Option<ProgressBar>,
) -> (Vec<SubtitleLine>, FitSummary) {
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut tasks = JoinSet::new();

    for (index, line) in lines.iter().cloned().enumerate() {
        let fitter = fitter.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let mut line = line;
            let outcome = fitter.fit_line(&mut line).await;
            (index, line, outcome)
        });
    }

    let mut fitted: Vec<Option<SubtitleLine>> = vec![None; lines.len()];
    let mut summary = FitSummary::default();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, line, outcome)) => {
                summary.record(outcome);
                fitted[index] = Some(line);
            }
            Err(e) => warn!("Fit task failed: {}", e),
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    let lines = fitted
        .into_iter()
        .zip(lines)
        .map(|(fitted, original)| fitted.unwrap_or(original))
        .collect();

    (lines, summary)
}

fn find_transcripts(input_dir: &Path) -> Vec<PathBuf> {
    let mut transcripts = Vec::new();

    for entry in WalkDir::new(input_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_output = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(SENTENCES_SUFFIX));
        let is_transcript = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TRANSCRIPT_EXTENSIONS.contains(&ext.to_lowercase().as_str()));

        if is_transcript && !is_output {
            transcripts.push(path.to_path_buf());
        }
    }

    transcripts.sort();
    transcripts
}

/// `<output_dir>/<relative dir>/<stem>_<ext>_sentences.txt`, mirroring the
/// transcript's place under `input_dir`.
pub fn sentences_path(transcript_path: &Path, input_dir: &Path, output_dir: &Path) -> PathBuf {
    let relative_dir = transcript_path
        .strip_prefix(input_dir)
        .ok()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new(""));
    let stem = transcript_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("transcript");
    let name = match transcript_path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}_{}{}", stem, ext.to_lowercase(), SENTENCES_SUFFIX),
        None => format!("{}{}", stem, SENTENCES_SUFFIX),
    };
    output_dir.join(relative_dir).join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeedFactorConfig;
    use crate::fit::estimate::MockDurationEstimator;
    use crate::rewrite::MockRewriter;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use serde_json::json;

    fn workflow(temp: &TempDir) -> Workflow {
        let mut config = Config::default();
        config.segment.checkpoint_dir = temp.path().join("checkpoints");
        Workflow::new(config).unwrap()
    }

    fn transcript(language: Option<&str>) -> Transcript {
        Transcript {
            language: language.map(str::to_string),
            chunks: Vec::new(),
        }
    }

    /// Estimates by character count so tests control which lines are long
    fn length_fitter(rewriter: MockRewriter) -> DurationFitter {
        let mut estimator = MockDurationEstimator::new();
        estimator
            .expect_estimate()
            .returning(|text| text.chars().count() as f64 * 0.1);
        DurationFitter::new(Arc::new(estimator), Arc::new(rewriter), SpeedFactorConfig::default())
    }

    #[test]
    fn test_resolve_language_precedence() {
        let temp = TempDir::new().unwrap();
        let wf = workflow(&temp);

        assert_eq!(wf.resolve_language(Some("ZH"), &transcript(Some("en"))).unwrap(), "zh");
        assert_eq!(wf.resolve_language(Some("auto"), &transcript(Some("ja"))).unwrap(), "ja");
        assert_eq!(wf.resolve_language(None, &transcript(Some("en"))).unwrap(), "en");
        assert!(matches!(
            wf.resolve_language(None, &transcript(None)),
            Err(SublingoError::Config(_))
        ));
    }

    #[test]
    fn test_config_language_used_before_transcript() {
        let mut config = Config::default();
        config.segment.language = "fr".to_string();
        let wf = Workflow::new(config).unwrap();

        assert_eq!(wf.resolve_language(None, &transcript(Some("en"))).unwrap(), "fr");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.fit.max_workers = 0;
        assert!(Workflow::new(config).is_err());
    }

    #[tokio::test]
    async fn test_segment_file_writes_sentences() {
        let temp = TempDir::new().unwrap();
        let input = temp.child("talk.json");
        input
            .write_str(r#"{"language": "en", "segments": [{"text": "Hello"}, {"text": "world."}, {"text": "Bye!"}]}"#)
            .unwrap();
        let output = temp.child("out/talk.txt");

        let wf = workflow(&temp);
        wf.segment_file(input.path(), output.path(), None).await.unwrap();

        output.assert("Hello world.\nBye!\n");
        // checkpoints are removed once the output exists
        let checkpoint_dir = wf.checkpoint_dir_for(input.path());
        assert!(checkpoint_dir.starts_with(temp.path().join("checkpoints")));
        assert!(!checkpoint_dir.join("split_by_long.txt").exists());
    }

    #[tokio::test]
    async fn test_existing_output_is_not_recomputed() {
        let temp = TempDir::new().unwrap();
        let input = temp.child("talk.txt");
        input.write_str("New.\n").unwrap();
        let output = temp.child("talk_sentences.txt");
        output.write_str("Old.\n").unwrap();

        let wf = workflow(&temp);
        wf.segment_file(input.path(), output.path(), Some("en")).await.unwrap();

        output.assert("Old.\n");
    }

    #[tokio::test]
    async fn test_segment_directory() {
        let temp = TempDir::new().unwrap();
        temp.child("in/a.txt").write_str("One.\nTwo.\n").unwrap();
        temp.child("in/nested/b.json")
            .write_str(r#"[{"text": "你好。"}, {"text": "再见。"}]"#)
            .unwrap();
        temp.child("in/notes.md").write_str("ignored").unwrap();

        let wf = workflow(&temp);
        let out_dir = temp.path().join("out");
        wf.segment_directory(temp.path().join("in"), Some(&out_dir), Some("zh"))
            .await
            .unwrap();

        temp.child("out/a_txt_sentences.txt").assert("One.\nTwo.\n");
        temp.child("out/nested/b_json_sentences.txt").assert("你好。\n再见。\n");
        assert!(!out_dir.join("notes_md_sentences.txt").exists());
    }

    #[tokio::test]
    async fn test_same_stem_transcripts_get_separate_outputs() {
        let temp = TempDir::new().unwrap();
        temp.child("in/talk.json")
            .write_str(r#"{"language": "en", "segments": [{"text": "From json."}]}"#)
            .unwrap();
        temp.child("in/talk.txt").write_str("From txt.\n").unwrap();
        temp.child("in/a/talk.json").write_str(r#"[{"text": "From a."}]"#).unwrap();
        temp.child("in/b/talk.json").write_str(r#"[{"text": "From b."}]"#).unwrap();

        let wf = workflow(&temp);
        wf.segment_directory(temp.path().join("in"), Some(temp.path().join("out")), Some("en"))
            .await
            .unwrap();

        temp.child("out/talk_json_sentences.txt").assert("From json.\n");
        temp.child("out/talk_txt_sentences.txt").assert("From txt.\n");
        temp.child("out/a/talk_json_sentences.txt").assert("From a.\n");
        temp.child("out/b/talk_json_sentences.txt").assert("From b.\n");

        let a = wf.checkpoint_dir_for(&temp.path().join("in/a/talk.json"));
        let b = wf.checkpoint_dir_for(&temp.path().join("in/b/talk.json"));
        let txt = wf.checkpoint_dir_for(&temp.path().join("in/talk.txt"));
        assert_ne!(a, b);
        assert_ne!(a, txt);
    }

    #[test]
    fn test_sentences_path_mirrors_input_tree() {
        let input = Path::new("/data/in");
        let output = Path::new("/data/out");
        assert_eq!(
            sentences_path(Path::new("/data/in/x/talk.JSON"), input, output),
            PathBuf::from("/data/out/x/talk_json_sentences.txt")
        );
        assert_eq!(
            sentences_path(Path::new("/data/in/talk"), input, output),
            PathBuf::from("/data/out/talk_sentences.txt")
        );
    }

    #[test]
    fn test_find_transcripts_skips_outputs() {
        let temp = TempDir::new().unwrap();
        temp.child("a.txt").write_str("x").unwrap();
        temp.child("a_sentences.txt").write_str("x").unwrap();
        temp.child("b.JSON").write_str("[]").unwrap();

        let found = find_transcripts(temp.path());
        assert_eq!(found, vec![temp.path().join("a.txt"), temp.path().join("b.JSON")]);
    }

    #[tokio::test]
    async fn test_fit_lines_preserves_order() {
        let mut rewriter = MockRewriter::new();
        rewriter
            .expect_shorten()
            .returning(|req| Ok(json!({ "result": format!("short {}", req.text.len()) })));
        let fitter = length_fitter(rewriter);

        let lines: Vec<SubtitleLine> = (0..20)
            .map(|i| {
                let text = if i % 2 == 0 { "ok".to_string() } else { "x".repeat(30 + i) };
                SubtitleLine::new(i as f64, i as f64 + 1.0, text)
            })
            .collect();

        let (fitted, summary) = fit_lines(&fitter, lines.clone(), 3, None).await;

        assert_eq!(fitted.len(), 20);
        assert_eq!(summary, FitSummary { unchanged: 10, rewritten: 10, stripped: 0 });
        for (i, (before, after)) in lines.iter().zip(&fitted).enumerate() {
            assert_eq!(before.start, after.start);
            if i % 2 == 0 {
                assert_eq!(after.text, "ok");
            } else {
                assert_eq!(after.text, format!("short {}", 30 + i));
            }
        }
    }

    #[tokio::test]
    async fn test_fit_subtitles_file() {
        let temp = TempDir::new().unwrap();
        let input = temp.child("in.srt");
        input
            .write_str("1\n00:00:00,000 --> 00:00:05,000\nShort.\n\n2\n00:00:05,000 --> 00:00:06,000\nThis line is far too long, honestly.\n")
            .unwrap();
        let output = temp.child("out.srt");

        let mut rewriter = MockRewriter::new();
        rewriter
            .expect_shorten()
            .returning(|_| Err(SublingoError::Rewrite("offline".to_string())));
        let fitter = length_fitter(rewriter);

        let wf = workflow(&temp);
        let summary = wf.fit_subtitles(&fitter, input.path(), output.path()).await.unwrap();

        assert_eq!(summary, FitSummary { unchanged: 1, rewritten: 0, stripped: 1 });
        output.assert(
            "1\n00:00:00,000 --> 00:00:05,000\nShort.\n\n2\n00:00:05,000 --> 00:00:06,000\nThis line is far too long  honestly\n\n",
        );
    }
}
