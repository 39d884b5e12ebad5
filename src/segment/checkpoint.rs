use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use super::Stage;

/// Persistence for stage outputs so an interrupted segmentation can resume
/// from the last completed stage.
pub trait StageCheckpoint: Send + Sync {
    /// Output previously saved for `stage`, if any
    fn load(&self, stage: Stage) -> Result<Option<Vec<String>>>;

    /// Save the complete output of `stage`
    fn save(&self, stage: Stage, sentences: &[String]) -> Result<()>;

    /// Forget the output of `stage`
    fn discard(&self, stage: Stage) -> Result<()>;

    /// Forget every stage
    fn clear(&self) -> Result<()> {
        for stage in Stage::ALL {
            self.discard(stage)?;
        }
        Ok(())
    }
}

/// Keeps nothing; every run starts from the token stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCheckpoint;

impl StageCheckpoint for NoCheckpoint {
    fn load(&self, _stage: Stage) -> Result<Option<Vec<String>>> {
        Ok(None)
    }

    fn save(&self, _stage: Stage, _sentences: &[String]) -> Result<()> {
        Ok(())
    }

    fn discard(&self, _stage: Stage) -> Result<()> {
        Ok(())
    }
}

/// Newline-delimited text files, one per stage, in a scratch directory.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    dir: PathBuf,
}

impl FileCheckpoint {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, stage: Stage) -> PathBuf {
        self.dir.join(stage.file_name())
    }
}

impl StageCheckpoint for FileCheckpoint {
    fn load(&self, stage: Stage) -> Result<Option<Vec<String>>> {
        let path = self.path_for(stage);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let sentences = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Some(sentences))
    }

    fn save(&self, stage: Stage, sentences: &[String]) -> Result<()> {
        let path = self.path_for(stage);
        let mut content = sentences.join("\n");
        content.push('\n');
        fs::write(&path, content)?;
        debug!("Saved {} checkpoint to {}", stage, path.display());
        Ok(())
    }

    fn discard(&self, stage: Stage) -> Result<()> {
        let path = self.path_for(stage);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[test]
    fn test_file_checkpoint_save_and_load() {
        let temp = TempDir::new().unwrap();
        let checkpoint = FileCheckpoint::new(temp.path()).unwrap();

        let sentences = vec!["First one.".to_string(), "Second one!".to_string()];
        checkpoint.save(Stage::Comma, &sentences).unwrap();

        temp.child("split_by_comma.txt").assert("First one.\nSecond one!\n");
        assert_eq!(checkpoint.load(Stage::Comma).unwrap(), Some(sentences));
        assert_eq!(checkpoint.load(Stage::Mark).unwrap(), None);
    }

    #[test]
    fn test_file_checkpoint_discard_and_clear() {
        let temp = TempDir::new().unwrap();
        let checkpoint = FileCheckpoint::new(temp.path().join("nested")).unwrap();

        for stage in Stage::ALL {
            checkpoint.save(stage, &["x".to_string()]).unwrap();
        }
        checkpoint.discard(Stage::Mark).unwrap();
        assert!(!checkpoint.path_for(Stage::Mark).exists());
        assert!(checkpoint.path_for(Stage::Long).exists());

        checkpoint.clear().unwrap();
        for stage in Stage::ALL {
            assert!(!checkpoint.path_for(stage).exists());
        }
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let temp = TempDir::new().unwrap();
        temp.child("split_by_mark.txt").write_str("a\n\n  \nb\n").unwrap();

        let checkpoint = FileCheckpoint::new(temp.path()).unwrap();
        assert_eq!(
            checkpoint.load(Stage::Mark).unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }
}
