//! Audio file store. Where exported audio lives.

use std::io;
use std::path::{Path, PathBuf};

use speakline_core::{AudioOutputFormat, SpeechError, SpeechSettings};

/// Maps save names to files in one directory.
#[derive(Debug, Clone)]
pub struct AudioFileStore {
    dir: PathBuf,
    format: AudioOutputFormat,
}

impl AudioFileStore {
    pub fn new(dir: impl Into<PathBuf>, format: AudioOutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &SpeechSettings) -> Self {
        Self::new(
            settings.effective_audio_dir(),
            settings.effective_output_format(),
        )
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<name>.<suffix>`. Names must be a single path component.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, SpeechError> {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains(['/', '\\'])
        {
            return Err(SpeechError::OutputFailed {
                path: self.dir.join(name),
                reason: format!("invalid save name {name:?}"),
            });
        }
        Ok(self
            .dir
            .join(format!("{trimmed}.{}", self.format.file_suffix())))
    }

    /// Whether a file already exists at `path`.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .is_ok_and(|meta| meta.is_file())
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Whether `path` holds at least one byte. Missing files count as empty.
    pub async fn is_non_empty(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .is_ok_and(|meta| meta.len() > 0)
    }

    /// Delete `path`, ignoring a file that is already gone.
    pub async fn remove(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed audio file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove audio file"),
        }
    }
}
