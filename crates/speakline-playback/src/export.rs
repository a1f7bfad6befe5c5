//! Audio export. Synthesize segments into a named file.
//!
//! Export runs on the cloud engine with a file sink and resolves on the
//! session's terminal event instead of updating live playback state.

use std::path::PathBuf;
use std::sync::Arc;

use speakline_core::{EngineEvent, FailureKind, Segment, SpeechError, VoiceConfig};

use crate::engine::CloudEngine;
use crate::store::AudioFileStore;

/// Writes synthesized audio for a save name, at most once per name.
pub struct AudioExporter {
    engine: Arc<CloudEngine>,
    store: AudioFileStore,
}

impl AudioExporter {
    pub const fn new(engine: Arc<CloudEngine>, store: AudioFileStore) -> Self {
        Self { engine, store }
    }

    #[must_use]
    pub const fn store(&self) -> &AudioFileStore {
        &self.store
    }

    /// Synthesize `segments` into the file for `name` and return its path.
    ///
    /// An existing file for `name` is returned as-is without synthesis. A
    /// failed, cancelled, or empty result deletes the file.
    pub async fn export(
        &self,
        segments: &[Segment],
        default: &VoiceConfig,
        name: &str,
    ) -> Result<PathBuf, SpeechError> {
        let path = self.store.path_for(name)?;
        if self.store.exists(&path).await {
            tracing::info!(path = %path.display(), "Reusing existing audio file");
            return Ok(path);
        }
        self.store.ensure_dir().await?;

        let mut events = match self
            .engine
            .synthesize_to_file(segments, default, path.clone())
            .await
        {
            Ok(events) => events,
            Err(e) => {
                self.store.remove(&path).await;
                return Err(e);
            }
        };

        match events.until_terminal().await {
            EngineEvent::Stopped => {
                if self.store.is_non_empty(&path).await {
                    tracing::info!(path = %path.display(), "Audio export finished");
                    Ok(path)
                } else {
                    tracing::warn!(path = %path.display(), "Audio export produced no data");
                    self.store.remove(&path).await;
                    Err(SpeechError::EmptyOutput(path))
                }
            }
            EngineEvent::Failed(failure) => {
                tracing::warn!(
                    path = %path.display(),
                    kind = ?failure.kind,
                    message = %failure.message,
                    "Audio export failed"
                );
                self.store.remove(&path).await;
                Err(match failure.kind {
                    FailureKind::Cancelled => SpeechError::Cancelled(failure.message),
                    FailureKind::Output => SpeechError::OutputFailed {
                        path,
                        reason: failure.message,
                    },
                    FailureKind::Configuration | FailureKind::Synthesis => {
                        SpeechError::Synthesis(failure.message)
                    }
                })
            }
            other => {
                self.store.remove(&path).await;
                Err(SpeechError::Synthesis(format!(
                    "unexpected terminal event {other:?}"
                )))
            }
        }
    }
}
