//! Audio artifacts on disk
//!
//! Two lifetimes exist:
//! - [`ScopedAudioFile`] holds one request's payload and is deleted when the
//!   guard drops, whichever way the request ends.
//! - [`SoundsDirectory`] persists synthesized audio for an external consumer.
//!   Files written there are never deleted by this crate.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::SpeechError;
use crate::types::AudioFormat;

/// A private temp file holding one audio payload
///
/// The file is created with owner-only permissions and removed on drop.
#[derive(Debug)]
pub struct ScopedAudioFile {
    file: NamedTempFile,
}

impl ScopedAudioFile {
    /// Create an empty scoped file in the system temp directory
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Io` if the file cannot be created.
    pub fn empty(format: AudioFormat) -> Result<Self, SpeechError> {
        let file = tempfile::Builder::new()
            .prefix("speech-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile()?;
        Ok(Self { file })
    }

    /// Create a scoped file in the system temp directory holding `data`
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Io` if the file cannot be created or written.
    pub async fn write(data: &[u8], format: AudioFormat) -> Result<Self, SpeechError> {
        let scoped = Self::empty(format)?;
        tokio::fs::write(scoped.path(), data).await?;
        debug!(path = %scoped.path().display(), bytes = data.len(), "Staged audio payload");
        Ok(scoped)
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Shared directory of durable synthesized audio
#[derive(Debug, Clone)]
pub struct SoundsDirectory {
    root: PathBuf,
}

impl SoundsDirectory {
    /// Open (creating if absent) the directory at `path`
    ///
    /// The stored root is absolute so reported artifact paths are too.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Io` if the directory cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SpeechError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let root = std::path::absolute(path)?;
        Ok(Self { root })
    }

    /// Absolute directory root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that `unique_id` can be embedded in a file name
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::InvalidArtifactId` for ids containing path
    /// separators, parent references, or NUL.
    pub fn validate_id(unique_id: &str) -> Result<(), SpeechError> {
        if unique_id.contains(['/', '\\', '\0']) || unique_id.contains("..") {
            return Err(SpeechError::InvalidArtifactId(unique_id.to_string()));
        }
        Ok(())
    }

    /// Path the artifact for `unique_id` is written to
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::InvalidArtifactId` if the id is rejected.
    pub fn artifact_path(&self, unique_id: &str) -> Result<PathBuf, SpeechError> {
        Self::validate_id(unique_id)?;
        Ok(self.root.join(format!(
            "response_{unique_id}.{}",
            AudioFormat::Mp3.extension()
        )))
    }

    /// Write `data` as the artifact for `unique_id`, replacing any previous file
    ///
    /// Concurrent writers for one id are not serialized; the last write wins.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::InvalidArtifactId` for a rejected id and
    /// `SpeechError::Io` if the write fails.
    pub async fn write(&self, unique_id: &str, data: &[u8]) -> Result<PathBuf, SpeechError> {
        let path = self.artifact_path(unique_id)?;
        tokio::fs::write(&path, data).await?;
        debug!(path = %path.display(), bytes = data.len(), "Wrote durable audio artifact");
        Ok(path)
    }
}
