use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Audio,
    Video,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Audio => "mp3",
            ArtifactKind::Video => "mp4",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(ArtifactKind::Audio),
            "mp4" => Some(ArtifactKind::Video),
            _ => None,
        }
    }

    pub fn file_name(&self, content_id: &str) -> String {
        format!("{}.{}", content_id, self.extension())
    }
}

/// Filesystem store addressing artifacts by `(content_id, kind)`.
///
/// All writes land in `base_dir`. `legacy_dirs` are read-only locations that
/// older deployments wrote to; lookups fall through to them in order so ids
/// produced there keep resolving.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    base_dir: PathBuf,
    legacy_dirs: Vec<PathBuf>,
    min_video_bytes: u64,
}

impl ArtifactStore {
    pub async fn new(base_dir: PathBuf, legacy_dirs: Vec<PathBuf>, min_video_bytes: u64) -> Result<Self> {
        fs::create_dir_all(&base_dir).await.with_context(|| {
            format!("Failed to create artifact directory: {}", base_dir.display())
        })?;

        info!(
            "✅ Artifact store at {} ({} legacy locations)",
            base_dir.display(),
            legacy_dirs.len()
        );

        Ok(Self {
            base_dir,
            legacy_dirs,
            min_video_bytes,
        })
    }

    #[cfg(test)]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Smallest file size accepted as a finished artifact of `kind`.
    pub fn min_bytes(&self, kind: ArtifactKind) -> u64 {
        match kind {
            ArtifactKind::Video => self.min_video_bytes,
            ArtifactKind::Audio => 1,
        }
    }

    fn candidate_dirs(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.base_dir).chain(self.legacy_dirs.iter())
    }

    /// Every path `find` would look at, in lookup order.
    pub fn searched_paths(&self, content_id: &str, kind: ArtifactKind) -> Vec<PathBuf> {
        let name = kind.file_name(content_id);
        self.candidate_dirs().map(|dir| dir.join(&name)).collect()
    }

    /// First candidate holding a complete artifact, if any.
    pub async fn find(&self, content_id: &str, kind: ArtifactKind) -> Option<PathBuf> {
        let min = self.min_bytes(kind);

        for path in self.searched_paths(content_id, kind) {
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_file() && meta.len() >= min => {
                    debug!("Found artifact at {}", path.display());
                    return Some(path);
                }
                Ok(meta) if meta.is_file() => {
                    warn!(
                        "Ignoring undersized artifact {} ({} bytes, need {})",
                        path.display(),
                        meta.len(),
                        min
                    );
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Cannot stat {}: {}", path.display(), e),
            }
        }

        None
    }

    /// A fresh hidden path in the base directory for an in-progress write.
    pub fn staging_path(&self, content_id: &str, kind: ArtifactKind) -> PathBuf {
        self.base_dir.join(format!(
            ".{}.{}.{}.partial",
            content_id,
            Uuid::new_v4().as_simple(),
            kind.extension()
        ))
    }

    /// Moves a finished staging file into its final place.
    ///
    /// The file must meet the minimum size for its kind; otherwise it is left
    /// where it is and an error is returned.
    pub async fn commit(&self, staged: &Path, content_id: &str, kind: ArtifactKind) -> Result<PathBuf> {
        let size = fs::metadata(staged)
            .await
            .with_context(|| format!("Staged {} file missing: {}", kind.extension(), staged.display()))?
            .len();

        let min = self.min_bytes(kind);
        if size < min {
            bail!(
                "Generated {} file is too small ({} bytes, need at least {})",
                kind.extension(),
                size,
                min
            );
        }

        let target = self.base_dir.join(kind.file_name(content_id));
        fs::rename(staged, &target)
            .await
            .with_context(|| format!("Failed to move artifact into {}", target.display()))?;

        info!("Stored artifact {} ({} bytes)", target.display(), size);
        Ok(target)
    }

    /// Writes `bytes` as the artifact for `(content_id, kind)` atomically.
    #[cfg(test)]
    pub async fn put(&self, content_id: &str, kind: ArtifactKind, bytes: &[u8]) -> Result<PathBuf> {
        let staged = self.staging_path(content_id, kind);
        fs::write(&staged, bytes)
            .await
            .with_context(|| format!("Failed to write {}", staged.display()))?;

        match self.commit(&staged, content_id, kind).await {
            Ok(path) => Ok(path),
            Err(e) => {
                self.discard(&staged).await;
                Err(e)
            }
        }
    }

    /// Best-effort removal of a staging file.
    pub async fn discard(&self, staged: &Path) {
        if let Err(e) = fs::remove_file(staged).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove staging file {}: {}", staged.display(), e);
            }
        }
    }
}
