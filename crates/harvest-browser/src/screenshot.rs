use crate::actions::{RenderedPage, ScreenshotCapture};
use crate::error::CaptureError;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Writes page screenshots as `<dir>/<uuid>.png`.
#[derive(Debug, Clone)]
pub struct ScreenshotStore {
    dir: PathBuf,
    full_page: bool,
}

impl ScreenshotStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, full_page: bool) -> Self {
        Self {
            dir: dir.into(),
            full_page,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Delete stored PNGs last modified at least `max_age` ago.
    ///
    /// Returns the number of files removed. A missing directory counts as empty.
    pub async fn purge_older_than(&self, max_age: Duration) -> Result<usize, CaptureError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("png") {
                continue;
            }

            let modified = entry.metadata().await?.modified()?;
            let age = now.duration_since(modified).unwrap_or_default();
            if age >= max_age {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
                }
            }
        }

        if removed > 0 {
            tracing::info!("Purged {} screenshots from {}", removed, self.dir.display());
        }
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl ScreenshotCapture for ScreenshotStore {
    async fn capture(
        &self,
        page: &dyn RenderedPage,
        seed_url: &str,
    ) -> Result<String, CaptureError> {
        let png = page.screenshot(self.full_page).await?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.png", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, &png).await?;

        tracing::debug!(
            "Stored screenshot of {} at {} ({} bytes)",
            seed_url,
            path.display(),
            png.len()
        );
        Ok(path.to_string_lossy().into_owned())
    }
}
