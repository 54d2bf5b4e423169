use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the media cache directory, relative to the output root
pub const MEDIA_DIR: &str = "_files";

/// Output tree of the rendered site
pub struct Workspace {
    base_path: PathBuf,
}

impl Workspace {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns path to the channel list: {out}/index.html
    pub fn index_path(&self) -> PathBuf {
        self.base_path.join("index.html")
    }

    /// Returns path to a channel page: {out}/{channel_name}.html
    pub fn channel_page_path(&self, channel_name: &str) -> PathBuf {
        self.base_path.join(format!("{channel_name}.html"))
    }

    /// Returns path to the media cache: {out}/_files/
    pub fn media_dir(&self) -> PathBuf {
        self.base_path.join(MEDIA_DIR)
    }

    /// Write a finished page, replacing any previous version
    pub async fn write_page(&self, path: &Path, html: &str) -> Result<()> {
        fs::write(path, html).await?;
        Ok(())
    }

    /// Ensure output directories exist
    pub async fn ensure_workspace(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        fs::create_dir_all(self.media_dir()).await?;
        Ok(())
    }
}
