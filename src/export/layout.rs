use crate::error::Result;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

/// Read-only view of an unzipped Slack export
pub struct ExportDir {
    base_path: PathBuf,
}

impl ExportDir {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns path to the user manifest: {base}/users.json
    pub fn users_path(&self) -> PathBuf {
        self.base_path.join("users.json")
    }

    /// Returns path to the channel manifest: {base}/channels.json
    pub fn channels_path(&self) -> PathBuf {
        self.base_path.join("channels.json")
    }

    /// Returns path to a channel's batch directory: {base}/{channel_name}/
    pub fn channel_dir(&self, channel_name: &str) -> PathBuf {
        self.base_path.join(channel_name)
    }

    /// List a channel's batch files in file-name order
    ///
    /// Batch files are named by day (`2021-01-01.json`), so name order is
    /// publication order. Returns an empty list if the channel has no
    /// directory; any other failure to read it is an error.
    pub async fn batch_files(&self, channel_name: &str) -> Result<Vec<PathBuf>> {
        let dir = self.channel_dir(channel_name);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    channel = %channel_name,
                    path = ?dir,
                    "Channel has no directory in export"
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            if is_json && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }
}
