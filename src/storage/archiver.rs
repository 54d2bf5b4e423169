//! Local cache of files referenced by messages
//!
//! Every file lands at `_files/<id>.<filetype>` under the output root. The
//! directory itself is the record of what has been fetched: if the target
//! path exists, the file is not downloaded again, across runs as well as
//! within one.

use crate::config::FetchConfig;
use crate::error::{ArchiveError, Result};
use crate::storage::workspace::MEDIA_DIR;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Source of remote file bytes
pub trait Fetch: Send + Sync {
    /// Download the full body of `url`, failing on a non-success status
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Fetches over HTTPS, authenticating with the workspace token when one is
/// set and the file is hosted by Slack
pub struct HttpFetcher {
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("slack-archive/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            token: config.token.clone(),
        })
    }
}

/// Only Slack's own HTTPS hosts may see the workspace token; external files
/// (Google Drive and the like) carry third-party URLs in `url_private`
fn sends_token(url: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(url) else {
        return false;
    };
    let slack_host = url
        .host_str()
        .is_some_and(|host| host == "slack.com" || host.ends_with(".slack.com"));
    url.scheme() == "https" && slack_host
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_error = |reason: String| ArchiveError::Fetch {
            url: url.to_string(),
            reason,
        };

        let mut request = self.client.get(url);
        if let Some(token) = self.token.as_ref().filter(|_| sends_token(url)) {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| fetch_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("status {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Archive statistics for the run summary
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArchiveStats {
    pub fetched: u64,
    pub cache_hits: u64,
    pub failures: u64,
}

pub struct FileArchiver<F> {
    media_dir: PathBuf,
    fetcher: F,

    /// One lock per target file so concurrent requests fetch at most once
    locks: DashMap<String, Arc<Mutex<()>>>,

    stats: RwLock<ArchiveStats>,
}

impl<F: Fetch> FileArchiver<F> {
    pub fn new(media_dir: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            media_dir: media_dir.into(),
            fetcher,
            locks: DashMap::new(),
            stats: RwLock::new(ArchiveStats::default()),
        }
    }

    /// Make sure `<id>.<filetype>` exists locally and return its reference
    /// relative to the output root, e.g. `_files/F1.png`
    ///
    /// The reference is the same whether the file was already cached or has
    /// just been downloaded.
    pub async fn archive(&self, id: &str, filetype: &str, url: &str) -> Result<String> {
        validate_component("file id", id)?;
        validate_component("filetype", filetype)?;

        let file_name = format!("{id}.{filetype}");
        let local_ref = format!("{MEDIA_DIR}/{file_name}");
        let path = self.media_dir.join(&file_name);

        let lock = self.locks.entry(file_name.clone()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            self.archive_locked(id, url, &path).await
        };
        drop(lock);

        // The last holder drops the entry; waiters still hold a clone
        self.locks
            .remove_if(&file_name, |_, lock| Arc::strong_count(lock) == 1);

        result.map(|()| local_ref)
    }

    async fn archive_locked(&self, id: &str, url: &str, path: &Path) -> Result<()> {
        if fs::try_exists(path).await? {
            self.stats.write().await.cache_hits += 1;
            tracing::trace!(file_id = %id, path = ?path, "File cache hit");
            return Ok(());
        }

        tracing::info!(file_id = %id, url = %url, path = ?path, "Fetching file");
        match self.download(url, path).await {
            Ok(size) => {
                self.stats.write().await.fetched += 1;
                tracing::debug!(file_id = %id, bytes = size, "File archived");
                Ok(())
            }
            Err(e) => {
                self.stats.write().await.failures += 1;
                Err(e)
            }
        }
    }

    async fn download(&self, url: &str, path: &Path) -> Result<usize> {
        fs::create_dir_all(&self.media_dir).await?;
        let body = self.fetcher.fetch(url).await?;
        write_atomic(path, &body).await?;
        Ok(body.len())
    }

    pub async fn stats(&self) -> ArchiveStats {
        self.stats.read().await.clone()
    }
}

/// Write to a sibling temp file, then rename over the target
///
/// A crash or failed write never leaves a partial file at `path`.
async fn write_atomic(path: &Path, body: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.{}.part", Uuid::new_v4().simple()));

    let result: std::io::Result<()> = async {
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Ids and filetypes come from export data and become file names
fn validate_component(what: &str, value: &str) -> Result<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0']);
    if invalid {
        return Err(ArchiveError::Schema(format!("invalid {what} {value:?}")));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fake::FakeFetcher;
    use super::*;

    fn archiver(dir: &Path, fetcher: FakeFetcher) -> FileArchiver<FakeFetcher> {
        FileArchiver::new(dir.join(MEDIA_DIR), fetcher)
    }

    #[tokio::test]
    async fn test_archive_fetches_once() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::default();
        let archiver = archiver(dir.path(), fetcher.clone());

        let first = archiver.archive("F1", "png", "https://x/y.png").await.unwrap();
        let second = archiver.archive("F1", "png", "https://x/y.png").await.unwrap();

        assert_eq!(first, "_files/F1.png");
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 1);

        let stored = std::fs::read(dir.path().join("_files/F1.png")).unwrap();
        assert_eq!(stored, b"bytes of https://x/y.png");

        let stats = archiver.stats().await;
        assert_eq!(stats.fetched, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[tokio::test]
    async fn test_existing_file_survives_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(MEDIA_DIR)).unwrap();
        std::fs::write(dir.path().join("_files/F2.mp4"), b"cached").unwrap();

        let fetcher = FakeFetcher::default();
        let archiver = archiver(dir.path(), fetcher.clone());
        let local = archiver.archive("F2", "mp4", "https://x/v.mp4").await.unwrap();

        assert_eq!(local, "_files/F2.mp4");
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(
            std::fs::read(dir.path().join("_files/F2.mp4")).unwrap(),
            b"cached"
        );
    }

    #[tokio::test]
    async fn test_concurrent_requests_fetch_once() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::default();
        let archiver = archiver(dir.path(), fetcher.clone());

        let (a, b, c) = tokio::join!(
            archiver.archive("F3", "gif", "https://x/a.gif"),
            archiver.archive("F3", "gif", "https://x/a.gif"),
            archiver.archive("F3", "gif", "https://x/a.gif"),
        );

        assert_eq!(a.unwrap(), "_files/F3.gif");
        assert_eq!(b.unwrap(), "_files/F3.gif");
        assert_eq!(c.unwrap(), "_files/F3.gif");
        assert_eq!(fetcher.calls(), 1);
        assert!(archiver.locks.is_empty());
    }

    #[tokio::test]
    async fn test_locks_released_after_archive() {
        let dir = tempfile::tempdir().unwrap();
        let failing = archiver(dir.path(), FakeFetcher::failing());
        let archiver = archiver(dir.path(), FakeFetcher::default());

        archiver.archive("F6", "png", "https://x/a.png").await.unwrap();
        archiver.archive("F7", "png", "https://x/b.png").await.unwrap();
        assert!(failing.archive("F8", "png", "https://x/c.png").await.is_err());

        assert!(archiver.locks.is_empty());
        assert!(failing.locks.is_empty());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("F9.png");
        std::fs::create_dir_all(target.join("occupied")).unwrap();

        let result = write_atomic(&target, b"bytes").await;

        assert!(matches!(result, Err(ArchiveError::Io(_))));
        let leftovers: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
        assert!(target.join("occupied").is_dir());
    }

    #[test]
    fn test_token_only_sent_to_slack_hosts() {
        assert!(sends_token("https://files.slack.com/files-pri/T1-F1/cat.png"));
        assert!(sends_token("https://slack.com/files/F1"));
        assert!(!sends_token("https://drive.google.com/file/d/abc"));
        assert!(!sends_token("https://evil-slack.com/F1"));
        assert!(!sends_token("https://files.slack.com.evil.io/F1"));
        assert!(!sends_token("http://files.slack.com/F1"));
        assert!(!sends_token("not a url"));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path(), FakeFetcher::failing());

        let result = archiver.archive("F4", "png", "https://x/missing.png").await;

        assert!(matches!(result, Err(ArchiveError::Fetch { .. })));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join(MEDIA_DIR))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
        assert_eq!(archiver.stats().await.failures, 1);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::default();
        let archiver = archiver(dir.path(), fetcher.clone());

        for (id, filetype) in [("../F5", "png"), ("F5", "png/x"), ("", "png"), ("F5", "..")] {
            let result = archiver.archive(id, filetype, "https://x/y.png").await;
            assert!(matches!(result, Err(ArchiveError::Schema(_))));
        }
        assert_eq!(fetcher.calls(), 0);
    }
}
