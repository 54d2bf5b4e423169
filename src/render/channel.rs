use crate::error::{ArchiveError, Result};
use crate::export::Message;
use crate::render::message::MessageRenderer;
use crate::storage::Fetch;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Counters for one channel page
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageStats {
    pub batch_files: usize,
    pub rendered: usize,
    pub skipped: usize,
    pub diagnostics: usize,
}

impl PageStats {
    fn merge(&mut self, other: &PageStats) {
        self.batch_files += other.batch_files;
        self.rendered += other.rendered;
        self.skipped += other.skipped;
        self.diagnostics += other.diagnostics;
    }
}

#[derive(Debug, Default, Clone)]
pub struct ChannelPage {
    pub body: String,
    pub stats: PageStats,
}

/// Builds a channel page body from its batch files
pub struct ChannelAssembler<'a, F> {
    renderer: MessageRenderer<'a, F>,
}

impl<'a, F: Fetch> ChannelAssembler<'a, F> {
    pub fn new(renderer: MessageRenderer<'a, F>) -> Self {
        Self { renderer }
    }

    /// Render every message of every batch file, in the order given
    ///
    /// A batch file that cannot be read or parsed fails the whole page. A
    /// message that cannot be rendered is logged and left out.
    pub async fn assemble(&self, channel_name: &str, batch_files: &[PathBuf]) -> Result<ChannelPage> {
        let mut page = ChannelPage::default();

        for path in batch_files {
            tracing::debug!(channel = %channel_name, path = ?path, "Rendering batch file");
            let messages = read_batch(path).await?;
            let batch = self.render_batch(channel_name, path, &messages).await;

            page.body.push_str(&batch.body);
            page.stats.merge(&batch.stats);
            page.stats.batch_files += 1;
        }

        Ok(page)
    }

    /// Render one batch's messages in array order
    pub async fn render_batch(&self, channel_name: &str, path: &Path, messages: &[Value]) -> ChannelPage {
        let mut page = ChannelPage::default();

        for (index, value) in messages.iter().enumerate() {
            let rendered = match Message::from_value(value) {
                Ok(message) => self.renderer.render(&message).await,
                Err(e) => Err(e),
            };

            match rendered {
                Ok(rendered) => {
                    page.body.push_str(&rendered.html);
                    page.stats.rendered += 1;
                    page.stats.diagnostics += rendered.diagnostics.len();
                }
                Err(e) => {
                    page.stats.skipped += 1;
                    let ts = value.get("ts").and_then(Value::as_str).unwrap_or("<none>");
                    tracing::warn!(
                        channel = %channel_name,
                        path = ?path,
                        index = index,
                        ts = %ts,
                        error = %e,
                        "Skipping message"
                    );
                }
            }
        }

        page
    }
}

async fn read_batch(path: &Path) -> Result<Vec<Value>> {
    let body = tokio::fs::read(path).await?;
    serde_json::from_slice(&body).map_err(|source| ArchiveError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
