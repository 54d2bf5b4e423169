use crate::error::Result;
use crate::export::Message;
use crate::metadata::Directory;
use crate::render::blocks::{BlockRenderer, Diagnostic};
use crate::render::media::{render_attachments, render_files};
use crate::storage::{Fetch, FileArchiver};

/// One message rendered to HTML, with any runs that were skipped
#[derive(Debug, Clone, Default)]
pub struct RenderedMessage {
    pub html: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Renders whole messages: header, body, attachments and files
pub struct MessageRenderer<'a, F> {
    directory: &'a Directory,
    archiver: &'a FileArchiver<F>,
}

impl<'a, F: Fetch> MessageRenderer<'a, F> {
    pub fn new(directory: &'a Directory, archiver: &'a FileArchiver<F>) -> Self {
        Self {
            directory,
            archiver,
        }
    }

    pub async fn render(&self, message: &Message) -> Result<RenderedMessage> {
        let blocks = BlockRenderer::new(self.directory);
        let header = blocks.header(message)?;

        let mut diagnostics = Vec::new();
        let body = blocks.body(message, &mut diagnostics);
        let attachments = render_attachments(&message.attachments);
        let files = render_files(&message.files, self.archiver).await;

        Ok(RenderedMessage {
            html: format!(
                "<div class='msg'>\n{header}<div class='msgBody'>{body}{attachments}{files}</div>\n</div>\n"
            ),
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FakeFetcher, MEDIA_DIR};
    use serde_json::json;

    #[tokio::test]
    async fn test_render_full_message() {
        let dir = tempfile::tempdir().unwrap();
        let directory = Directory::from_manifests(
            br#"[{"id": "U1", "name": "alice", "real_name": "Alice"}]"#,
            b"[]",
        )
        .unwrap();
        let archiver = FileArchiver::new(dir.path().join(MEDIA_DIR), FakeFetcher::default());
        let renderer = MessageRenderer::new(&directory, &archiver);

        let message = Message::from_value(&json!({
            "type": "message",
            "user": "U1",
            "ts": "1609459200.000200",
            "blocks": [{"type": "rich_text", "elements": [
                {"type": "rich_text_section", "elements": [{"type": "text", "text": "look"}]}
            ]}],
            "attachments": [{"from_url": "https://example.com", "title": "Example"}],
            "files": [{"id": "F1", "filetype": "png", "mimetype": "image/png", "name": "cat.png", "url_private": "https://x/cat.png"}]
        }))
        .unwrap();

        let rendered = renderer.render(&message).await.unwrap();
        let html = rendered.html;

        assert!(html.starts_with("<div class='msg'>\n<div class='msgHeader'>"));
        assert!(html.contains("<div class='user'>Alice</div>"));
        let body = html.find("look").unwrap();
        let attachment = html.find("<a href='https://example.com'>Example</a>").unwrap();
        let file = html.find("<img src='_files/F1.png'></img>").unwrap();
        assert!(body < attachment && attachment < file);
        assert!(rendered.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_bad_timestamp_fails_message() {
        let dir = tempfile::tempdir().unwrap();
        let directory = Directory::default();
        let archiver = FileArchiver::new(dir.path().join(MEDIA_DIR), FakeFetcher::default());
        let renderer = MessageRenderer::new(&directory, &archiver);

        let message =
            Message::from_value(&json!({"type": "message", "user": "U1", "ts": "soon", "text": "hi"}))
                .unwrap();
        assert!(renderer.render(&message).await.is_err());
    }
}
