//! Legacy attachments and uploaded files

use crate::export::{Attachment, FileRef};
use crate::storage::{Fetch, FileArchiver};

/// How an uploaded file is shown, decided by its filetype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Image,
    Audio,
    Video,
    Link,
}

impl MediaCategory {
    pub fn from_filetype(filetype: &str) -> Self {
        match filetype {
            "jpg" | "png" | "gif" => MediaCategory::Image,
            "m4a" | "wav" | "aac" => MediaCategory::Audio,
            // quicktime (mov) is not playable in most browsers
            "mp4" => MediaCategory::Video,
            _ => MediaCategory::Link,
        }
    }
}

/// Link previews: image (if any) and title wrapped in a link to the source
///
/// Previews without an image repeat a link that is usually already in the
/// message text.
pub fn render_attachments(attachments: &[Attachment]) -> String {
    attachments.iter().map(render_attachment).collect()
}

fn render_attachment(attachment: &Attachment) -> String {
    let mut inner = String::new();
    if let Some(image) = attachment.image() {
        inner.push_str(&format!("<img src='{image}'></img><br>"));
    }
    if let Some(label) = attachment.label() {
        inner.push_str(label);
    }

    match attachment.source_url() {
        Some(url) => format!("<a href='{url}'>{inner}</a>"),
        None => inner,
    }
}

/// Archive every file locally and render it by category
///
/// Files without a filetype are skipped. A file that cannot be archived is
/// rendered as a plain link to its remote url.
pub async fn render_files<F: Fetch>(files: &[FileRef], archiver: &FileArchiver<F>) -> String {
    let mut out = String::new();
    for file in files {
        let Some(filetype) = file.filetype.as_deref() else {
            tracing::debug!(file_id = %file.id, "File has no filetype, skipping");
            continue;
        };

        match archiver.archive(&file.id, filetype, &file.url).await {
            Ok(local) => out.push_str(&render_file(file, filetype, &local)),
            Err(e) => {
                tracing::warn!(
                    file_id = %file.id,
                    url = %file.url,
                    error = %e,
                    "Could not archive file, linking to remote url"
                );
                out.push_str(&link(&file.url, file.display_name()));
            }
        }
    }
    out
}

fn render_file(file: &FileRef, filetype: &str, local: &str) -> String {
    let name = file.display_name();
    match MediaCategory::from_filetype(filetype) {
        MediaCategory::Image => format!("<img src='{local}'></img>"),
        MediaCategory::Audio => format!(
            "<audio controls>{}Browser does not support audio link: {}</audio>",
            source(local, file.mimetype.as_deref()),
            link(local, name)
        ),
        MediaCategory::Video => format!(
            "<video controls>{}Browser does not support video link: {}</video>",
            source(local, file.mimetype.as_deref()),
            link(local, name)
        ),
        MediaCategory::Link => link(local, name),
    }
}

fn source(src: &str, mimetype: Option<&str>) -> String {
    match mimetype {
        Some(mimetype) => format!("<source src='{src}' type='{mimetype}'>"),
        None => format!("<source src='{src}'>"),
    }
}

fn link(href: &str, label: &str) -> String {
    format!("<a href='{href}'>{label}</a>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FakeFetcher, MEDIA_DIR};
    use serde_json::json;

    fn file(id: &str, filetype: Option<&str>, mimetype: &str) -> FileRef {
        FileRef {
            id: id.to_string(),
            filetype: filetype.map(str::to_string),
            mimetype: Some(mimetype.to_string()),
            name: Some(format!("{id}-name")),
            url: format!("https://files.slack.com/{id}"),
        }
    }

    #[test]
    fn test_category_dispatch() {
        use MediaCategory::*;
        let cases = [
            ("jpg", Image),
            ("png", Image),
            ("gif", Image),
            ("m4a", Audio),
            ("wav", Audio),
            ("aac", Audio),
            ("mp4", Video),
            ("mov", Link),
            ("pdf", Link),
            ("", Link),
            ("PNG", Link),
        ];
        for (filetype, expected) in cases {
            assert_eq!(MediaCategory::from_filetype(filetype), expected, "{filetype}");
        }
    }

    #[test]
    fn test_attachment_with_image() {
        let attachment: Attachment = serde_json::from_value(json!({
            "from_url": "https://example.com/post",
            "thumb_url": "https://example.com/thumb.png",
            "title": "A post",
            "fallback": "fallback text"
        }))
        .unwrap();

        assert_eq!(
            render_attachments(&[attachment]),
            "<a href='https://example.com/post'><img src='https://example.com/thumb.png'></img><br>A post</a>"
        );
    }

    #[test]
    fn test_attachment_fallback_and_no_source() {
        let with_fallback: Attachment = serde_json::from_value(json!({
            "from_url": "https://example.com", "fallback": "Example"
        }))
        .unwrap();
        let bare: Attachment = serde_json::from_value(json!({"title": "Build passed"})).unwrap();

        assert_eq!(
            render_attachments(&[with_fallback, bare]),
            "<a href='https://example.com'>Example</a>Build passed"
        );
    }

    #[tokio::test]
    async fn test_render_files_by_category() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::default();
        let archiver = FileArchiver::new(dir.path().join(MEDIA_DIR), fetcher.clone());

        let files = vec![
            file("F1", Some("png"), "image/png"),
            file("F2", Some("m4a"), "audio/mp4"),
            file("F3", Some("mp4"), "video/mp4"),
            file("F4", Some("mov"), "video/quicktime"),
            file("F5", None, "application/octet-stream"),
        ];
        let html = render_files(&files, &archiver).await;

        assert!(html.contains("<img src='_files/F1.png'></img>"));
        assert!(html.contains(
            "<audio controls><source src='_files/F2.m4a' type='audio/mp4'>Browser does not support audio link: <a href='_files/F2.m4a'>F2-name</a></audio>"
        ));
        assert!(html.contains("<video controls><source src='_files/F3.mp4' type='video/mp4'>"));
        assert!(html.contains("<a href='_files/F4.mov'>F4-name</a>"));
        assert!(!html.contains("<video controls><source src='_files/F4.mov'"));
        assert!(!html.contains("F5"));
        assert_eq!(fetcher.calls(), 4);
    }

    #[tokio::test]
    async fn test_failed_archive_renders_remote_link() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = FileArchiver::new(dir.path().join(MEDIA_DIR), FakeFetcher::failing());

        let html = render_files(&[file("F6", Some("png"), "image/png")], &archiver).await;
        assert_eq!(html, "<a href='https://files.slack.com/F6'>F6-name</a>");
    }
}
