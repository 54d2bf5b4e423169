//! Parsed form of one exported message
//!
//! Messages are decoded once from the raw JSON tree into sum types. Optional
//! collections that are absent, null or of the wrong shape decode as empty,
//! and rich-text runs with an unrecognized `type` decode as [`Run::Unknown`].

use crate::error::{ArchiveError, Result};
use crate::export::{ChannelId, MessageTs, UserId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Message {
    pub user: UserId,
    pub ts: MessageTs,
    pub body: MessageBody,
    pub attachments: Vec<Attachment>,
    pub files: Vec<FileRef>,
}

/// Either block-kit rich text or the flat pre-block-kit shape, never both
#[derive(Debug, Clone)]
pub enum MessageBody {
    Structured(Vec<Block>),
    Legacy(LegacyBody),
}

#[derive(Debug, Clone, Default)]
pub struct LegacyBody {
    pub kind: String,
    pub subtype: Option<String>,
    pub text: Option<String>,
}

/// Outer rich-text container (`rich_text`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub elements: Vec<Section>,
}

/// Inline grouping inside a block (`rich_text_section`, `rich_text_quote`, ...)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Section {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub elements: Vec<Run>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Run {
    Text(String),
    Link(String),
    Emoji {
        name: Option<String>,
        unicode: Option<String>,
    },
    ChannelMention(ChannelId),
    UserMention(Option<UserId>),
    Broadcast,
    Unknown(Value),
}

impl Run {
    pub fn from_value(raw: Value) -> Self {
        let field = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_owned);

        let parsed = match raw.get("type").and_then(Value::as_str) {
            Some("text") => field("text").map(Run::Text),
            Some("link") => field("url").map(Run::Link),
            Some("emoji") => {
                let name = field("name");
                let unicode = field("unicode");
                (name.is_some() || unicode.is_some()).then_some(Run::Emoji { name, unicode })
            }
            Some("channel") => field("channel_id").map(|id| Run::ChannelMention(ChannelId::new(id))),
            Some("user") => Some(Run::UserMention(field("user_id").map(UserId::new))),
            Some("broadcast") => Some(Run::Broadcast),
            _ => None,
        };

        parsed.unwrap_or(Run::Unknown(raw))
    }

    /// The `type` tag of the raw node, for diagnostics
    pub fn kind(&self) -> &str {
        match self {
            Run::Text(_) => "text",
            Run::Link(_) => "link",
            Run::Emoji { .. } => "emoji",
            Run::ChannelMention(_) => "channel",
            Run::UserMention(_) => "user",
            Run::Broadcast => "broadcast",
            Run::Unknown(raw) => raw
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("<untyped>"),
        }
    }
}

impl<'de> Deserialize<'de> for Run {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Run::from_value)
    }
}

/// Legacy link preview
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attachment {
    pub image_url: Option<String>,
    pub thumb_url: Option<String>,
    pub title: Option<String>,
    pub fallback: Option<String>,
    pub from_url: Option<String>,
    pub original_url: Option<String>,
    pub title_link: Option<String>,
}

impl Attachment {
    /// Image shown in the preview, the full image winning over the thumbnail
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref().or(self.thumb_url.as_deref())
    }

    /// Visible label: title, else fallback text
    pub fn label(&self) -> Option<&str> {
        self.title.as_deref().or(self.fallback.as_deref())
    }

    pub fn source_url(&self) -> Option<&str> {
        self.from_url
            .as_deref()
            .or(self.original_url.as_deref())
            .or(self.title_link.as_deref())
    }
}

/// Uploaded file referenced by a message
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub filetype: Option<String>,
    pub mimetype: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "url_private")]
    pub url: String,
}

impl FileRef {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type", default)]
    kind: String,
    subtype: Option<String>,
    user: Option<String>,
    ts: Option<String>,
    text: Option<String>,
    blocks: Option<Value>,
    #[serde(default, deserialize_with = "lenient_seq")]
    attachments: Vec<Attachment>,
    #[serde(default, deserialize_with = "lenient_seq")]
    files: Vec<FileRef>,
}

impl Message {
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw = RawMessage::deserialize(value)
            .map_err(|e| ArchiveError::Schema(format!("malformed message: {e}")))?;
        Message::try_from(raw)
    }
}

impl TryFrom<RawMessage> for Message {
    type Error = ArchiveError;

    fn try_from(raw: RawMessage) -> Result<Self> {
        let ts = raw
            .ts
            .map(MessageTs::new)
            .ok_or_else(|| ArchiveError::Schema("message has no ts".to_string()))?;
        let user = raw.user.map(UserId::new).ok_or_else(|| {
            ArchiveError::Schema(format!("message {} has no user", ts.as_str()))
        })?;

        let body = match raw.blocks {
            Some(Value::Null) | None => MessageBody::Legacy(LegacyBody {
                kind: raw.kind,
                subtype: raw.subtype,
                text: raw.text,
            }),
            Some(blocks) => MessageBody::Structured(decode_seq(blocks)),
        };

        Ok(Message {
            user,
            ts,
            body,
            attachments: raw.attachments,
            files: raw.files,
        })
    }
}

/// Decode a JSON array, dropping elements that do not fit `T`
fn decode_seq<T: DeserializeOwned>(value: Value) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match T::deserialize(&item) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(
                        element = std::any::type_name::<T>(),
                        error = %e,
                        raw = %item,
                        "Skipping malformed element"
                    );
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(
                element = std::any::type_name::<T>(),
                raw = %other,
                "Expected an array, treating as empty"
            );
            Vec::new()
        }
    }
}

fn lenient_seq<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(decode_seq)
        .unwrap_or_default())
}
