//! Message header and body rendering
//!
//! Structured messages are walked depth first, block → section → run, and
//! every run is emitted in encounter order with nothing added between
//! sections; line breaks come from newlines embedded in the text runs.

use crate::error::Result;
use crate::export::{Block, LegacyBody, Message, MessageBody, Run};
use crate::metadata::Directory;
use serde_json::Value;
use std::fmt::Write;

/// A run that could not be rendered, kept for the page summary
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: String,
    pub raw: Value,
}

pub struct BlockRenderer<'a> {
    directory: &'a Directory,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(directory: &'a Directory) -> Self {
        Self { directory }
    }

    /// Author name and UTC timestamp
    pub fn header(&self, message: &Message) -> Result<String> {
        let author = self.directory.user_name(&message.user);
        let ts = message.ts.pretty()?;

        Ok(format!(
            "<div class='msgHeader'><div class='user'>{author}</div>\n<div class='ts'>{ts}</div>\n</div>\n"
        ))
    }

    pub fn body(&self, message: &Message, diagnostics: &mut Vec<Diagnostic>) -> String {
        match &message.body {
            MessageBody::Legacy(body) => self.legacy(message, body),
            MessageBody::Structured(blocks) => self.blocks(blocks, diagnostics),
        }
    }

    fn legacy(&self, message: &Message, body: &LegacyBody) -> String {
        match (body.kind.as_str(), body.subtype.as_deref()) {
            ("message", Some("channel_join")) => format!(
                "<div class='msgText'>{} has joined the channel</div>",
                self.directory.user_name(&message.user)
            ),
            // channel_purpose and everything else: raw text as exported
            _ => body
                .text
                .as_deref()
                .map(|text| format!("<div class='msgText'>{text}</div>"))
                .unwrap_or_default(),
        }
    }

    fn blocks(&self, blocks: &[Block], diagnostics: &mut Vec<Diagnostic>) -> String {
        let mut out = String::new();
        for run in blocks
            .iter()
            .flat_map(|block| &block.elements)
            .flat_map(|section| &section.elements)
        {
            self.run(run, &mut out, diagnostics);
        }
        out
    }

    fn run(&self, run: &Run, out: &mut String, diagnostics: &mut Vec<Diagnostic>) {
        match run {
            Run::Text(text) => {
                let text = text.replace('\n', "<br/>\n");
                let _ = writeln!(out, "<span class='msgText'>{text}</span>");
            }
            Run::Link(url) => {
                let _ = writeln!(out, "<span class='msgLink'><a href='{url}'>{url}</a></span>");
            }
            Run::Emoji { unicode, name } => {
                let _ = writeln!(out, "<span class='msgText'>{}</span>", emoji(unicode, name));
            }
            Run::ChannelMention(id) => {
                let _ = writeln!(
                    out,
                    "<span class='msgText'>#{}</span>",
                    self.directory.channel_name(id)
                );
            }
            // mentions are already spelled out in the surrounding text
            Run::UserMention(_) | Run::Broadcast => {}
            Run::Unknown(raw) => {
                tracing::warn!(
                    kind = %run.kind(),
                    raw = %raw,
                    "Unrecognized rich text element, skipping"
                );
                diagnostics.push(Diagnostic {
                    kind: run.kind().to_string(),
                    raw: raw.clone(),
                });
            }
        }
    }
}

/// `1f600` → `&#x1f600;`; skin-tone and ZWJ sequences (`1f44d-1f3fb`) emit
/// one reference per code point. Custom emoji have no code point and keep
/// their `:name:` form.
fn emoji(unicode: &Option<String>, name: &Option<String>) -> String {
    match (unicode, name) {
        (Some(code), _) => code
            .split('-')
            .filter(|part| !part.is_empty())
            .map(|part| format!("&#x{part};"))
            .collect(),
        (None, Some(name)) => format!(":{name}:"),
        (None, None) => String::new(),
    }
}
