//! Slack export input: directory layout, identifiers and the message model

mod layout;
mod message;
mod types;

pub use layout::ExportDir;
pub use message::{Attachment, Block, FileRef, LegacyBody, Message, MessageBody, Run, Section};
pub use types::{ChannelId, MessageTs, UserId};
