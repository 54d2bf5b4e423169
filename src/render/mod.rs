//! HTML rendering: message blocks, media, channel pages and the page shell

mod blocks;
mod channel;
mod media;
mod message;
mod page;

pub use blocks::{BlockRenderer, Diagnostic};
pub use channel::{ChannelAssembler, ChannelPage, PageStats};
pub use media::{MediaCategory, render_attachments, render_files};
pub use message::{MessageRenderer, RenderedMessage};
pub use page::{page_footer, page_header, page_title, render_channel_page, render_index};
