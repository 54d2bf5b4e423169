//! Workspace directory: user and channel names
//!
//! The export ships two manifests, `users.json` and `channels.json`. They are
//! read once at startup into immutable [`IdentityTable`]s and passed by
//! reference into rendering. Unknown ids resolve to themselves.

mod directory;
mod types;

pub use directory::{Directory, IdentityTable};
pub use types::{ChannelRecord, UserRecord};
