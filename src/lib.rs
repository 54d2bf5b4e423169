pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod metadata;
pub mod render;
pub mod site;
pub mod storage;

pub use error::{ArchiveError, Result};
