mod archiver;
mod workspace;

pub use archiver::{ArchiveStats, Fetch, FileArchiver, HttpFetcher};
pub use workspace::{MEDIA_DIR, Workspace};

#[cfg(test)]
pub(crate) use archiver::fake::FakeFetcher;
