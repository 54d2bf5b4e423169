//! Immutable id → name tables for users and channels

use crate::error::{ArchiveError, Result};
use crate::export::{ChannelId, ExportDir, UserId};
use crate::metadata::types::{ChannelRecord, UserRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Mapping from opaque id to display name
///
/// Lookups never fail: an id that is not in the table resolves to itself.
#[derive(Debug, Clone, Default)]
pub struct IdentityTable {
    entries: HashMap<String, String>,
}

impl IdentityTable {
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.entries.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All display names, sorted
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.values().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl FromIterator<(String, String)> for IdentityTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Identity context shared by every rendering call
#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: IdentityTable,
    channels: IdentityTable,
}

impl Directory {
    pub fn new(users: IdentityTable, channels: IdentityTable) -> Self {
        Self { users, channels }
    }

    /// Build both tables from the raw manifest documents
    pub fn from_manifests(users_doc: &[u8], channels_doc: &[u8]) -> serde_json::Result<Self> {
        Ok(Self::new(users_table(users_doc)?, channels_table(channels_doc)?))
    }

    /// Read `users.json` and `channels.json`; any failure here is fatal
    pub async fn load(export: &ExportDir) -> Result<Self> {
        let users_path = export.users_path();
        let users = users_table(&read_manifest(&users_path).await?)
            .map_err(|source| ArchiveError::Parse {
                path: users_path,
                source,
            })?;

        let channels_path = export.channels_path();
        let channels = channels_table(&read_manifest(&channels_path).await?)
            .map_err(|source| ArchiveError::Parse {
                path: channels_path,
                source,
            })?;

        tracing::info!(
            users = users.len(),
            channels = channels.len(),
            "Loaded workspace directory"
        );

        Ok(Self::new(users, channels))
    }

    pub fn users(&self) -> &IdentityTable {
        &self.users
    }

    pub fn channels(&self) -> &IdentityTable {
        &self.channels
    }

    pub fn user_name<'a>(&'a self, id: &'a UserId) -> &'a str {
        self.users.resolve(id.as_str())
    }

    pub fn channel_name<'a>(&'a self, id: &'a ChannelId) -> &'a str {
        self.channels.resolve(id.as_str())
    }
}

fn users_table(doc: &[u8]) -> serde_json::Result<IdentityTable> {
    Ok(parse_records::<UserRecord>(doc)?
        .into_iter()
        .filter_map(|user| match user.best_name() {
            Some(name) => Some((user.id.clone(), name.to_string())),
            None => {
                tracing::warn!(user_id = %user.id, "User has no name, will use ID");
                None
            }
        })
        .collect())
}

fn channels_table(doc: &[u8]) -> serde_json::Result<IdentityTable> {
    Ok(parse_records::<ChannelRecord>(doc)?
        .into_iter()
        .filter_map(|channel| match channel.display_name() {
            Some(name) => Some((channel.id.clone(), name.to_string())),
            None => {
                tracing::warn!(channel_id = %channel.id, "Channel has no name, skipping");
                None
            }
        })
        .collect())
}

async fn read_manifest(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| ArchiveError::Manifest {
            path: path.to_path_buf(),
            source,
        })
}

/// Parse a manifest array, skipping entries that lack the required fields
fn parse_records<T: DeserializeOwned>(doc: &[u8]) -> serde_json::Result<Vec<T>> {
    let values: Vec<Value> = serde_json::from_slice(doc)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match T::deserialize(&value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, record = %value, "Skipping malformed manifest entry");
                None
            }
        })
        .collect())
}
