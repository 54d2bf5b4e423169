use crate::error::{ArchiveError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Slack message timestamp, e.g. `1609459200.000200`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MessageTs(pub String);

impl MessageTs {
    pub fn new(ts: impl Into<String>) -> Self {
        Self(ts.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whole-second portion as a UTC instant; the fraction is dropped
    pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
        let secs = self.0.split('.').next().unwrap_or_default();
        let secs: i64 = secs
            .parse()
            .map_err(|_| ArchiveError::Schema(format!("invalid timestamp {:?}", self.0)))?;

        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| ArchiveError::Schema(format!("timestamp out of range {:?}", self.0)))
    }

    /// Human readable form, e.g. `Fri, 01 Jan 2021 00:00:00 UTC`
    pub fn pretty(&self) -> Result<String> {
        Ok(self
            .to_datetime()?
            .format("%a, %d %b %Y %H:%M:%S UTC")
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_ignores_fraction() {
        let ts = MessageTs::new("1609459200.000200");
        assert_eq!(ts.pretty().unwrap(), "Fri, 01 Jan 2021 00:00:00 UTC");
    }

    #[test]
    fn test_pretty_without_fraction() {
        let ts = MessageTs::new("1609462861");
        assert_eq!(ts.pretty().unwrap(), "Fri, 01 Jan 2021 01:01:01 UTC");
    }

    #[test]
    fn test_invalid_timestamp() {
        let ts = MessageTs::new("yesterday");
        assert!(matches!(ts.pretty(), Err(ArchiveError::Schema(_))));
    }
}
