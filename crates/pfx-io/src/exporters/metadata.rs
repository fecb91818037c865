//! Export metadata helpers shared by format-specific serializers.
use chrono::{DateTime, Utc};

/// Provenance annotation attached to exported files.
#[derive(Debug, Clone, Default)]
pub struct ExportMetadata {
    /// Case name or input path the export was produced from
    pub source: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub pfx_version: Option<String>,
}

impl ExportMetadata {
    /// Metadata stamped with the current time and this crate's version.
    pub fn now(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            created_at: Some(Utc::now()),
            pfx_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    pub fn source_description(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn creation_timestamp(&self) -> Option<String> {
        self.created_at
            .as_ref()
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }

    pub fn pfx_version(&self) -> Option<&str> {
        self.pfx_version.as_deref()
    }
}
