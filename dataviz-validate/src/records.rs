//! Stored record fixtures for update validation.
//!
//! A records file is a JSON array of connections as an operator would
//! configure them, with the real password in the URI:
//!
//! ```json
//! [{"id": 1, "name": "sales", "uri": "postgresql://admin:secret@db:5432/sales"}]
//! ```
//!
//! Each entry is loaded through [`ConnectionRecord::set_uri`], so the secret
//! is split off and the stored URI is masked exactly as in persistence.

use anyhow::Context;
use dataviz_core::{ConnectionRecord, MemoryRecordStore, RecordExtra};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// One entry of a records file.
#[derive(Debug, Deserialize)]
pub struct RecordFixture {
    /// Record id payloads refer to
    pub id: i64,
    /// Display name
    pub name: String,
    /// Connection URI with the real password
    pub uri: String,
    /// Engine-specific secret blob
    #[serde(default)]
    pub encrypted_extra: Option<String>,
    /// PEM certificate
    #[serde(default)]
    pub server_cert: Option<String>,
    /// Whether queries run as the logged-in user
    #[serde(default)]
    pub impersonate_user: bool,
    /// Record extra blob
    #[serde(default)]
    pub extra: Option<RecordExtra>,
}

impl RecordFixture {
    /// Converts the fixture into a record with its secret split off.
    ///
    /// # Errors
    /// Returns an error if the URI does not parse.
    pub fn into_record(self) -> anyhow::Result<ConnectionRecord> {
        let mut record = ConnectionRecord::new(self.name)
            .with_id(self.id)
            .with_uri(&self.uri)
            .with_context(|| format!("Invalid URI for record {}", self.id))?;
        record.encrypted_extra = self.encrypted_extra;
        record.server_cert = self.server_cert;
        record.impersonate_user = self.impersonate_user;
        if let Some(extra) = self.extra {
            record.extra = extra.to_json_string();
        }
        Ok(record)
    }
}

/// Parses a records document into an in-memory store.
///
/// # Errors
/// Returns an error if the document is not a JSON array of fixtures or a
/// URI does not parse.
pub fn parse_records(raw: &str) -> anyhow::Result<MemoryRecordStore> {
    let fixtures: Vec<RecordFixture> =
        serde_json::from_str(raw).context("Records must be a JSON array of connections")?;

    let mut store = MemoryRecordStore::new();
    for fixture in fixtures {
        let id = store.insert(fixture.into_record()?)?;
        debug!("Loaded record {}", id);
    }
    Ok(store)
}

/// Reads and parses a records file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub async fn load_records(path: &Path) -> anyhow::Result<MemoryRecordStore> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read records {}", path.display()))?;
    parse_records(&raw).with_context(|| format!("Failed to load records {}", path.display()))
}
