//! Blob data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::lease::{LeaseDuration, LeaseState, LeaseStatus};

/// Copy status for blob copy operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    Pending,
    Success,
    Failed,
    Aborted,
}

impl CopyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Pending => "pending",
            CopyStatus::Success => "success",
            CopyStatus::Failed => "failed",
            CopyStatus::Aborted => "aborted",
        }
    }
}

/// Bookkeeping for a blob created through a copy operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyProperties {
    pub id: String,
    /// Source URL the copy was made from.
    pub source: String,
    pub status: CopyStatus,
    /// Progress as `"bytes_copied/bytes_total"`.
    pub progress: String,
    pub completion_time: Option<DateTime<Utc>>,
}

/// Blob properties as reported by listing and properties calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobProperties {
    pub content_length: u64,
    pub content_type: Option<String>,
    pub etag: String,
    pub created_on: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub lease_state: LeaseState,
    pub lease_status: LeaseStatus,
    pub lease_duration: Option<LeaseDuration>,
    /// Populated only when copy inclusion was requested and the blob was
    /// created by a copy.
    pub copy: Option<CopyProperties>,
}

/// A blob descriptor returned by listing calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobItem {
    pub name: String,
    /// Snapshot id; `None` for the live blob.
    pub snapshot: Option<String>,
    pub properties: BlobProperties,
    /// `Some` only when metadata inclusion was requested.
    pub metadata: Option<HashMap<String, String>>,
}

/// Formats a snapshot id from its creation instant: an RFC 3339 timestamp
/// with 100-nanosecond precision, which also makes ids sort oldest-first.
pub(crate) fn snapshot_id(now: DateTime<Utc>) -> String {
    format!(
        "{}.{:07}Z",
        now.format("%Y-%m-%dT%H:%M:%S"),
        now.timestamp_subsec_nanos() / 100
    )
}
