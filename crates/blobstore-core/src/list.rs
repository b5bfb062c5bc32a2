//! Listing options, result pages, and continuation markers.

use serde::{Deserialize, Serialize};

use crate::blob::BlobItem;
use crate::container::ContainerItem;

/// Independent inclusion toggles for blob listing. Each flag adds entries
/// or populates fields without affecting the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    /// Add one entry per snapshot, oldest first, before the live blob.
    pub snapshots: bool,
    /// Populate each entry's metadata map.
    pub metadata: bool,
    /// Add names that exist only as staged, uncommitted blocks.
    pub uncommitted_blobs: bool,
    /// Populate copy properties on entries created by a copy.
    pub copy: bool,
}

/// Options for a container listing call.
#[derive(Debug, Clone, Default)]
pub struct ListContainersOptions {
    /// Only names starting with this prefix.
    pub prefix: Option<String>,
    /// Continuation marker from a previous page.
    pub marker: Option<String>,
    /// Page size bound.
    pub num_results: Option<usize>,
    /// Populate metadata on each item; otherwise it is absent.
    pub include_metadata: bool,
}

/// Options for a blob listing call.
#[derive(Debug, Clone, Default)]
pub struct ListBlobsOptions {
    pub prefix: Option<String>,
    /// Collapse names sharing a prefix up to the first occurrence of this
    /// delimiter into a single synthetic directory entry.
    pub delimiter: Option<String>,
    pub marker: Option<String>,
    pub num_results: Option<usize>,
    pub include: Include,
}

/// One page of a container listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerPage {
    pub items: Vec<ContainerItem>,
    /// `None` once the listing is exhausted.
    pub next_marker: Option<String>,
}

/// An entry in a blob listing: a blob (or snapshot) or a collapsed
/// delimiter prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlobEntry {
    Blob(BlobItem),
    Prefix(String),
}

impl BlobEntry {
    pub fn name(&self) -> &str {
        match self {
            BlobEntry::Blob(item) => &item.name,
            BlobEntry::Prefix(prefix) => prefix,
        }
    }

    /// The blob item, when the entry is not a collapsed prefix.
    pub fn as_blob(&self) -> Option<&BlobItem> {
        match self {
            BlobEntry::Blob(item) => Some(item),
            BlobEntry::Prefix(_) => None,
        }
    }
}

/// One page of a blob listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobPage {
    pub entries: Vec<BlobEntry>,
    /// `None` once the listing is exhausted.
    pub next_marker: Option<String>,
}

/// Ordering key of a blob listing entry. Snapshots of a name sort before
/// the live blob of the same name, oldest first; collapsed prefixes use
/// their synthetic name with no snapshot component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct EntryKey {
    pub name: String,
    /// `false` for snapshot entries, which sort before the live entry.
    pub live: bool,
    pub snapshot: String,
}

impl EntryKey {
    pub fn live(name: &str) -> Self {
        EntryKey {
            name: name.to_owned(),
            live: true,
            snapshot: String::new(),
        }
    }

    pub fn snapshot(name: &str, snapshot: &str) -> Self {
        EntryKey {
            name: name.to_owned(),
            live: false,
            snapshot: snapshot.to_owned(),
        }
    }

    /// Encodes the key as an opaque marker string.
    pub fn encode(&self) -> String {
        if self.live {
            self.name.clone()
        } else {
            format!("{}\u{1}{}", self.name, self.snapshot)
        }
    }

    /// Decodes a marker produced by `encode`.
    pub fn decode(marker: &str) -> Self {
        match marker.split_once('\u{1}') {
            Some((name, snapshot)) => EntryKey::snapshot(name, snapshot),
            None => EntryKey::live(marker),
        }
    }
}

/// Returns the collapsed directory entry name for `name` under `prefix`,
/// or `None` when the name has no delimiter past the prefix.
pub(crate) fn delimiter_prefix(name: &str, prefix: &str, delimiter: &str) -> Option<String> {
    let rest = name.strip_prefix(prefix)?;
    rest.find(delimiter)
        .map(|at| format!("{}{}{}", prefix, &rest[..at], delimiter))
}
