//! Pure semantic core shared by the service implementations.
//!
//! `StoreState` holds one account's containers and blobs and implements
//! every operation synchronously against an explicit `now`, so the lease
//! and listing contracts are testable without a runtime or sleeps. The
//! async services are thin shells around this type.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use uuid::Uuid;

use crate::blob::{snapshot_id, BlobItem, BlobProperties, CopyProperties, CopyStatus};
use crate::container::{
    check_signed_identifier_count, validate_container_name, ContainerAcl, ContainerItem,
    ContainerProperties, PublicAccessLevel, SignedIdentifier,
};
use crate::lease::{LeaseDuration, LeaseRecord, LeaseState, LeaseStatus};
use crate::list::{
    delimiter_prefix, BlobEntry, BlobPage, ContainerPage, EntryKey, ListBlobsOptions,
    ListContainersOptions,
};
use crate::{Error, Result};

fn fresh_etag() -> String {
    format!("\"0x{}\"", Uuid::new_v4().simple())
}

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotState {
    id: String,
    content: Vec<u8>,
    content_type: Option<String>,
    metadata: HashMap<String, String>,
    etag: String,
    created_on: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobState {
    content: Vec<u8>,
    content_type: Option<String>,
    metadata: HashMap<String, String>,
    lease: LeaseRecord,
    etag: String,
    created_on: DateTime<Utc>,
    last_modified: DateTime<Utc>,
    copy: Option<CopyProperties>,
    /// Snapshots ordered oldest first.
    snapshots: Vec<SnapshotState>,
}

impl BlobState {
    fn new(now: DateTime<Utc>) -> Self {
        BlobState {
            content: Vec::new(),
            content_type: None,
            metadata: HashMap::new(),
            lease: LeaseRecord::default(),
            etag: fresh_etag(),
            created_on: now,
            last_modified: now,
            copy: None,
            snapshots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StagedBlock {
    id: String,
    data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContainerState {
    metadata: HashMap<String, String>,
    acl: ContainerAcl,
    lease: LeaseRecord,
    etag: String,
    last_modified: DateTime<Utc>,
    blobs: BTreeMap<String, BlobState>,
    /// Blocks staged but not yet committed, keyed by blob name.
    uncommitted: BTreeMap<String, Vec<StagedBlock>>,
}

impl ContainerState {
    fn new(now: DateTime<Utc>) -> Self {
        ContainerState {
            metadata: HashMap::new(),
            acl: ContainerAcl::default(),
            lease: LeaseRecord::default(),
            etag: fresh_etag(),
            last_modified: now,
            blobs: BTreeMap::new(),
            uncommitted: BTreeMap::new(),
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.etag = fresh_etag();
        self.last_modified = now;
    }

    fn blob(&self, name: &str) -> Result<&BlobState> {
        self.blobs
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("blob {:?}", name)))
    }

    fn blob_mut(&mut self, name: &str) -> Result<&mut BlobState> {
        self.blobs
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("blob {:?}", name)))
    }

    fn properties(&self, now: DateTime<Utc>) -> ContainerProperties {
        ContainerProperties {
            etag: self.etag.clone(),
            last_modified: self.last_modified,
            lease_state: self.lease.state(now),
            lease_status: self.lease.status(now),
            lease_duration: self.lease.duration(now),
            public_access: self.acl.public_access,
        }
    }

    fn item(&self, name: &str, now: DateTime<Utc>, with_metadata: bool) -> ContainerItem {
        ContainerItem {
            name: name.to_owned(),
            properties: self.properties(now),
            metadata: with_metadata.then(|| self.metadata.clone()),
        }
    }
}

/// Full account state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    containers: BTreeMap<String, ContainerState>,
}

impl StoreState {
    fn container(&self, name: &str) -> Result<&ContainerState> {
        self.containers
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("container {:?}", name)))
    }

    fn container_mut(&mut self, name: &str) -> Result<&mut ContainerState> {
        self.containers
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("container {:?}", name)))
    }

    // -- container lifecycle ------------------------------------------------

    pub fn create_container(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        metadata: Option<HashMap<String, String>>,
        public_access: Option<PublicAccessLevel>,
    ) -> Result<()> {
        validate_container_name(name)?;
        if self.containers.contains_key(name) {
            return Err(Error::Conflict(format!(
                "container {:?} already exists",
                name
            )));
        }
        let mut container = ContainerState::new(now);
        if let Some(metadata) = metadata {
            container.metadata = metadata;
        }
        if let Some(level) = public_access {
            container.acl.public_access = level;
        }
        self.containers.insert(name.to_owned(), container);
        debug!(container = name, "container created");
        Ok(())
    }

    pub fn delete_container(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.container(name)?.lease.check_write(now, lease_id)?;
        self.containers.remove(name);
        debug!(container = name, "container deleted");
        Ok(())
    }

    pub fn get_container_properties(
        &self,
        now: DateTime<Utc>,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<ContainerItem> {
        let container = self.container(name)?;
        container.lease.check_read(now, lease_id)?;
        Ok(container.item(name, now, true))
    }

    pub fn get_container_metadata(
        &self,
        now: DateTime<Utc>,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<HashMap<String, String>> {
        let container = self.container(name)?;
        container.lease.check_read(now, lease_id)?;
        Ok(container.metadata.clone())
    }

    pub fn set_container_metadata(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        metadata: HashMap<String, String>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        let container = self.container_mut(name)?;
        container.lease.check_write(now, lease_id)?;
        container.metadata = metadata;
        container.touch(now);
        Ok(())
    }

    pub fn get_container_acl(
        &self,
        now: DateTime<Utc>,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<ContainerAcl> {
        let container = self.container(name)?;
        container.lease.check_read(now, lease_id)?;
        Ok(container.acl.clone())
    }

    /// Replaces the stored access policies and the public access level.
    /// Omitting `public_access` resets the container to private.
    pub fn set_container_acl(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        identifiers: Vec<SignedIdentifier>,
        public_access: Option<PublicAccessLevel>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        check_signed_identifier_count(identifiers.len())?;
        let container = self.container_mut(name)?;
        container.lease.check_write(now, lease_id)?;
        container.acl.signed_identifiers = identifiers;
        container.acl.public_access = public_access.unwrap_or_default();
        container.touch(now);
        Ok(())
    }

    pub fn list_containers(
        &self,
        now: DateTime<Utc>,
        options: &ListContainersOptions,
    ) -> Result<ContainerPage> {
        let prefix = options.prefix.as_deref().unwrap_or("");
        let mut items = Vec::new();
        let mut next_marker = None;
        for (name, container) in &self.containers {
            if !name.starts_with(prefix) {
                continue;
            }
            if let Some(marker) = options.marker.as_deref() {
                if name.as_str() < marker {
                    continue;
                }
            }
            if let Some(limit) = options.num_results {
                if items.len() == limit {
                    next_marker = Some(name.clone());
                    break;
                }
            }
            items.push(container.item(name, now, options.include_metadata));
        }
        Ok(ContainerPage { items, next_marker })
    }

    // -- container leases ---------------------------------------------------

    pub fn acquire_container_lease(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String> {
        self.container_mut(name)?.lease.acquire(now, duration, proposed_id)
    }

    pub fn renew_container_lease(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        lease_id: &str,
    ) -> Result<String> {
        self.container_mut(name)?.lease.renew(now, lease_id)
    }

    pub fn change_container_lease(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String> {
        self.container_mut(name)?.lease.change(now, lease_id, proposed_id)
    }

    pub fn break_container_lease(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        period: Option<u32>,
    ) -> Result<u64> {
        self.container_mut(name)?.lease.break_lease(now, period)
    }

    pub fn release_container_lease(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        lease_id: &str,
    ) -> Result<()> {
        self.container_mut(name)?.lease.release(now, lease_id)
    }

    // -- blobs --------------------------------------------------------------

    pub fn put_blob(
        &mut self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
        data: &[u8],
        content_type: Option<&str>,
        metadata: Option<HashMap<String, String>>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        let container = self.container_mut(container)?;
        match container.blobs.get(name) {
            Some(existing) => existing.lease.check_write(now, lease_id)?,
            None if lease_id.is_some() => {
                return Err(Error::Conflict(
                    "a lease id was presented but no lease is active".to_string(),
                ))
            }
            None => {}
        }
        // Overwriting keeps the lease and snapshots; content, metadata, and
        // copy status are replaced.
        let blob = container
            .blobs
            .entry(name.to_owned())
            .or_insert_with(|| BlobState::new(now));
        blob.content = data.to_vec();
        blob.content_type = Some(content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_owned());
        blob.metadata = metadata.unwrap_or_default();
        blob.copy = None;
        blob.etag = fresh_etag();
        blob.last_modified = now;
        debug!(blob = name, bytes = data.len(), "blob written");
        Ok(())
    }

    pub fn get_blob(
        &self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<Vec<u8>> {
        let blob = self.container(container)?.blob(name)?;
        blob.lease.check_read(now, lease_id)?;
        Ok(blob.content.clone())
    }

    pub fn delete_blob(
        &mut self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<()> {
        let container = self.container_mut(container)?;
        container.blob(name)?.lease.check_write(now, lease_id)?;
        container.blobs.remove(name);
        debug!(blob = name, "blob deleted");
        Ok(())
    }

    /// Takes a point-in-time snapshot, returning the new snapshot id.
    pub fn snapshot_blob(
        &mut self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
    ) -> Result<String> {
        let blob = self.container_mut(container)?.blob_mut(name)?;
        let mut at = now;
        let mut id = snapshot_id(at);
        while blob.snapshots.iter().any(|s| s.id == id) {
            at += Duration::nanoseconds(100);
            id = snapshot_id(at);
        }
        blob.snapshots.push(SnapshotState {
            id: id.clone(),
            content: blob.content.clone(),
            content_type: blob.content_type.clone(),
            metadata: blob.metadata.clone(),
            etag: blob.etag.clone(),
            created_on: blob.created_on,
            last_modified: blob.last_modified,
        });
        debug!(blob = name, snapshot = %id, "snapshot taken");
        Ok(id)
    }

    /// Copies a blob from a source URL within this account. The mock copy
    /// completes synchronously with `Success` status and full progress.
    pub fn copy_blob(
        &mut self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
        source_url: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<CopyProperties> {
        let (source_container, source_blob) = parse_blob_url(source_url)?;
        let source = self.container(&source_container)?.blob(&source_blob)?.clone();
        let container = self.container_mut(container)?;
        if let Some(existing) = container.blobs.get(name) {
            existing.lease.check_write(now, None)?;
        }
        let copy = CopyProperties {
            id: Uuid::new_v4().to_string(),
            source: source_url.to_owned(),
            status: CopyStatus::Success,
            progress: format!("{}/{}", source.content.len(), source.content.len()),
            completion_time: Some(now),
        };
        let blob = container
            .blobs
            .entry(name.to_owned())
            .or_insert_with(|| BlobState::new(now));
        blob.content = source.content;
        blob.content_type = source.content_type;
        blob.metadata = metadata.unwrap_or(source.metadata);
        blob.copy = Some(copy.clone());
        blob.etag = fresh_etag();
        blob.last_modified = now;
        debug!(blob = name, source = source_url, "blob copied");
        Ok(copy)
    }

    /// Stages a block for a blob without committing it.
    pub fn stage_block(
        &mut self,
        container: &str,
        name: &str,
        block_id: &str,
        data: &[u8],
    ) -> Result<()> {
        let container = self.container_mut(container)?;
        let blocks = container.uncommitted.entry(name.to_owned()).or_default();
        match blocks.iter_mut().find(|b| b.id == block_id) {
            Some(existing) => existing.data = data.to_vec(),
            None => blocks.push(StagedBlock {
                id: block_id.to_owned(),
                data: data.to_vec(),
            }),
        }
        Ok(())
    }

    /// Commits staged blocks, in the given order, as the blob's content.
    pub fn commit_block_list(
        &mut self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
        block_ids: &[String],
        lease_id: Option<&str>,
    ) -> Result<()> {
        let container = self.container_mut(container)?;
        let staged = container.uncommitted.get(name);
        let mut content = Vec::new();
        for id in block_ids {
            let block = staged
                .and_then(|blocks| blocks.iter().find(|b| &b.id == id))
                .ok_or_else(|| Error::Validation(format!("unknown block id {:?}", id)))?;
            content.extend_from_slice(&block.data);
        }
        match container.blobs.get(name) {
            Some(existing) => existing.lease.check_write(now, lease_id)?,
            None if lease_id.is_some() => {
                return Err(Error::Conflict(
                    "a lease id was presented but no lease is active".to_string(),
                ))
            }
            None => {}
        }
        container.uncommitted.remove(name);
        let blob = container
            .blobs
            .entry(name.to_owned())
            .or_insert_with(|| BlobState::new(now));
        blob.content = content;
        blob.content_type = Some(DEFAULT_CONTENT_TYPE.to_owned());
        blob.etag = fresh_etag();
        blob.last_modified = now;
        debug!(blob = name, blocks = block_ids.len(), "block list committed");
        Ok(())
    }

    // -- blob leases --------------------------------------------------------

    pub fn acquire_blob_lease(
        &mut self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String> {
        self.container_mut(container)?
            .blob_mut(name)?
            .lease
            .acquire(now, duration, proposed_id)
    }

    pub fn renew_blob_lease(
        &mut self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
        lease_id: &str,
    ) -> Result<String> {
        self.container_mut(container)?
            .blob_mut(name)?
            .lease
            .renew(now, lease_id)
    }

    pub fn change_blob_lease(
        &mut self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String> {
        self.container_mut(container)?
            .blob_mut(name)?
            .lease
            .change(now, lease_id, proposed_id)
    }

    pub fn break_blob_lease(
        &mut self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
        period: Option<u32>,
    ) -> Result<u64> {
        self.container_mut(container)?
            .blob_mut(name)?
            .lease
            .break_lease(now, period)
    }

    pub fn release_blob_lease(
        &mut self,
        now: DateTime<Utc>,
        container: &str,
        name: &str,
        lease_id: &str,
    ) -> Result<()> {
        self.container_mut(container)?
            .blob_mut(name)?
            .lease
            .release(now, lease_id)
    }

    // -- blob listing -------------------------------------------------------

    pub fn list_blobs(
        &self,
        now: DateTime<Utc>,
        container: &str,
        options: &ListBlobsOptions,
    ) -> Result<BlobPage> {
        let container = self.container(container)?;
        let prefix = options.prefix.as_deref().unwrap_or("");
        let include = options.include;

        // Raw, name-ordered entries before delimiter collapsing. Snapshots
        // of a name precede its live entry, oldest first.
        let mut raw: Vec<(EntryKey, BlobEntry)> = Vec::new();
        for (name, blob) in &container.blobs {
            if !name.starts_with(prefix) {
                continue;
            }
            if include.snapshots {
                for snap in &blob.snapshots {
                    raw.push((
                        EntryKey::snapshot(name, &snap.id),
                        BlobEntry::Blob(snapshot_item(name, snap, include)),
                    ));
                }
            }
            raw.push((EntryKey::live(name), BlobEntry::Blob(blob_item(name, blob, now, include))));
        }
        if include.uncommitted_blobs {
            for (name, blocks) in &container.uncommitted {
                if !name.starts_with(prefix) || container.blobs.contains_key(name) {
                    continue;
                }
                raw.push((
                    EntryKey::live(name),
                    BlobEntry::Blob(uncommitted_item(name, blocks, now)),
                ));
            }
            raw.sort_by(|a, b| a.0.cmp(&b.0));
        }

        // Delimiter collapsing: adjacent names sharing a prefix up to the
        // first delimiter become one synthetic directory entry.
        let entries = match options.delimiter.as_deref() {
            Some(delimiter) if !delimiter.is_empty() => {
                let mut collapsed: Vec<(EntryKey, BlobEntry)> = Vec::new();
                let mut last_prefix: Option<String> = None;
                for (key, entry) in raw {
                    match delimiter_prefix(&key.name, prefix, delimiter) {
                        Some(dir) => {
                            if last_prefix.as_deref() != Some(dir.as_str()) {
                                collapsed.push((EntryKey::live(&dir), BlobEntry::Prefix(dir.clone())));
                                last_prefix = Some(dir);
                            }
                        }
                        None => collapsed.push((key, entry)),
                    }
                }
                collapsed
            }
            _ => raw,
        };

        let marker_key = options.marker.as_deref().map(EntryKey::decode);
        let mut page = Vec::new();
        let mut next_marker = None;
        for (key, entry) in entries {
            if let Some(marker) = &marker_key {
                if key < *marker {
                    continue;
                }
            }
            if let Some(limit) = options.num_results {
                if page.len() == limit {
                    next_marker = Some(key.encode());
                    break;
                }
            }
            page.push(entry);
        }
        Ok(BlobPage {
            entries: page,
            next_marker,
        })
    }
}

fn blob_item(name: &str, blob: &BlobState, now: DateTime<Utc>, include: crate::list::Include) -> BlobItem {
    BlobItem {
        name: name.to_owned(),
        snapshot: None,
        properties: BlobProperties {
            content_length: blob.content.len() as u64,
            content_type: blob.content_type.clone(),
            etag: blob.etag.clone(),
            created_on: blob.created_on,
            last_modified: blob.last_modified,
            lease_state: blob.lease.state(now),
            lease_status: blob.lease.status(now),
            lease_duration: blob.lease.duration(now),
            copy: if include.copy { blob.copy.clone() } else { None },
        },
        metadata: include.metadata.then(|| blob.metadata.clone()),
    }
}

fn snapshot_item(name: &str, snap: &SnapshotState, include: crate::list::Include) -> BlobItem {
    BlobItem {
        name: name.to_owned(),
        snapshot: Some(snap.id.clone()),
        properties: BlobProperties {
            content_length: snap.content.len() as u64,
            content_type: snap.content_type.clone(),
            etag: snap.etag.clone(),
            created_on: snap.created_on,
            last_modified: snap.last_modified,
            // Snapshots are read-only and never leased.
            lease_state: LeaseState::Available,
            lease_status: LeaseStatus::Unlocked,
            lease_duration: None,
            copy: None,
        },
        metadata: include.metadata.then(|| snap.metadata.clone()),
    }
}

fn uncommitted_item(name: &str, blocks: &[StagedBlock], now: DateTime<Utc>) -> BlobItem {
    BlobItem {
        name: name.to_owned(),
        snapshot: None,
        properties: BlobProperties {
            content_length: blocks.iter().map(|b| b.data.len() as u64).sum(),
            content_type: None,
            etag: String::new(),
            created_on: now,
            last_modified: now,
            lease_state: LeaseState::Available,
            lease_status: LeaseStatus::Unlocked,
            lease_duration: None,
            copy: None,
        },
        metadata: None,
    }
}

/// Splits a blob URL into its container and blob name components.
fn parse_blob_url(source: &str) -> Result<(String, String)> {
    let parsed = url::Url::parse(source)
        .map_err(|e| Error::Validation(format!("invalid copy source URL {:?}: {}", source, e)))?;
    let mut segments = parsed
        .path_segments()
        .ok_or_else(|| Error::Validation(format!("copy source URL has no path: {:?}", source)))?;
    let container = segments
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Validation(format!("copy source URL has no container: {:?}", source)))?
        .to_owned();
    let blob = segments.collect::<Vec<_>>().join("/");
    if blob.is_empty() {
        return Err(Error::Validation(format!(
            "copy source URL has no blob name: {:?}",
            source
        )));
    }
    Ok((container, blob))
}
