//! File-backed service implementation.
//!
//! Persists the account state as a JSON document so tooling keeps its
//! containers, blobs, and leases between invocations. Every operation
//! loads the state, applies the same semantics as the in-memory service,
//! and writes the result back under a process-wide lock.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::store::StoreState;
use super::BlobService;
use crate::blob::CopyProperties;
use crate::container::{ContainerAcl, ContainerItem, PublicAccessLevel, SignedIdentifier};
use crate::lease::LeaseDuration;
use crate::list::{BlobPage, ContainerPage, ListBlobsOptions, ListContainersOptions};
use crate::Result;

/// Blob service persisted to a JSON state file.
pub struct FileService {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileService {
    /// Create a service over the given state file. The file is created on
    /// the first mutating operation.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// The state file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreState> {
        match std::fs::read(&self.path) {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreState::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &StoreState) -> Result<()> {
        let data = serde_json::to_vec_pretty(state)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }

    /// Run a mutating operation against the persisted state.
    fn update<T>(&self, op: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock();
        let mut state = self.load()?;
        let out = op(&mut state)?;
        self.save(&state)?;
        Ok(out)
    }

    /// Run a read-only operation against the persisted state.
    fn view<T>(&self, op: impl FnOnce(&StoreState) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock();
        let state = self.load()?;
        op(&state)
    }
}

#[async_trait]
impl BlobService for FileService {
    async fn create_container(
        &self,
        name: &str,
        metadata: Option<HashMap<String, String>>,
        public_access: Option<PublicAccessLevel>,
    ) -> Result<()> {
        self.update(|s| s.create_container(Utc::now(), name, metadata, public_access))
    }

    async fn delete_container(&self, name: &str, lease_id: Option<&str>) -> Result<()> {
        self.update(|s| s.delete_container(Utc::now(), name, lease_id))
    }

    async fn get_container_properties(
        &self,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<ContainerItem> {
        self.view(|s| s.get_container_properties(Utc::now(), name, lease_id))
    }

    async fn get_container_metadata(
        &self,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<HashMap<String, String>> {
        self.view(|s| s.get_container_metadata(Utc::now(), name, lease_id))
    }

    async fn set_container_metadata(
        &self,
        name: &str,
        metadata: HashMap<String, String>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.update(|s| s.set_container_metadata(Utc::now(), name, metadata, lease_id))
    }

    async fn get_container_acl(&self, name: &str, lease_id: Option<&str>) -> Result<ContainerAcl> {
        self.view(|s| s.get_container_acl(Utc::now(), name, lease_id))
    }

    async fn set_container_acl(
        &self,
        name: &str,
        identifiers: Vec<SignedIdentifier>,
        public_access: Option<PublicAccessLevel>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.update(|s| s.set_container_acl(Utc::now(), name, identifiers, public_access, lease_id))
    }

    async fn list_containers(&self, options: &ListContainersOptions) -> Result<ContainerPage> {
        self.view(|s| s.list_containers(Utc::now(), options))
    }

    async fn acquire_container_lease(
        &self,
        name: &str,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String> {
        self.update(|s| s.acquire_container_lease(Utc::now(), name, duration, proposed_id))
    }

    async fn renew_container_lease(&self, name: &str, lease_id: &str) -> Result<String> {
        self.update(|s| s.renew_container_lease(Utc::now(), name, lease_id))
    }

    async fn change_container_lease(
        &self,
        name: &str,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String> {
        self.update(|s| s.change_container_lease(Utc::now(), name, lease_id, proposed_id))
    }

    async fn break_container_lease(&self, name: &str, period: Option<u32>) -> Result<u64> {
        self.update(|s| s.break_container_lease(Utc::now(), name, period))
    }

    async fn release_container_lease(&self, name: &str, lease_id: &str) -> Result<()> {
        self.update(|s| s.release_container_lease(Utc::now(), name, lease_id))
    }

    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: Option<&str>,
        metadata: Option<HashMap<String, String>>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.update(|s| {
            s.put_blob(
                Utc::now(),
                container,
                name,
                &data,
                content_type,
                metadata,
                lease_id,
            )
        })
    }

    async fn get_blob(
        &self,
        container: &str,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<Bytes> {
        self.view(|s| s.get_blob(Utc::now(), container, name, lease_id))
            .map(Bytes::from)
    }

    async fn delete_blob(
        &self,
        container: &str,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.update(|s| s.delete_blob(Utc::now(), container, name, lease_id))
    }

    async fn snapshot_blob(&self, container: &str, name: &str) -> Result<String> {
        self.update(|s| s.snapshot_blob(Utc::now(), container, name))
    }

    async fn copy_blob(
        &self,
        container: &str,
        name: &str,
        source_url: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<CopyProperties> {
        self.update(|s| s.copy_blob(Utc::now(), container, name, source_url, metadata))
    }

    async fn stage_block(
        &self,
        container: &str,
        name: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<()> {
        self.update(|s| s.stage_block(container, name, block_id, &data))
    }

    async fn commit_block_list(
        &self,
        container: &str,
        name: &str,
        block_ids: &[String],
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.update(|s| s.commit_block_list(Utc::now(), container, name, block_ids, lease_id))
    }

    async fn list_blobs(&self, container: &str, options: &ListBlobsOptions) -> Result<BlobPage> {
        self.view(|s| s.list_blobs(Utc::now(), container, options))
    }

    async fn acquire_blob_lease(
        &self,
        container: &str,
        name: &str,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String> {
        self.update(|s| s.acquire_blob_lease(Utc::now(), container, name, duration, proposed_id))
    }

    async fn renew_blob_lease(
        &self,
        container: &str,
        name: &str,
        lease_id: &str,
    ) -> Result<String> {
        self.update(|s| s.renew_blob_lease(Utc::now(), container, name, lease_id))
    }

    async fn change_blob_lease(
        &self,
        container: &str,
        name: &str,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String> {
        self.update(|s| s.change_blob_lease(Utc::now(), container, name, lease_id, proposed_id))
    }

    async fn break_blob_lease(
        &self,
        container: &str,
        name: &str,
        period: Option<u32>,
    ) -> Result<u64> {
        self.update(|s| s.break_blob_lease(Utc::now(), container, name, period))
    }

    async fn release_blob_lease(&self, container: &str, name: &str, lease_id: &str) -> Result<()> {
        self.update(|s| s.release_blob_lease(Utc::now(), container, name, lease_id))
    }
}
