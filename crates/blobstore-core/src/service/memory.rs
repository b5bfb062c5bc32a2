//! In-memory service implementation.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::store::StoreState;
use super::BlobService;
use crate::blob::CopyProperties;
use crate::container::{ContainerAcl, ContainerItem, PublicAccessLevel, SignedIdentifier};
use crate::lease::LeaseDuration;
use crate::list::{BlobPage, ContainerPage, ListBlobsOptions, ListContainersOptions};
use crate::Result;

/// In-memory blob service.
///
/// Implements the full lease and listing semantics against process-local
/// state. This is the trivial mock used for unit testing; it does not
/// persist anything between runs.
#[derive(Default)]
pub struct MemoryService {
    state: RwLock<StoreState>,
}

impl MemoryService {
    /// Create a new, empty in-memory service.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobService for MemoryService {
    async fn create_container(
        &self,
        name: &str,
        metadata: Option<HashMap<String, String>>,
        public_access: Option<PublicAccessLevel>,
    ) -> Result<()> {
        self.state
            .write()
            .create_container(Utc::now(), name, metadata, public_access)
    }

    async fn delete_container(&self, name: &str, lease_id: Option<&str>) -> Result<()> {
        self.state.write().delete_container(Utc::now(), name, lease_id)
    }

    async fn get_container_properties(
        &self,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<ContainerItem> {
        self.state
            .read()
            .get_container_properties(Utc::now(), name, lease_id)
    }

    async fn get_container_metadata(
        &self,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<HashMap<String, String>> {
        self.state
            .read()
            .get_container_metadata(Utc::now(), name, lease_id)
    }

    async fn set_container_metadata(
        &self,
        name: &str,
        metadata: HashMap<String, String>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.state
            .write()
            .set_container_metadata(Utc::now(), name, metadata, lease_id)
    }

    async fn get_container_acl(&self, name: &str, lease_id: Option<&str>) -> Result<ContainerAcl> {
        self.state.read().get_container_acl(Utc::now(), name, lease_id)
    }

    async fn set_container_acl(
        &self,
        name: &str,
        identifiers: Vec<SignedIdentifier>,
        public_access: Option<PublicAccessLevel>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.state
            .write()
            .set_container_acl(Utc::now(), name, identifiers, public_access, lease_id)
    }

    async fn list_containers(&self, options: &ListContainersOptions) -> Result<ContainerPage> {
        self.state.read().list_containers(Utc::now(), options)
    }

    async fn acquire_container_lease(
        &self,
        name: &str,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String> {
        self.state
            .write()
            .acquire_container_lease(Utc::now(), name, duration, proposed_id)
    }

    async fn renew_container_lease(&self, name: &str, lease_id: &str) -> Result<String> {
        self.state
            .write()
            .renew_container_lease(Utc::now(), name, lease_id)
    }

    async fn change_container_lease(
        &self,
        name: &str,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String> {
        self.state
            .write()
            .change_container_lease(Utc::now(), name, lease_id, proposed_id)
    }

    async fn break_container_lease(&self, name: &str, period: Option<u32>) -> Result<u64> {
        self.state
            .write()
            .break_container_lease(Utc::now(), name, period)
    }

    async fn release_container_lease(&self, name: &str, lease_id: &str) -> Result<()> {
        self.state
            .write()
            .release_container_lease(Utc::now(), name, lease_id)
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
        self.state.write().put_blob(
            Utc::now(),
            container,
            name,
            &data,
            content_type,
            metadata,
            lease_id,
        )
    }

    async fn get_blob(
        &self,
        container: &str,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<Bytes> {
        self.state
            .read()
            .get_blob(Utc::now(), container, name, lease_id)
            .map(Bytes::from)
    }

    async fn delete_blob(
        &self,
        container: &str,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.state
            .write()
            .delete_blob(Utc::now(), container, name, lease_id)
    }

    async fn snapshot_blob(&self, container: &str, name: &str) -> Result<String> {
        self.state.write().snapshot_blob(Utc::now(), container, name)
    }

    async fn copy_blob(
        &self,
        container: &str,
        name: &str,
        source_url: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<CopyProperties> {
        self.state
            .write()
            .copy_blob(Utc::now(), container, name, source_url, metadata)
    }

    async fn stage_block(
        &self,
        container: &str,
        name: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<()> {
        self.state.write().stage_block(container, name, block_id, &data)
    }

    async fn commit_block_list(
        &self,
        container: &str,
        name: &str,
        block_ids: &[String],
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.state
            .write()
            .commit_block_list(Utc::now(), container, name, block_ids, lease_id)
    }

    async fn list_blobs(&self, container: &str, options: &ListBlobsOptions) -> Result<BlobPage> {
        self.state.read().list_blobs(Utc::now(), container, options)
    }

    async fn acquire_blob_lease(
        &self,
        container: &str,
        name: &str,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String> {
        self.state
            .write()
            .acquire_blob_lease(Utc::now(), container, name, duration, proposed_id)
    }

    async fn renew_blob_lease(
        &self,
        container: &str,
        name: &str,
        lease_id: &str,
    ) -> Result<String> {
        self.state
            .write()
            .renew_blob_lease(Utc::now(), container, name, lease_id)
    }

    async fn change_blob_lease(
        &self,
        container: &str,
        name: &str,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String> {
        self.state
            .write()
            .change_blob_lease(Utc::now(), container, name, lease_id, proposed_id)
    }

    async fn break_blob_lease(
        &self,
        container: &str,
        name: &str,
        period: Option<u32>,
    ) -> Result<u64> {
        self.state
            .write()
            .break_blob_lease(Utc::now(), container, name, period)
    }

    async fn release_blob_lease(&self, container: &str, name: &str, lease_id: &str) -> Result<()> {
        self.state
            .write()
            .release_blob_lease(Utc::now(), container, name, lease_id)
    }
}
