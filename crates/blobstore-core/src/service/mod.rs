//! Service abstraction and implementations.
//!
//! `BlobService` is the black-box collaborator the client talks to: one
//! method per remote endpoint, no retry or caching on this side of the
//! seam. Two implementations are provided:
//!
//! - **Memory**: the full lease/listing semantics in process (for tests)
//! - **File**: the same semantics persisted to a JSON state file (for
//!   tooling that needs state to survive between invocations)

mod file;
mod memory;
mod store;

pub use file::FileService;
pub use memory::MemoryService;

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;

use crate::blob::CopyProperties;
use crate::config::StoreConfig;
use crate::container::{ContainerAcl, ContainerItem, PublicAccessLevel, SignedIdentifier};
use crate::lease::LeaseDuration;
use crate::list::{BlobPage, ContainerPage, ListBlobsOptions, ListContainersOptions};
use crate::Result;

/// The remote blob service surface.
#[async_trait]
pub trait BlobService: Send + Sync {
    // -- container lifecycle --

    /// Create a container. Fails with `Conflict` when it already exists.
    async fn create_container(
        &self,
        name: &str,
        metadata: Option<HashMap<String, String>>,
        public_access: Option<PublicAccessLevel>,
    ) -> Result<()>;

    /// Delete a container, presenting the lease id when it is leased.
    async fn delete_container(&self, name: &str, lease_id: Option<&str>) -> Result<()>;

    /// Fetch properties and metadata for a container.
    async fn get_container_properties(
        &self,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<ContainerItem>;

    async fn get_container_metadata(
        &self,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<HashMap<String, String>>;

    async fn set_container_metadata(
        &self,
        name: &str,
        metadata: HashMap<String, String>,
        lease_id: Option<&str>,
    ) -> Result<()>;

    async fn get_container_acl(&self, name: &str, lease_id: Option<&str>) -> Result<ContainerAcl>;

    async fn set_container_acl(
        &self,
        name: &str,
        identifiers: Vec<SignedIdentifier>,
        public_access: Option<PublicAccessLevel>,
        lease_id: Option<&str>,
    ) -> Result<()>;

    async fn list_containers(&self, options: &ListContainersOptions) -> Result<ContainerPage>;

    // -- container leases --

    /// Acquire the container lease, returning the active lease id.
    async fn acquire_container_lease(
        &self,
        name: &str,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String>;

    async fn renew_container_lease(&self, name: &str, lease_id: &str) -> Result<String>;

    async fn change_container_lease(
        &self,
        name: &str,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String>;

    /// Break the container lease, returning the seconds until broken.
    async fn break_container_lease(&self, name: &str, period: Option<u32>) -> Result<u64>;

    async fn release_container_lease(&self, name: &str, lease_id: &str) -> Result<()>;

    // -- blobs --

    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: Option<&str>,
        metadata: Option<HashMap<String, String>>,
        lease_id: Option<&str>,
    ) -> Result<()>;

    async fn get_blob(&self, container: &str, name: &str, lease_id: Option<&str>)
        -> Result<Bytes>;

    async fn delete_blob(&self, container: &str, name: &str, lease_id: Option<&str>)
        -> Result<()>;

    /// Take a point-in-time snapshot, returning the snapshot id.
    async fn snapshot_blob(&self, container: &str, name: &str) -> Result<String>;

    /// Copy a blob from a source URL within the account.
    async fn copy_blob(
        &self,
        container: &str,
        name: &str,
        source_url: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<CopyProperties>;

    /// Stage a block for later commitment.
    async fn stage_block(
        &self,
        container: &str,
        name: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<()>;

    /// Commit staged blocks, in order, as the blob's content.
    async fn commit_block_list(
        &self,
        container: &str,
        name: &str,
        block_ids: &[String],
        lease_id: Option<&str>,
    ) -> Result<()>;

    async fn list_blobs(&self, container: &str, options: &ListBlobsOptions) -> Result<BlobPage>;

    // -- blob leases --

    async fn acquire_blob_lease(
        &self,
        container: &str,
        name: &str,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String>;

    async fn renew_blob_lease(&self, container: &str, name: &str, lease_id: &str)
        -> Result<String>;

    async fn change_blob_lease(
        &self,
        container: &str,
        name: &str,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String>;

    async fn break_blob_lease(
        &self,
        container: &str,
        name: &str,
        period: Option<u32>,
    ) -> Result<u64>;

    async fn release_blob_lease(&self, container: &str, name: &str, lease_id: &str) -> Result<()>;
}

/// Create a service from configuration.
pub fn create_service(config: &StoreConfig) -> Result<Arc<dyn BlobService>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryService::new())),
        StoreConfig::File { path } => Ok(Arc::new(FileService::new(path.clone()))),
    }
}
