//! Client facade over a blob service.
//!
//! `BlobClient` owns the client side of the contract: it validates what
//! can be rejected without a network round trip, converts the
//! exists/create/delete fast paths into booleans, and follows listing
//! markers. Everything else passes straight through to the service; no
//! lease state is cached locally and no call is retried.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::blob::CopyProperties;
use crate::config::{ConnectionSettings, StoreConfig};
use crate::container::{
    check_signed_identifier_count, validate_container_name, ContainerAcl, ContainerItem,
    PublicAccessLevel, SignedIdentifier,
};
use crate::lease::LeaseDuration;
use crate::list::{BlobPage, ContainerPage, ListBlobsOptions, ListContainersOptions};
use crate::service::{create_service, BlobService};
use crate::Result;

/// Client for a blob-storage service.
pub struct BlobClient {
    service: Arc<dyn BlobService>,
    settings: ConnectionSettings,
}

impl BlobClient {
    pub fn new(service: Arc<dyn BlobService>, settings: ConnectionSettings) -> Self {
        Self { service, settings }
    }

    /// Build a client from a store configuration.
    pub fn from_config(config: &StoreConfig, settings: ConnectionSettings) -> Result<Self> {
        Ok(Self::new(create_service(config)?, settings))
    }

    /// The account-level connection settings this client was built with.
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Full URL of a blob in this account, usable as a copy source.
    pub fn blob_url(&self, container: &str, blob: &str) -> String {
        self.settings.blob_url(container, blob)
    }

    // -- containers ---------------------------------------------------------

    /// Create a container. Returns `true` when the container was created;
    /// with `fail_on_exist` unset, an existing container reads as `false`
    /// instead of an error.
    pub async fn create_container(
        &self,
        name: &str,
        metadata: Option<HashMap<String, String>>,
        public_access: Option<PublicAccessLevel>,
        fail_on_exist: bool,
    ) -> Result<bool> {
        validate_container_name(name)?;
        match self
            .service
            .create_container(name, metadata, public_access)
            .await
        {
            Ok(()) => Ok(true),
            Err(e) if e.is_conflict() && !fail_on_exist => {
                debug!(container = name, "container already exists");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the container exists. An absent container is reported as
    /// `false`, never as an error.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        match self.service.get_container_properties(name, None).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => {
                debug!(container = name, "container does not exist");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a container. Returns `true` when a container was deleted;
    /// with `fail_if_missing` unset, an absent container reads as `false`.
    pub async fn delete_container(
        &self,
        name: &str,
        lease_id: Option<&str>,
        fail_if_missing: bool,
    ) -> Result<bool> {
        match self.service.delete_container(name, lease_id).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() && !fail_if_missing => {
                debug!(container = name, "container was already absent");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_container_properties(
        &self,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<ContainerItem> {
        self.service.get_container_properties(name, lease_id).await
    }

    pub async fn get_container_metadata(
        &self,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<HashMap<String, String>> {
        self.service.get_container_metadata(name, lease_id).await
    }

    pub async fn set_container_metadata(
        &self,
        name: &str,
        metadata: HashMap<String, String>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.service
            .set_container_metadata(name, metadata, lease_id)
            .await
    }

    pub async fn get_container_acl(
        &self,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<ContainerAcl> {
        self.service.get_container_acl(name, lease_id).await
    }

    /// Replace the container ACL. Sets with more than the supported number
    /// of signed identifiers are rejected before any call leaves the
    /// process.
    pub async fn set_container_acl(
        &self,
        name: &str,
        identifiers: Vec<SignedIdentifier>,
        public_access: Option<PublicAccessLevel>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        check_signed_identifier_count(identifiers.len())?;
        self.service
            .set_container_acl(name, identifiers, public_access, lease_id)
            .await
    }

    /// One page of containers.
    pub async fn list_containers(
        &self,
        options: &ListContainersOptions,
    ) -> Result<ContainerPage> {
        self.service.list_containers(options).await
    }

    /// All containers under a prefix, following continuation markers.
    pub async fn list_all_containers(&self, prefix: Option<&str>) -> Result<Vec<ContainerItem>> {
        let mut items = Vec::new();
        let mut marker = None;
        loop {
            let page = self
                .service
                .list_containers(&ListContainersOptions {
                    prefix: prefix.map(str::to_owned),
                    marker,
                    ..Default::default()
                })
                .await?;
            items.extend(page.items);
            match page.next_marker {
                Some(next) => marker = Some(next),
                None => return Ok(items),
            }
        }
    }

    // -- container leases ---------------------------------------------------

    /// Acquire the container lease, returning the active lease id.
    pub async fn acquire_container_lease(
        &self,
        name: &str,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String> {
        self.service
            .acquire_container_lease(name, duration, proposed_id)
            .await
    }

    pub async fn renew_container_lease(&self, name: &str, lease_id: &str) -> Result<String> {
        self.service.renew_container_lease(name, lease_id).await
    }

    pub async fn change_container_lease(
        &self,
        name: &str,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String> {
        self.service
            .change_container_lease(name, lease_id, proposed_id)
            .await
    }

    pub async fn break_container_lease(&self, name: &str, period: Option<u32>) -> Result<u64> {
        self.service.break_container_lease(name, period).await
    }

    pub async fn release_container_lease(&self, name: &str, lease_id: &str) -> Result<()> {
        self.service.release_container_lease(name, lease_id).await
    }

    // -- blobs --------------------------------------------------------------

    pub async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: Option<&str>,
        metadata: Option<HashMap<String, String>>,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.service
            .put_blob(container, name, data, content_type, metadata, lease_id)
            .await
    }

    pub async fn get_blob(
        &self,
        container: &str,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<Bytes> {
        self.service.get_blob(container, name, lease_id).await
    }

    pub async fn delete_blob(
        &self,
        container: &str,
        name: &str,
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.service.delete_blob(container, name, lease_id).await
    }

    pub async fn snapshot_blob(&self, container: &str, name: &str) -> Result<String> {
        self.service.snapshot_blob(container, name).await
    }

    pub async fn copy_blob(
        &self,
        container: &str,
        name: &str,
        source_url: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<CopyProperties> {
        self.service
            .copy_blob(container, name, source_url, metadata)
            .await
    }

    pub async fn stage_block(
        &self,
        container: &str,
        name: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<()> {
        self.service.stage_block(container, name, block_id, data).await
    }

    pub async fn commit_block_list(
        &self,
        container: &str,
        name: &str,
        block_ids: &[String],
        lease_id: Option<&str>,
    ) -> Result<()> {
        self.service
            .commit_block_list(container, name, block_ids, lease_id)
            .await
    }

    /// One page of blobs.
    pub async fn list_blobs(
        &self,
        container: &str,
        options: &ListBlobsOptions,
    ) -> Result<BlobPage> {
        self.service.list_blobs(container, options).await
    }

    /// All blob names in a container, following continuation markers.
    pub async fn list_blob_names(&self, container: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut marker = None;
        loop {
            let page = self
                .service
                .list_blobs(
                    container,
                    &ListBlobsOptions {
                        marker,
                        ..Default::default()
                    },
                )
                .await?;
            names.extend(page.entries.iter().map(|e| e.name().to_owned()));
            match page.next_marker {
                Some(next) => marker = Some(next),
                None => return Ok(names),
            }
        }
    }

    // -- blob leases --------------------------------------------------------

    pub async fn acquire_blob_lease(
        &self,
        container: &str,
        name: &str,
        duration: LeaseDuration,
        proposed_id: Option<&str>,
    ) -> Result<String> {
        self.service
            .acquire_blob_lease(container, name, duration, proposed_id)
            .await
    }

    pub async fn renew_blob_lease(
        &self,
        container: &str,
        name: &str,
        lease_id: &str,
    ) -> Result<String> {
        self.service.renew_blob_lease(container, name, lease_id).await
    }

    pub async fn change_blob_lease(
        &self,
        container: &str,
        name: &str,
        lease_id: &str,
        proposed_id: &str,
    ) -> Result<String> {
        self.service
            .change_blob_lease(container, name, lease_id, proposed_id)
            .await
    }

    pub async fn break_blob_lease(
        &self,
        container: &str,
        name: &str,
        period: Option<u32>,
    ) -> Result<u64> {
        self.service.break_blob_lease(container, name, period).await
    }

    pub async fn release_blob_lease(
        &self,
        container: &str,
        name: &str,
        lease_id: &str,
    ) -> Result<()> {
        self.service
            .release_blob_lease(container, name, lease_id)
            .await
    }
}
