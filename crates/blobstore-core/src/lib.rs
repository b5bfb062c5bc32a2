//! Blobstore Core Library
//!
//! This crate models the externally observable contract of a cloud
//! blob-storage service: container and blob lifecycle, the lease state
//! machine, and the listing contract, behind a swappable service trait
//! with in-memory and file-backed implementations for tests and tooling.

pub mod blob;
pub mod client;
pub mod config;
pub mod container;
pub mod error;
pub mod lease;
pub mod list;
pub mod service;

pub use blob::{BlobItem, BlobProperties, CopyProperties, CopyStatus};
pub use client::BlobClient;
pub use config::{ConnectionSettings, Credentials, StoreConfig};
pub use container::{
    validate_container_name, AccessPolicy, ContainerAcl, ContainerItem, ContainerProperties,
    PublicAccessLevel, SignedIdentifier, MAX_SIGNED_IDENTIFIERS,
};
pub use error::{Error, Result};
pub use lease::{
    LeaseDuration, LeaseRecord, LeaseState, LeaseStatus, MAX_LEASE_SECONDS, MIN_LEASE_SECONDS,
};
pub use list::{
    BlobEntry, BlobPage, ContainerPage, Include, ListBlobsOptions, ListContainersOptions,
};
pub use service::{create_service, BlobService, FileService, MemoryService};
