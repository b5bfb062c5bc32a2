//! Container data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::lease::{LeaseDuration, LeaseState, LeaseStatus};
use crate::{Error, Result};

/// Maximum number of signed identifiers the service accepts in one ACL set.
pub const MAX_SIGNED_IDENTIFIERS: usize = 5;

/// Public access level for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublicAccessLevel {
    #[default]
    None,
    Blob,
    Container,
}

impl PublicAccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicAccessLevel::None => "",
            PublicAccessLevel::Blob => "blob",
            PublicAccessLevel::Container => "container",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "" | "none" | "private" => Some(PublicAccessLevel::None),
            "blob" => Some(PublicAccessLevel::Blob),
            "container" => Some(PublicAccessLevel::Container),
            _ => None,
        }
    }
}

/// Validates a container name against the service naming rules: 3-63
/// characters of lowercase alphanumerics and hyphens, starting and ending
/// with an alphanumeric.
pub fn validate_container_name(name: &str) -> Result<()> {
    let bytes = name.as_bytes();
    if !(3..=63).contains(&bytes.len()) {
        return Err(Error::Validation(format!(
            "container name must be 3-63 characters long: {:?}",
            name
        )));
    }
    if !bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
    {
        return Err(Error::Validation(format!(
            "container name must be lowercase alphanumeric or hyphen: {:?}",
            name
        )));
    }
    let first = bytes[0];
    let last = bytes[bytes.len() - 1];
    if first == b'-' || last == b'-' {
        return Err(Error::Validation(format!(
            "container name must start and end with a letter or digit: {:?}",
            name
        )));
    }
    Ok(())
}

/// Rejects ACL sets that exceed the service's signed-identifier cap. The
/// message mirrors the service's own wording; the client applies this check
/// before any call leaves the process.
pub(crate) fn check_signed_identifier_count(count: usize) -> Result<()> {
    if count > MAX_SIGNED_IDENTIFIERS {
        return Err(Error::Conflict(format!(
            "Too many access policies provided. The server does not support setting \
             more than {} access policies on a single resource.",
            MAX_SIGNED_IDENTIFIERS
        )));
    }
    Ok(())
}

/// Access policy attached to a signed identifier. All fields are optional;
/// an empty policy is a valid (if useless) placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub start: Option<DateTime<Utc>>,
    pub expiry: Option<DateTime<Utc>>,
    pub permission: Option<String>,
}

/// A named, time-bounded access policy on a container ACL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedIdentifier {
    pub id: String,
    pub access_policy: AccessPolicy,
}

/// Container ACL: the stored access policies plus the public access level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerAcl {
    pub public_access: PublicAccessLevel,
    pub signed_identifiers: Vec<SignedIdentifier>,
}

/// Container properties as reported by properties and listing calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerProperties {
    pub etag: String,
    pub last_modified: DateTime<Utc>,
    pub lease_state: LeaseState,
    pub lease_status: LeaseStatus,
    pub lease_duration: Option<LeaseDuration>,
    pub public_access: PublicAccessLevel,
}

/// A container descriptor returned by properties and listing calls.
///
/// `metadata` is `Some` only when the call asked for it (properties always
/// do; listings only with `include_metadata`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerItem {
    pub name: String,
    pub properties: ContainerProperties,
    pub metadata: Option<HashMap<String, String>>,
}
