//! Configuration, connection settings, and credentials.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Error, Result};

/// Store backend selection using a tagged enum for type-safe configuration.
///
/// Supported backends:
/// - In-memory (for testing)
/// - JSON state file (for tooling that needs state between invocations)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "store")]
pub enum StoreConfig {
    /// In-memory store (for testing)
    #[serde(rename = "memory")]
    Memory,

    /// JSON state file on the local filesystem
    #[serde(rename = "file")]
    File {
        /// Path to the state file
        path: PathBuf,
    },
}

impl StoreConfig {
    /// Parse configuration from a URL string
    ///
    /// Supported URL formats:
    /// - `memory://`
    /// - `file:///path/to/state.json`
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::Config(format!("Invalid store URL: {}", e)))?;

        match parsed.scheme() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File {
                path: PathBuf::from(parsed.path()),
            }),
            scheme => Err(Error::Config(format!("Unknown store scheme: {}", scheme))),
        }
    }
}

fn default_protocol() -> String {
    "https".to_string()
}

fn default_endpoint_suffix() -> String {
    "blob.core.windows.net".to_string()
}

/// Account-level connection settings used to form resource URLs.
///
/// Transport and authentication live outside this crate; the settings
/// exist so copy sources and tooling output can name resources the way
/// the remote service does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Storage account name
    pub account_name: String,

    /// `https` or `http`
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Host suffix appended after the account name
    #[serde(default = "default_endpoint_suffix")]
    pub endpoint_suffix: String,
}

impl ConnectionSettings {
    pub fn new(account_name: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            protocol: default_protocol(),
            endpoint_suffix: default_endpoint_suffix(),
        }
    }

    /// Base endpoint for the account.
    pub fn endpoint(&self) -> String {
        format!(
            "{}://{}.{}",
            self.protocol, self.account_name, self.endpoint_suffix
        )
    }

    /// Full URL of a blob, usable as a copy source.
    pub fn blob_url(&self, container: &str, blob: &str) -> String {
        format!("{}/{}/{}", self.endpoint(), container, blob)
    }
}

/// Shared-key credentials.
///
/// Token acquisition and request signing are out of scope here; the type
/// carries account material for the transport that does the signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub account_name: String,
    pub account_key: String,
}

impl Credentials {
    pub fn new(account_name: impl Into<String>, account_key: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            account_key: account_key.into(),
        }
    }

    /// The well-known development-storage account, accepted by local
    /// emulators. The key is public fixture material, not a secret.
    pub fn development() -> Self {
        Self::new(
            "devstoreaccount1",
            "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==",
        )
    }
}
