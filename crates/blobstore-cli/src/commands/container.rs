use anyhow::Result;
use blobstore_core::{
    BlobClient, ListContainersOptions, PublicAccessLevel, SignedIdentifier,
};
use clap::Subcommand;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

use super::parse_key_val;

#[derive(Subcommand)]
pub enum ContainerCommand {
    /// Create a container
    Create {
        /// Container name (lowercase alphanumerics and hyphens)
        name: String,

        /// Public access level (none, blob, container)
        #[arg(long)]
        public_access: Option<String>,

        /// Metadata entries as key=value
        #[arg(long = "meta", value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,

        /// Fail when the container already exists
        #[arg(long)]
        fail_on_exist: bool,
    },

    /// Delete a container
    Delete {
        name: String,

        /// Lease id, required while the container is leased
        #[arg(long)]
        lease_id: Option<String>,
    },

    /// List containers
    List {
        /// Only names starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Page size bound
        #[arg(long)]
        num_results: Option<usize>,

        /// Continuation marker from a previous page
        #[arg(long)]
        marker: Option<String>,

        /// Populate metadata on each entry
        #[arg(long)]
        include_metadata: bool,
    },

    /// Show container properties and metadata
    Show { name: String },

    /// Replace container metadata with key=value entries
    SetMetadata {
        name: String,

        #[arg(value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,

        #[arg(long)]
        lease_id: Option<String>,
    },

    /// Print container metadata
    GetMetadata { name: String },

    /// Print the container ACL as JSON
    GetAcl { name: String },

    /// Replace the container ACL from a JSON file of signed identifiers
    SetAcl {
        name: String,

        /// JSON file holding the signed identifiers
        #[arg(long)]
        file: PathBuf,

        /// Public access level (none, blob, container)
        #[arg(long)]
        public_access: Option<String>,

        #[arg(long)]
        lease_id: Option<String>,
    },
}

fn parse_access(value: Option<&str>) -> Result<Option<PublicAccessLevel>> {
    match value {
        None => Ok(None),
        Some(v) => PublicAccessLevel::parse(v)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("unknown public access level: {}", v)),
    }
}

pub async fn run(client: &BlobClient, command: ContainerCommand) -> Result<()> {
    match command {
        ContainerCommand::Create {
            name,
            public_access,
            metadata,
            fail_on_exist,
        } => {
            let metadata =
                (!metadata.is_empty()).then(|| metadata.into_iter().collect::<HashMap<_, _>>());
            let created = client
                .create_container(
                    &name,
                    metadata,
                    parse_access(public_access.as_deref())?,
                    fail_on_exist,
                )
                .await?;
            if created {
                println!("Created container {}", name);
            } else {
                println!("Container {} already exists", name);
            }
        }

        ContainerCommand::Delete { name, lease_id } => {
            let deleted = client
                .delete_container(&name, lease_id.as_deref(), false)
                .await?;
            if deleted {
                println!("Deleted container {}", name);
            } else {
                println!("Container {} does not exist", name);
            }
        }

        ContainerCommand::List {
            prefix,
            num_results,
            marker,
            include_metadata,
        } => {
            let page = client
                .list_containers(&ListContainersOptions {
                    prefix,
                    marker,
                    num_results,
                    include_metadata,
                })
                .await?;
            if page.items.is_empty() {
                println!("No containers found");
            }
            for item in &page.items {
                println!(
                    "  - {} (lease: {}, access: {:?})",
                    item.name,
                    item.properties.lease_state.as_str(),
                    item.properties.public_access
                );
                if let Some(metadata) = &item.metadata {
                    for (key, value) in metadata {
                        println!("      {}={}", key, value);
                    }
                }
            }
            if let Some(marker) = page.next_marker {
                println!("More results available; continue with --marker {}", marker);
            }
        }

        ContainerCommand::Show { name } => {
            let item = client.get_container_properties(&name, None).await?;
            println!("Name: {}", item.name);
            println!("ETag: {}", item.properties.etag);
            println!("Last modified: {}", item.properties.last_modified);
            println!("Lease state: {}", item.properties.lease_state.as_str());
            println!("Lease status: {}", item.properties.lease_status.as_str());
            if let Some(duration) = item.properties.lease_duration {
                println!("Lease duration: {}", duration.as_str());
            }
            println!("Public access: {:?}", item.properties.public_access);
            if let Some(metadata) = item.metadata.filter(|m| !m.is_empty()) {
                println!("Metadata:");
                for (key, value) in metadata {
                    println!("  {}={}", key, value);
                }
            }
        }

        ContainerCommand::SetMetadata {
            name,
            metadata,
            lease_id,
        } => {
            client
                .set_container_metadata(
                    &name,
                    metadata.into_iter().collect(),
                    lease_id.as_deref(),
                )
                .await?;
            info!(container = %name, "metadata replaced");
        }

        ContainerCommand::GetMetadata { name } => {
            let metadata = client.get_container_metadata(&name, None).await?;
            for (key, value) in metadata {
                println!("{}={}", key, value);
            }
        }

        ContainerCommand::GetAcl { name } => {
            let acl = client.get_container_acl(&name, None).await?;
            println!("{}", serde_json::to_string_pretty(&acl)?);
        }

        ContainerCommand::SetAcl {
            name,
            file,
            public_access,
            lease_id,
        } => {
            let data = std::fs::read(&file)?;
            let identifiers: Vec<SignedIdentifier> = serde_json::from_slice(&data)?;
            client
                .set_container_acl(
                    &name,
                    identifiers,
                    parse_access(public_access.as_deref())?,
                    lease_id.as_deref(),
                )
                .await?;
            info!(container = %name, "ACL replaced");
        }
    }

    Ok(())
}
