use anyhow::{bail, Result};
use blobstore_core::{BlobClient, BlobEntry, Include, ListBlobsOptions};
use bytes::Bytes;
use clap::Subcommand;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use super::parse_key_val;

#[derive(Subcommand)]
pub enum BlobCommand {
    /// Upload a blob from a file or inline data
    Put {
        container: String,
        name: String,

        /// Read content from this file
        #[arg(long, conflicts_with = "data")]
        file: Option<PathBuf>,

        /// Inline content
        #[arg(long)]
        data: Option<String>,

        #[arg(long)]
        content_type: Option<String>,

        /// Metadata entries as key=value
        #[arg(long = "meta", value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,

        /// Lease id, required while the blob is leased
        #[arg(long)]
        lease_id: Option<String>,
    },

    /// Download a blob to stdout or a file
    Get {
        container: String,
        name: String,

        /// Write content to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List blobs in a container
    List {
        container: String,

        /// Only names starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Collapse names at this delimiter into directory entries
        #[arg(long)]
        delimiter: Option<String>,

        /// Page size bound
        #[arg(long)]
        num_results: Option<usize>,

        /// Continuation marker from a previous page
        #[arg(long)]
        marker: Option<String>,

        /// Include snapshot entries
        #[arg(long)]
        snapshots: bool,

        /// Populate metadata on each entry
        #[arg(long)]
        metadata: bool,

        /// Include blobs that exist only as uncommitted blocks
        #[arg(long)]
        uncommitted: bool,

        /// Populate copy properties
        #[arg(long)]
        copy: bool,
    },

    /// Delete a blob
    Delete {
        container: String,
        name: String,

        #[arg(long)]
        lease_id: Option<String>,
    },

    /// Take a point-in-time snapshot of a blob
    Snapshot { container: String, name: String },

    /// Copy a blob within the account
    Copy {
        container: String,
        name: String,
        source_container: String,
        source_blob: String,
    },
}

pub async fn run(client: &BlobClient, command: BlobCommand) -> Result<()> {
    match command {
        BlobCommand::Put {
            container,
            name,
            file,
            data,
            content_type,
            metadata,
            lease_id,
        } => {
            let content = match (file, data) {
                (Some(path), None) => Bytes::from(std::fs::read(path)?),
                (None, Some(inline)) => Bytes::from(inline.into_bytes()),
                _ => bail!("provide exactly one of --file or --data"),
            };
            let bytes = content.len();
            let metadata =
                (!metadata.is_empty()).then(|| metadata.into_iter().collect::<HashMap<_, _>>());
            client
                .put_blob(
                    &container,
                    &name,
                    content,
                    content_type.as_deref(),
                    metadata,
                    lease_id.as_deref(),
                )
                .await?;
            info!(container = %container, blob = %name, bytes, "blob uploaded");
        }

        BlobCommand::Get {
            container,
            name,
            out,
        } => {
            let data = client.get_blob(&container, &name, None).await?;
            match out {
                Some(path) => std::fs::write(path, &data)?,
                None => std::io::stdout().write_all(&data)?,
            }
        }

        BlobCommand::List {
            container,
            prefix,
            delimiter,
            num_results,
            marker,
            snapshots,
            metadata,
            uncommitted,
            copy,
        } => {
            let page = client
                .list_blobs(
                    &container,
                    &ListBlobsOptions {
                        prefix,
                        delimiter,
                        marker,
                        num_results,
                        include: Include {
                            snapshots,
                            metadata,
                            uncommitted_blobs: uncommitted,
                            copy,
                        },
                    },
                )
                .await?;
            if page.entries.is_empty() {
                println!("No blobs found in {}", container);
            }
            for entry in &page.entries {
                match entry {
                    BlobEntry::Prefix(prefix) => println!("  - {} (prefix)", prefix),
                    BlobEntry::Blob(item) => {
                        print!(
                            "  - {} ({} bytes, lease: {})",
                            item.name,
                            item.properties.content_length,
                            item.properties.lease_state.as_str()
                        );
                        if let Some(snapshot) = &item.snapshot {
                            print!(" snapshot={}", snapshot);
                        }
                        if let Some(copy) = &item.properties.copy {
                            print!(" copy={} {}", copy.status.as_str(), copy.progress);
                        }
                        println!();
                        if let Some(metadata) = &item.metadata {
                            for (key, value) in metadata {
                                println!("      {}={}", key, value);
                            }
                        }
                    }
                }
            }
            if let Some(marker) = page.next_marker {
                println!("More results available; continue with --marker {}", marker);
            }
        }

        BlobCommand::Delete {
            container,
            name,
            lease_id,
        } => {
            client
                .delete_blob(&container, &name, lease_id.as_deref())
                .await?;
            println!("Deleted blob {}/{}", container, name);
        }

        BlobCommand::Snapshot { container, name } => {
            let snapshot = client.snapshot_blob(&container, &name).await?;
            println!("{}", snapshot);
        }

        BlobCommand::Copy {
            container,
            name,
            source_container,
            source_blob,
        } => {
            let source = client.blob_url(&source_container, &source_blob);
            let copy = client.copy_blob(&container, &name, &source, None).await?;
            println!(
                "Copy {}: {} ({})",
                copy.id,
                copy.status.as_str(),
                copy.progress
            );
        }
    }

    Ok(())
}
