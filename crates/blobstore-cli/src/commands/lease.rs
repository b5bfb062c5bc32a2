use anyhow::Result;
use blobstore_core::{BlobClient, LeaseDuration};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum LeaseCommand {
    /// Acquire a lease, printing the lease id
    Acquire {
        container: String,

        /// Blob name; omit to lease the container itself
        #[arg(long)]
        blob: Option<String>,

        /// Lease duration in seconds (15-60); infinite when omitted
        #[arg(long)]
        duration: Option<u32>,

        /// Propose a lease id instead of having one generated
        #[arg(long)]
        proposed_id: Option<String>,
    },

    /// Renew a lease
    Renew {
        container: String,
        lease_id: String,

        #[arg(long)]
        blob: Option<String>,
    },

    /// Swap the active lease id
    Change {
        container: String,
        lease_id: String,
        proposed_id: String,

        #[arg(long)]
        blob: Option<String>,
    },

    /// Break a lease, printing the seconds until it is broken
    Break {
        container: String,

        /// Break period in seconds; defaults to the remaining duration
        #[arg(long)]
        period: Option<u32>,

        #[arg(long)]
        blob: Option<String>,
    },

    /// Release a lease
    Release {
        container: String,
        lease_id: String,

        #[arg(long)]
        blob: Option<String>,
    },
}

pub async fn run(client: &BlobClient, command: LeaseCommand) -> Result<()> {
    match command {
        LeaseCommand::Acquire {
            container,
            blob,
            duration,
            proposed_id,
        } => {
            let duration = match duration {
                Some(secs) => LeaseDuration::fixed(secs)?,
                None => LeaseDuration::Infinite,
            };
            let lease_id = match &blob {
                Some(blob) => {
                    client
                        .acquire_blob_lease(&container, blob, duration, proposed_id.as_deref())
                        .await?
                }
                None => {
                    client
                        .acquire_container_lease(&container, duration, proposed_id.as_deref())
                        .await?
                }
            };
            println!("{}", lease_id);
        }

        LeaseCommand::Renew {
            container,
            lease_id,
            blob,
        } => {
            let renewed = match &blob {
                Some(blob) => client.renew_blob_lease(&container, blob, &lease_id).await?,
                None => client.renew_container_lease(&container, &lease_id).await?,
            };
            println!("{}", renewed);
        }

        LeaseCommand::Change {
            container,
            lease_id,
            proposed_id,
            blob,
        } => {
            let changed = match &blob {
                Some(blob) => {
                    client
                        .change_blob_lease(&container, blob, &lease_id, &proposed_id)
                        .await?
                }
                None => {
                    client
                        .change_container_lease(&container, &lease_id, &proposed_id)
                        .await?
                }
            };
            println!("{}", changed);
        }

        LeaseCommand::Break {
            container,
            period,
            blob,
        } => {
            let remaining = match &blob {
                Some(blob) => client.break_blob_lease(&container, blob, period).await?,
                None => client.break_container_lease(&container, period).await?,
            };
            println!("Lease breaks in {} seconds", remaining);
        }

        LeaseCommand::Release {
            container,
            lease_id,
            blob,
        } => {
            match &blob {
                Some(blob) => {
                    client
                        .release_blob_lease(&container, blob, &lease_id)
                        .await?
                }
                None => {
                    client
                        .release_container_lease(&container, &lease_id)
                        .await?
                }
            }
            println!("Lease released");
        }
    }

    Ok(())
}
