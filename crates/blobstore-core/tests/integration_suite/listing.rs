//! Listing tests: pagination, prefixes, delimiters, and inclusion flags.

use blobstore_core::{
    BlobEntry, Include, LeaseDuration, LeaseState, LeaseStatus, ListBlobsOptions,
    ListContainersOptions,
};
use bytes::Bytes;

use super::common;

#[tokio::test]
async fn list_containers_includes_created_container() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let page = client
        .list_containers(&ListContainersOptions::default())
        .await
        .unwrap();

    assert!(page.items.iter().any(|c| c.name == name));
}

#[tokio::test]
async fn list_containers_with_prefix_omits_metadata() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    client
        .set_container_metadata(&name, common::metadata(&[("hello", "world")]), None)
        .await
        .unwrap();

    let page = client
        .list_containers(&ListContainersOptions {
            prefix: Some(name.clone()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, name);
    assert!(page.items[0].metadata.is_none());
}

#[tokio::test]
async fn list_containers_with_include_metadata() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    let md = common::metadata(&[("hello", "world"), ("number", "42")]);
    client
        .set_container_metadata(&name, md.clone(), None)
        .await
        .unwrap();

    let page = client
        .list_containers(&ListContainersOptions {
            prefix: Some(name.clone()),
            include_metadata: true,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.items[0].metadata, Some(md));
}

#[tokio::test]
async fn list_containers_with_num_results_and_marker() {
    let client = common::test_client();
    let mut names = Vec::new();
    for i in 0..4 {
        let name = format!("listcontainer{}", i);
        client
            .create_container(&name, None, None, false)
            .await
            .unwrap();
        names.push(name);
    }

    let page1 = client
        .list_containers(&ListContainersOptions {
            prefix: Some("listcontainer".to_string()),
            num_results: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    let page2 = client
        .list_containers(&ListContainersOptions {
            prefix: Some("listcontainer".to_string()),
            num_results: Some(2),
            marker: page1.next_marker.clone(),
            ..Default::default()
        })
        .await
        .unwrap();

    let names1: Vec<_> = page1.items.iter().map(|c| c.name.clone()).collect();
    let names2: Vec<_> = page2.items.iter().map(|c| c.name.clone()).collect();
    assert_eq!(names1, names[..2]);
    assert_eq!(names2, names[2..]);
    assert!(page2.next_marker.is_none());

    // Concatenation of the pages equals the full unfiltered listing.
    let all = client
        .list_all_containers(Some("listcontainer"))
        .await
        .unwrap();
    let all_names: Vec<_> = all.iter().map(|c| c.name.clone()).collect();
    assert_eq!(all_names, names);
}

#[tokio::test]
async fn list_blob_names() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    common::put_text_blob(&client, &name, "blob1", "hello world").await;
    common::put_text_blob(&client, &name, "blob2", "hello world").await;

    assert_eq!(
        client.list_blob_names(&name).await.unwrap(),
        ["blob1", "blob2"]
    );
}

#[tokio::test]
async fn list_blobs_reports_properties() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    common::put_text_blob(&client, &name, "blob1", "hello world").await;
    common::put_text_blob(&client, &name, "blob2", "hello world").await;

    let page = client
        .list_blobs(&name, &ListBlobsOptions::default())
        .await
        .unwrap();

    assert_eq!(page.entries.len(), 2);
    let first = page.entries[0].as_blob().unwrap();
    assert_eq!(first.properties.content_length, 11);
    assert_eq!(
        first.properties.content_type.as_deref(),
        Some("application/octet-stream")
    );
}

#[tokio::test]
async fn list_blobs_leased_blob() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    common::put_text_blob(&client, &name, "blob1", "hello world").await;
    client
        .acquire_blob_lease(&name, "blob1", LeaseDuration::Infinite, None)
        .await
        .unwrap();

    let page = client
        .list_blobs(&name, &ListBlobsOptions::default())
        .await
        .unwrap();

    let item = page.entries[0].as_blob().unwrap();
    assert_eq!(item.properties.content_length, 11);
    assert_eq!(item.properties.lease_state, LeaseState::Leased);
    assert_eq!(item.properties.lease_status, LeaseStatus::Locked);
    assert_eq!(item.properties.lease_duration, Some(LeaseDuration::Infinite));
}

#[tokio::test]
async fn list_blobs_with_prefix() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    for blob in ["bloba1", "bloba2", "blobb1"] {
        common::put_text_blob(&client, &name, blob, "hello world").await;
    }

    let page = client
        .list_blobs(
            &name,
            &ListBlobsOptions {
                prefix: Some("bloba".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let names: Vec<_> = page.entries.iter().map(|e| e.name()).collect();
    assert_eq!(names, ["bloba1", "bloba2"]);
}

#[tokio::test]
async fn list_blobs_with_num_results() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    for blob in ["bloba1", "bloba2", "bloba3", "blobb1"] {
        common::put_text_blob(&client, &name, blob, "hello world").await;
    }

    let page = client
        .list_blobs(
            &name,
            &ListBlobsOptions {
                num_results: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let names: Vec<_> = page.entries.iter().map(|e| e.name()).collect();
    assert_eq!(names, ["bloba1", "bloba2"]);
    assert!(page.next_marker.is_some());
}

#[tokio::test]
async fn list_blobs_with_delimiter() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    for blob in ["a/blob1", "a/blob2", "b/blob1", "blob1"] {
        common::put_text_blob(&client, &name, blob, "hello world").await;
    }

    let page = client
        .list_blobs(
            &name,
            &ListBlobsOptions {
                delimiter: Some("/".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let names: Vec<_> = page.entries.iter().map(|e| e.name()).collect();
    assert_eq!(names, ["a/", "b/", "blob1"]);
}

#[tokio::test]
async fn list_blobs_with_include_snapshots() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    common::put_text_blob(&client, &name, "blob1", "hello world").await;
    common::put_text_blob(&client, &name, "blob2", "hello world").await;
    client.snapshot_blob(&name, "blob1").await.unwrap();

    let page = client
        .list_blobs(
            &name,
            &ListBlobsOptions {
                include: Include {
                    snapshots: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.entries.len(), 3);
    let entries: Vec<_> = page.entries.iter().map(|e| e.as_blob().unwrap()).collect();
    assert_eq!(entries[0].name, "blob1");
    assert!(entries[0].snapshot.is_some());
    assert_eq!(entries[1].name, "blob1");
    assert!(entries[1].snapshot.is_none());
    assert_eq!(entries[2].name, "blob2");
    assert!(entries[2].snapshot.is_none());
}

#[tokio::test]
async fn list_blobs_with_include_metadata() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    client
        .put_blob(
            &name,
            "blob1",
            Bytes::from_static(b"hello world"),
            None,
            Some(common::metadata(&[("number", "1"), ("name", "bob")])),
            None,
        )
        .await
        .unwrap();
    client
        .put_blob(
            &name,
            "blob2",
            Bytes::from_static(b"hello world"),
            None,
            Some(common::metadata(&[("number", "2"), ("name", "car")])),
            None,
        )
        .await
        .unwrap();
    client.snapshot_blob(&name, "blob1").await.unwrap();

    let page = client
        .list_blobs(
            &name,
            &ListBlobsOptions {
                include: Include {
                    metadata: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Snapshots are not included without the snapshots flag.
    assert_eq!(page.entries.len(), 2);
    let first = page.entries[0].as_blob().unwrap();
    assert_eq!(first.metadata, Some(common::metadata(&[("number", "1"), ("name", "bob")])));
    let second = page.entries[1].as_blob().unwrap();
    assert_eq!(second.metadata, Some(common::metadata(&[("number", "2"), ("name", "car")])));
}

#[tokio::test]
async fn list_blobs_with_include_multiple() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    client
        .put_blob(
            &name,
            "blob1",
            Bytes::from_static(b"hello world"),
            None,
            Some(common::metadata(&[("number", "1")])),
            None,
        )
        .await
        .unwrap();
    client.snapshot_blob(&name, "blob1").await.unwrap();

    let page = client
        .list_blobs(
            &name,
            &ListBlobsOptions {
                include: Include {
                    snapshots: true,
                    metadata: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.entries.len(), 2);
    let snapshot_entry = page.entries[0].as_blob().unwrap();
    assert!(snapshot_entry.snapshot.is_some());
    assert_eq!(snapshot_entry.metadata, Some(common::metadata(&[("number", "1")])));
    let live_entry = page.entries[1].as_blob().unwrap();
    assert!(live_entry.snapshot.is_none());
    assert_eq!(live_entry.metadata, Some(common::metadata(&[("number", "1")])));
}

#[tokio::test]
async fn list_blobs_with_include_uncommitted_blobs() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    for (block_id, data) in [("1", "AAA"), ("2", "BBB"), ("3", "CCC")] {
        client
            .stage_block(&name, "blob1", block_id, Bytes::from(data.as_bytes().to_vec()))
            .await
            .unwrap();
    }
    common::put_text_blob(&client, &name, "blob2", "hello world").await;

    let page = client
        .list_blobs(
            &name,
            &ListBlobsOptions {
                include: Include {
                    uncommitted_blobs: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let names: Vec<_> = page.entries.iter().map(|e| e.name()).collect();
    assert_eq!(names, ["blob1", "blob2"]);
}

#[tokio::test]
async fn list_blobs_with_include_copy() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    client
        .put_blob(
            &name,
            "blob1",
            Bytes::from_static(b"hello world"),
            None,
            Some(common::metadata(&[("status", "original")])),
            None,
        )
        .await
        .unwrap();
    let source = client.blob_url(&name, "blob1");
    client
        .copy_blob(&name, "blob1copy", &source, Some(common::metadata(&[("status", "copy")])))
        .await
        .unwrap();

    let page = client
        .list_blobs(
            &name,
            &ListBlobsOptions {
                include: Include {
                    copy: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.entries.len(), 2);
    let copied = page.entries[1].as_blob().unwrap();
    assert_eq!(copied.name, "blob1copy");
    assert_eq!(copied.properties.content_length, 11);
    assert_eq!(copied.properties.lease_state, LeaseState::Available);
    assert_eq!(copied.properties.lease_status, LeaseStatus::Unlocked);
    let copy = copied.properties.copy.as_ref().unwrap();
    assert!(!copy.id.is_empty());
    assert_eq!(copy.source, source);
    assert_eq!(copy.progress, "11/11");
    assert!(copy.completion_time.is_some());
}

#[tokio::test]
async fn blob_pages_concatenate_into_the_full_listing() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    let blobs = ["a/blob1", "a/blob2", "b/blob1", "blob1"];
    for blob in blobs {
        common::put_text_blob(&client, &name, blob, "hello world").await;
    }

    let mut collected = Vec::new();
    let mut marker = None;
    loop {
        let page = client
            .list_blobs(
                &name,
                &ListBlobsOptions {
                    num_results: Some(2),
                    marker: marker.clone(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(page.entries.len() <= 2);
        collected.extend(page.entries.iter().map(|e| e.name().to_owned()));
        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }
    assert_eq!(collected, blobs);
}

#[tokio::test]
async fn directory_entries_are_prefix_variants() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    common::put_text_blob(&client, &name, "a/blob1", "hello world").await;

    let page = client
        .list_blobs(
            &name,
            &ListBlobsOptions {
                delimiter: Some("/".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    match &page.entries[0] {
        BlobEntry::Prefix(prefix) => assert_eq!(prefix, "a/"),
        BlobEntry::Blob(item) => panic!("expected a prefix entry, got blob {:?}", item.name),
    }
}
