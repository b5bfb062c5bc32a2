//! Lease tests: acquire/renew/change/break/release and operation gating.
//!
//! Infinite leases keep the scenarios free of wall-clock timing; the
//! expiry clock itself is covered by the state-machine unit tests.

use blobstore_core::{LeaseDuration, LeaseState, LeaseStatus};

use super::common;

#[tokio::test]
async fn lease_container_acquire_and_release() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let lease_id = client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap();
    client.release_container_lease(&name, &lease_id).await.unwrap();

    client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn lease_container_acquire_twice_conflicts() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap();
    let err = client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap_err();

    assert!(err.is_conflict());
}

#[tokio::test]
async fn lease_container_with_proposed_lease_id() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let proposed = "55e97f64-73e8-4390-838d-d9e84a374321";
    let lease_id = client
        .acquire_container_lease(&name, LeaseDuration::Infinite, Some(proposed))
        .await
        .unwrap();

    assert_eq!(lease_id, proposed);
}

#[tokio::test]
async fn lease_container_change_lease_id() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let proposed = "29e0b239-ecda-4f69-bfa3-95f6af91464c";
    let lease_id1 = client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap();
    client
        .change_container_lease(&name, &lease_id1, proposed)
        .await
        .unwrap();
    let lease_id2 = client.renew_container_lease(&name, proposed).await.unwrap();

    assert_ne!(lease_id1, proposed);
    assert_eq!(lease_id2, proposed);
}

#[tokio::test]
async fn renew_with_stale_id_conflicts() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap();
    let err = client
        .renew_container_lease(&name, "8f7b4b3e-0000-0000-0000-000000000000")
        .await
        .unwrap_err();

    assert!(err.is_conflict());
}

#[tokio::test]
async fn lease_container_break_released_lease_fails() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let lease_id = client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap();
    client.release_container_lease(&name, &lease_id).await.unwrap();

    let err = client.break_container_lease(&name, None).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn broken_lease_rejects_the_old_id() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let lease_id = client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap();
    let remaining = client.break_container_lease(&name, Some(0)).await.unwrap();
    assert_eq!(remaining, 0);

    // The break cleared an infinite lease immediately; the old id no
    // longer matches anything.
    let err = client
        .delete_container(&name, Some(&lease_id), false)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(client.delete_container(&name, None, false).await.unwrap());
}

#[tokio::test]
async fn leased_container_gates_metadata_and_delete() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    let md = common::metadata(&[("hello", "world"), ("number", "43")]);

    let lease_id = client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap();

    let err = client
        .set_container_metadata(&name, md.clone(), None)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    client
        .set_container_metadata(&name, md.clone(), Some(&lease_id))
        .await
        .unwrap();
    assert_eq!(client.get_container_metadata(&name, None).await.unwrap(), md);

    assert!(client
        .delete_container(&name, None, false)
        .await
        .unwrap_err()
        .is_conflict());
    assert!(client
        .delete_container(&name, Some(&lease_id), false)
        .await
        .unwrap());
}

#[tokio::test]
async fn container_properties_report_an_infinite_lease() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap();

    let item = client.get_container_properties(&name, None).await.unwrap();
    assert_eq!(item.properties.lease_state, LeaseState::Leased);
    assert_eq!(item.properties.lease_status, LeaseStatus::Locked);
    assert_eq!(item.properties.lease_duration, Some(LeaseDuration::Infinite));
}

#[tokio::test]
async fn get_container_properties_with_lease_id() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let lease_id = client
        .acquire_container_lease(&name, LeaseDuration::Infinite, None)
        .await
        .unwrap();

    let item = client
        .get_container_properties(&name, Some(&lease_id))
        .await
        .unwrap();
    assert_eq!(item.properties.lease_state, LeaseState::Leased);

    let err = client
        .get_container_properties(&name, Some("not-the-holder"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn blob_lease_gates_blob_mutation() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    common::put_text_blob(&client, &name, "blob1", "hello world").await;

    let lease_id = client
        .acquire_blob_lease(&name, "blob1", LeaseDuration::Infinite, None)
        .await
        .unwrap();

    assert!(client
        .delete_blob(&name, "blob1", None)
        .await
        .unwrap_err()
        .is_conflict());
    client
        .delete_blob(&name, "blob1", Some(&lease_id))
        .await
        .unwrap();
}

#[tokio::test]
async fn out_of_range_duration_is_rejected() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let err = client
        .acquire_container_lease(&name, LeaseDuration::Seconds(10), None)
        .await
        .unwrap_err();
    assert!(matches!(err, blobstore_core::Error::Validation(_)));
}
