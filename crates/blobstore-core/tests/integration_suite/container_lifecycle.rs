//! Container lifecycle tests: create/exists/delete, metadata, and ACLs.

use blobstore_core::{AccessPolicy, Error, PublicAccessLevel, SignedIdentifier};
use chrono::{Duration, Utc};

use super::common;

#[tokio::test]
async fn create_container() {
    let client = common::test_client();
    let name = common::container_name("container");

    let created = client.create_container(&name, None, None, false).await.unwrap();

    assert!(created);
}

#[tokio::test]
async fn create_container_fail_on_exist() {
    let client = common::test_client();
    let name = common::container_name("container");

    let created = client.create_container(&name, None, None, true).await.unwrap();

    assert!(created);
}

#[tokio::test]
async fn create_container_with_already_existing_container() {
    let client = common::test_client();
    let name = common::container_name("container");

    let created1 = client.create_container(&name, None, None, false).await.unwrap();
    let created2 = client.create_container(&name, None, None, false).await.unwrap();

    assert!(created1);
    assert!(!created2);
}

#[tokio::test]
async fn create_container_with_already_existing_container_fail_on_exist() {
    let client = common::test_client();
    let name = common::container_name("container");

    let created = client.create_container(&name, None, None, false).await.unwrap();
    let err = client
        .create_container(&name, None, None, true)
        .await
        .unwrap_err();

    assert!(created);
    assert!(err.is_conflict());
}

#[tokio::test]
async fn create_container_with_public_access() {
    let client = common::test_client();
    let name = common::container_name("container");

    client
        .create_container(&name, None, Some(PublicAccessLevel::Container), false)
        .await
        .unwrap();

    let item = client.get_container_properties(&name, None).await.unwrap();
    assert_eq!(item.properties.public_access, PublicAccessLevel::Container);
}

#[tokio::test]
async fn create_container_with_metadata() {
    let client = common::test_client();
    let name = common::container_name("container");
    let md = common::metadata(&[("hello", "world"), ("number", "42")]);

    let created = client
        .create_container(&name, Some(md.clone()), None, false)
        .await
        .unwrap();

    assert!(created);
    assert_eq!(client.get_container_metadata(&name, None).await.unwrap(), md);
}

#[tokio::test]
async fn container_exists() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    assert!(client.exists(&name).await.unwrap());
}

#[tokio::test]
async fn container_not_exists_reads_as_false() {
    let client = common::test_client();
    let name = common::container_name("container");

    assert!(!client.exists(&name).await.unwrap());
}

#[tokio::test]
async fn unicode_container_name_is_rejected() {
    let client = common::test_client();

    let err = client
        .create_container("啊齄丂狛狜", None, None, false)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn set_container_metadata_round_trips() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    let md = common::metadata(&[("hello", "world"), ("number", "43")]);

    client
        .set_container_metadata(&name, md.clone(), None)
        .await
        .unwrap();

    assert_eq!(client.get_container_metadata(&name, None).await.unwrap(), md);
    let item = client.get_container_properties(&name, None).await.unwrap();
    assert_eq!(item.metadata, Some(md));
    assert!(!item.properties.etag.is_empty());
}

#[tokio::test]
async fn set_container_metadata_with_non_existing_container() {
    let client = common::test_client();
    let name = common::container_name("container");

    let err = client
        .set_container_metadata(&name, common::metadata(&[("hello", "world")]), None)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn get_container_acl_defaults_to_private_and_empty() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let acl = client.get_container_acl(&name, None).await.unwrap();

    assert!(acl.signed_identifiers.is_empty());
    assert_eq!(acl.public_access, PublicAccessLevel::None);
}

#[tokio::test]
async fn set_container_acl_with_empty_signed_identifier() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    client
        .set_container_acl(
            &name,
            vec![SignedIdentifier {
                id: "empty".to_string(),
                access_policy: AccessPolicy::default(),
            }],
            None,
            None,
        )
        .await
        .unwrap();

    let acl = client.get_container_acl(&name, None).await.unwrap();
    assert_eq!(acl.signed_identifiers.len(), 1);
    assert_eq!(acl.signed_identifiers[0].id, "empty");
    let policy = &acl.signed_identifiers[0].access_policy;
    assert!(policy.permission.is_none());
    assert!(policy.start.is_none());
    assert!(policy.expiry.is_none());
    assert_eq!(acl.public_access, PublicAccessLevel::None);
}

#[tokio::test]
async fn set_container_acl_with_signed_identifiers() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;
    let now = Utc::now();

    client
        .set_container_acl(
            &name,
            vec![SignedIdentifier {
                id: "testid".to_string(),
                access_policy: AccessPolicy {
                    start: Some(now - Duration::minutes(1)),
                    expiry: Some(now + Duration::hours(1)),
                    permission: Some("r".to_string()),
                },
            }],
            None,
            None,
        )
        .await
        .unwrap();

    let acl = client.get_container_acl(&name, None).await.unwrap();
    assert_eq!(acl.signed_identifiers.len(), 1);
    assert_eq!(acl.signed_identifiers[0].id, "testid");
}

#[tokio::test]
async fn set_container_acl_with_public_access() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    client
        .set_container_acl(&name, Vec::new(), Some(PublicAccessLevel::Container), None)
        .await
        .unwrap();

    let acl = client.get_container_acl(&name, None).await.unwrap();
    assert_eq!(acl.public_access, PublicAccessLevel::Container);
}

#[tokio::test]
async fn set_container_acl_too_many_ids() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let identifiers: Vec<_> = (0..6)
        .map(|i| SignedIdentifier {
            id: format!("id{}", i),
            access_policy: AccessPolicy::default(),
        })
        .collect();
    let err = client
        .set_container_acl(&name, identifiers, None, None)
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(err.to_string().contains("Too many access policies"));
}

#[tokio::test]
async fn delete_container_with_existing_container() {
    let client = common::test_client();
    let name = common::create_container(&client, "container").await;

    let deleted = client.delete_container(&name, None, false).await.unwrap();

    assert!(deleted);
    assert!(!client.exists(&name).await.unwrap());
}

#[tokio::test]
async fn delete_container_with_non_existing_container() {
    let client = common::test_client();
    let name = common::container_name("container");

    let deleted = client.delete_container(&name, None, false).await.unwrap();

    assert!(!deleted);
}

#[tokio::test]
async fn delete_container_with_non_existing_container_fail_if_missing() {
    let client = common::test_client();
    let name = common::container_name("container");

    let err = client.delete_container(&name, None, true).await.unwrap_err();

    assert!(err.is_not_found());
}
