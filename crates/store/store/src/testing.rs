use crate::error::StoreError;
use crate::store::RuleStore;

const PAYLOAD_V1: &str = r#"{"start":"https://example.com/"}"#;
const PAYLOAD_V2: &str = r#"{"start":"https://example.com/news/","same_host":true}"#;

/// Run the full rule store conformance test suite.
///
/// Call this from your backend's test module with a fresh, empty store.
///
/// # Errors
///
/// Returns an error if the backend fails an operation; contract violations
/// panic with a descriptive message.
pub async fn run_store_conformance_tests(store: &dyn RuleStore) -> Result<(), StoreError> {
    test_list_empty(store).await?;
    test_get_missing(store).await?;
    test_create_and_get(store).await?;
    test_ids_not_reused(store).await?;
    test_update_existing(store).await?;
    test_update_missing(store).await?;
    test_delete_idempotent(store).await?;
    test_list_ordering(store).await?;
    test_ping(store).await?;
    Ok(())
}

async fn test_list_empty(store: &dyn RuleStore) -> Result<(), StoreError> {
    let rows = store.list().await?;
    assert!(rows.is_empty(), "a fresh store should list no rules");
    Ok(())
}

async fn test_get_missing(store: &dyn RuleStore) -> Result<(), StoreError> {
    let row = store.get(u64::MAX).await?;
    assert!(row.is_none(), "get on unknown id should return None");
    Ok(())
}

async fn test_create_and_get(store: &dyn RuleStore) -> Result<(), StoreError> {
    let id = store.create("example.com", PAYLOAD_V1).await?;
    let row = store.get(id).await?.expect("created row should be readable");
    assert_eq!(row.id, id);
    assert_eq!(row.host, "example.com");
    assert_eq!(row.json, PAYLOAD_V1, "payload should round-trip verbatim");

    store.delete(id).await?;
    Ok(())
}

async fn test_ids_not_reused(store: &dyn RuleStore) -> Result<(), StoreError> {
    let first = store.create("ids.example.com", PAYLOAD_V1).await?;
    let second = store.create("ids.example.com", PAYLOAD_V1).await?;
    assert!(second > first, "ids should increase");

    store.delete(second).await?;
    let third = store.create("ids.example.com", PAYLOAD_V1).await?;
    assert!(third > second, "a deleted id must not be reassigned");

    store.delete(first).await?;
    store.delete(third).await?;
    Ok(())
}

async fn test_update_existing(store: &dyn RuleStore) -> Result<(), StoreError> {
    let id = store.create("before.example.com", PAYLOAD_V1).await?;
    let before = store.get(id).await?.expect("created row should be readable");

    let matched = store.update(id, "after.example.com", PAYLOAD_V2).await?;
    assert!(matched, "update of an existing row should report a match");

    let after = store.get(id).await?.expect("updated row should be readable");
    assert_eq!(after.id, id, "update must not change the id");
    assert_eq!(after.host, "after.example.com");
    assert_eq!(after.json, PAYLOAD_V2);
    assert!(
        after.updated >= before.updated,
        "update should refresh the timestamp"
    );

    store.delete(id).await?;
    Ok(())
}

async fn test_update_missing(store: &dyn RuleStore) -> Result<(), StoreError> {
    let count = store.list().await?.len();
    let matched = store.update(u64::MAX, "ghost.example.com", PAYLOAD_V1).await?;
    assert!(!matched, "update of an unknown id should match nothing");
    assert_eq!(
        store.list().await?.len(),
        count,
        "update of an unknown id must not insert"
    );
    Ok(())
}

async fn test_delete_idempotent(store: &dyn RuleStore) -> Result<(), StoreError> {
    let id = store.create("delete.example.com", PAYLOAD_V1).await?;

    let existed = store.delete(id).await?;
    assert!(existed, "delete should return true for an existing row");
    assert!(store.get(id).await?.is_none(), "get after delete should return None");

    let existed = store.delete(id).await?;
    assert!(!existed, "second delete should return false");
    let existed = store.delete(id).await?;
    assert!(!existed, "repeated delete should keep returning false");
    Ok(())
}

async fn test_list_ordering(store: &dyn RuleStore) -> Result<(), StoreError> {
    let b = store.create("b.com", PAYLOAD_V1).await?;
    let a1 = store.create("a.com", PAYLOAD_V1).await?;
    let a2 = store.create("a.com", PAYLOAD_V2).await?;

    let ids: Vec<u64> = store
        .list()
        .await?
        .into_iter()
        .map(|row| row.id)
        .filter(|id| [a1, a2, b].contains(id))
        .collect();
    assert_eq!(
        ids,
        vec![a1, a2, b],
        "list should order by host, then by id"
    );

    for id in [a1, a2, b] {
        store.delete(id).await?;
    }
    Ok(())
}

async fn test_ping(store: &dyn RuleStore) -> Result<(), StoreError> {
    store.ping().await
}
