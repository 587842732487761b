use assert_matches::assert_matches;
use mgmt_common::{EntityKey, EntityType, Uuid};
use mgmt_config::LockServiceConfig;
use mgmt_lock::{LockError, LockService};
use rstest::rstest;

fn volume(name: &str) -> EntityKey {
    EntityKey::new(EntityType::Volume, name)
}

#[tokio::test]
async fn acquire_then_release_returns_map_to_original_state() {
    let service = LockService::new(&LockServiceConfig::default());
    let owner = Uuid::new_v4();
    let key = volume("v1");

    service.acquire(key.clone(), owner).await.unwrap();
    assert_eq!(service.held_locks_snapshot().await.len(), 1);

    service.release(key, owner).await.unwrap();
    assert!(service.held_locks_snapshot().await.is_empty());
}

#[tokio::test]
async fn acquire_is_idempotent_for_the_same_owner() {
    let service = LockService::new(&LockServiceConfig::default());
    let owner = Uuid::new_v4();
    let key = volume("v1");

    service.acquire(key.clone(), owner).await.unwrap();
    service.acquire(key.clone(), owner).await.unwrap();
    assert_eq!(service.held_locks_snapshot().await.len(), 1);
}

/// Scenario D: lock already held by a different owner.
#[tokio::test]
async fn scenario_d_lock_already_held() {
    let service = LockService::new(&LockServiceConfig::default());
    let owner_one = Uuid::new_v4();
    let owner_two = Uuid::new_v4();
    let key = volume("v1");

    service.acquire(key.clone(), owner_one).await.unwrap();
    let result = service.acquire(key, owner_two).await;

    assert_matches!(result, Err(LockError::AlreadyHeld { .. }));
}

/// Scenario E: auto-release timer reclaims an abandoned lock.
#[tokio::test(start_paused = true)]
async fn scenario_e_auto_release_timer_reclaims_abandoned_lock() {
    let config = LockServiceConfig { lock_timeout_secs: 5 };
    let service = LockService::new(&config);
    let owner_one = Uuid::new_v4();
    let owner_two = Uuid::new_v4();
    let key = volume("v1");

    service.acquire(key.clone(), owner_one).await.unwrap();

    tokio::time::advance(std::time::Duration::from_secs(5)).await;
    tokio::task::yield_now().await;

    assert!(service.held_locks_snapshot().await.is_empty());
    service.acquire(key, owner_two).await.unwrap();
}

#[tokio::test]
async fn release_by_non_owner_is_rejected() {
    let service = LockService::new(&LockServiceConfig::default());
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let key = volume("v1");

    service.acquire(key.clone(), owner).await.unwrap();
    let result = service.release(key, stranger).await;

    assert_matches!(result, Err(LockError::OwnerMismatch { .. }));
}

#[tokio::test]
async fn release_of_unheld_key_is_rejected() {
    let service = LockService::new(&LockServiceConfig::default());
    let result = service.release(volume("nonexistent"), Uuid::new_v4()).await;
    assert_matches!(result, Err(LockError::NotHeld { .. }));
}

#[rstest]
#[case(vec!["v1", "v2", "v3"])]
#[case(vec!["only-one"])]
#[tokio::test]
async fn acquire_many_then_release_many_round_trips(#[case] names: Vec<&str>) {
    let service = LockService::new(&LockServiceConfig::default());
    let owner = Uuid::new_v4();
    let keys: Vec<EntityKey> = names.iter().map(|name| volume(name)).collect();

    service.acquire_many(&keys, owner).await.unwrap();
    assert_eq!(service.held_locks_snapshot().await.len(), keys.len());

    service.release_many(&keys, owner).await.unwrap();
    assert!(service.held_locks_snapshot().await.is_empty());
}

#[tokio::test]
async fn acquire_many_rolls_back_on_partial_failure() {
    let service = LockService::new(&LockServiceConfig::default());
    let owner_one = Uuid::new_v4();
    let owner_two = Uuid::new_v4();

    service.acquire(volume("v2"), owner_one).await.unwrap();

    let entries = vec![volume("v1"), volume("v2"), volume("v3")];
    let result = service.acquire_many(&entries, owner_two).await;

    assert_matches!(result, Err(LockError::PartialFail { .. }));
    // v1 was rolled back; v2 is still held by owner_one; v3 was never reached.
    let snapshot = service.held_locks_snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.contains_key(&volume("v2")));
}

#[tokio::test]
async fn release_many_is_best_effort_and_reports_first_failure() {
    let service = LockService::new(&LockServiceConfig::default());
    let owner = Uuid::new_v4();

    service.acquire(volume("v1"), owner).await.unwrap();
    service.acquire(volume("v2"), owner).await.unwrap();

    let entries = vec![volume("v1"), volume("missing"), volume("v2")];
    let result = service.release_many(&entries, owner).await;

    assert_matches!(result, Err(LockError::NotHeld { .. }));
    assert!(service.held_locks_snapshot().await.is_empty());
}
