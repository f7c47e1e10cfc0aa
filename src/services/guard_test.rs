use super::*;

#[test]
fn second_acquire_of_same_key_is_rejected() {
    let guards = InFlight::new();
    let token = guards.try_acquire("creating:c1:channels").expect("first acquire");
    assert_eq!(token.key(), "creating:c1:channels");
    assert!(guards.try_acquire("creating:c1:channels").is_none());
    assert!(guards.is_active("creating:c1:channels"));
}

#[test]
fn different_keys_do_not_block_each_other() {
    let guards = InFlight::new();
    let _a = guards.try_acquire("linking:c1:channels:a").expect("a");
    assert!(guards.try_acquire("linking:c1:channels:b").is_some());
}

#[test]
fn dropping_token_releases_key() {
    let guards = InFlight::new();
    {
        let _token = guards.try_acquire("unlinking:x").expect("acquire");
    }
    assert!(!guards.is_active("unlinking:x"));
    assert!(guards.try_acquire("unlinking:x").is_some());
}

#[test]
fn clones_share_the_same_set() {
    let guards = InFlight::new();
    let other = guards.clone();
    let _token = guards.try_acquire("k").expect("acquire");
    assert!(other.try_acquire("k").is_none());
}

#[tokio::test]
async fn serialize_queues_holders_of_the_same_key() {
    let guards = InFlight::new();
    let held = guards.serialize("block:c1:channels").await;

    let other = guards.clone();
    let waiter = tokio::spawn(async move {
        let _lock = other.serialize("block:c1:channels").await;
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!waiter.is_finished());

    drop(held);
    waiter.await.unwrap();
}

#[tokio::test]
async fn serialize_does_not_block_other_keys_and_prunes_idle_locks() {
    let guards = InFlight::new();
    let _a = guards.serialize("block:c1:channels").await;
    drop(guards.serialize("block:c1:pains").await);

    let _b = guards.serialize("block:c1:gains").await;
    assert_eq!(guards.lock_count(), 2, "idle pains lock was pruned");
}
