mod util;
use util::*;

use redsumer_redis::{
    AutoClaimTier, ConsumerGroup, EntryId, GroupConsumer, PendingTier, StreamErr,
};
use std::time::Duration;

// cargo test --test consumer -- --nocapture
#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn new_tier_short_circuits() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    let sent = push_n(&store, &stream, 5);

    let mut options = options("workers", "alice");
    options
        .set_pending(PendingTier::Enabled { batch_size: 10 })
        .set_auto_claim(AutoClaimTier::Enabled {
            batch_size: 10,
            min_idle: Duration::ZERO,
        });
    let mut consumer = consumer(&store, &stream, options).await;
    store.clear_calls();

    let entries = consumer.consume().await?;
    assert_eq!(ids(&entries), sent);
    assert_eq!(entries[3].get("msg"), Some("3"));
    assert_eq!(store.calls(), vec![Op::ReadNew]);
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn disabled_tiers_are_skipped() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    push_n(&store, &stream, 1);

    let mut consumer = consumer(&store, &stream, options("workers", "alice")).await;
    assert_eq!(consumer.consume().await?.len(), 1);
    store.clear_calls();

    // the entry is pending, but the pending tier is disabled
    assert!(consumer.consume().await?.is_empty());
    assert_eq!(store.calls(), vec![Op::ReadNew]);
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn pending_tier_pages_and_wraps() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    let sent = push_n(&store, &stream, 3);

    let mut options = options("workers", "alice");
    options.set_pending(PendingTier::Enabled { batch_size: 2 });
    let mut consumer = consumer(&store, &stream, options).await;

    assert_eq!(ids(&consumer.consume().await?), sent);
    assert!(consumer.cursor().last_pending_id.is_origin());

    // nothing new: page through own pending entries
    assert_eq!(ids(&consumer.consume().await?), sent[0..2]);
    assert_eq!(consumer.cursor().last_pending_id, sent[1]);

    assert_eq!(ids(&consumer.consume().await?), sent[2..3]);
    assert_eq!(consumer.cursor().last_pending_id, sent[2]);

    // scan complete: the cursor goes back to the origin
    assert!(consumer.consume().await?.is_empty());
    assert_eq!(consumer.cursor().last_pending_id, EntryId::ORIGIN);

    store.clear_calls();
    assert_eq!(ids(&consumer.consume().await?), sent[0..2]);
    assert_eq!(store.calls(), vec![Op::ReadNew, Op::ReadFrom]);

    // acknowledged entries are not re-delivered
    consumer.ack(&sent[0..2]).await?;
    assert_eq!(ids(&consumer.consume().await?), sent[2..3]);
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn auto_claim_tier_takes_over_abandoned_entries() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    let group = ConsumerGroup::new("workers");
    let sent = push_n(&store, &stream, 3);

    let mut alice = consumer(&store, &stream, options("workers", "alice")).await;
    assert_eq!(alice.consume().await?.len(), 3);

    let mut options = options("workers", "bob");
    options.set_auto_claim(AutoClaimTier::Enabled {
        batch_size: 2,
        min_idle: Duration::from_secs(60),
    });
    let mut bob = consumer(&store, &stream, options).await;

    // not idle for long enough
    assert!(bob.consume().await?.is_empty());
    assert!(bob.cursor().next_auto_claim_id.is_origin());

    store.advance(Duration::from_secs(61));
    assert_eq!(ids(&bob.consume().await?), sent[0..2]);
    assert_eq!(bob.cursor().next_auto_claim_id, sent[2]);
    assert_eq!(store.owner(&stream, &group, sent[0]).as_deref(), Some("bob"));
    assert_eq!(store.owner(&stream, &group, sent[2]).as_deref(), Some("alice"));

    assert_eq!(ids(&bob.consume().await?), sent[2..3]);
    assert!(bob.cursor().next_auto_claim_id.is_origin());

    assert!(alice.consume().await?.is_empty());
    assert_eq!(bob.ack(&sent).await?, 3);
    assert!(matches!(
        alice.ack(&sent).await,
        Err(StreamErr::NoAckedMessage)
    ));
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn missing_group_is_recreated() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    let group = ConsumerGroup::new("workers");
    let sent = push_n(&store, &stream, 2);

    let mut consumer = consumer(&store, &stream, options("workers", "alice")).await;
    store.drop_group(&stream, &group);

    let entries = consumer.consume().await?;
    assert_eq!(ids(&entries), sent);
    assert!(store.has_group(&stream, &group));
    assert_eq!(store.count(Op::CreateGroup), 2);
    assert_eq!(store.count(Op::ReadNew), 2);
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn missing_group_in_pending_tier_is_recreated() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    let sent = push_n(&store, &stream, 1);

    let mut options = options("workers", "alice");
    options.set_pending(PendingTier::Enabled { batch_size: 10 });
    let mut consumer = consumer(&store, &stream, options).await;
    assert_eq!(consumer.consume().await?.len(), 1);

    store.fail(Op::ReadFrom, Fault::GroupMissing);
    store.clear_calls();
    assert_eq!(ids(&consumer.consume().await?), sent);
    assert_eq!(
        store.calls(),
        vec![
            Op::ReadNew,
            Op::ReadFrom,
            Op::Exists,
            Op::CreateGroup,
            Op::ReadFrom
        ]
    );
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn group_recovery_is_bounded() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    push_n(&store, &stream, 1);

    let mut consumer = consumer(&store, &stream, options("workers", "alice")).await;
    store.fail(Op::ReadNew, Fault::GroupMissing);
    store.fail(Op::ReadNew, Fault::GroupMissing);
    store.clear_calls();

    assert!(matches!(
        consumer.consume().await,
        Err(StreamErr::GroupNotFound(_))
    ));
    assert_eq!(store.count(Op::CreateGroup), 1);
    assert_eq!(store.count(Op::ReadNew), 2);

    // the budget is per call
    assert_eq!(consumer.consume().await?.len(), 1);
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn group_recovery_budget_spans_tiers() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    push_n(&store, &stream, 1);

    let mut options = options("workers", "alice");
    options.set_pending(PendingTier::Enabled { batch_size: 10 });
    let mut consumer = consumer(&store, &stream, options).await;
    assert_eq!(consumer.consume().await?.len(), 1);

    store.fail(Op::ReadNew, Fault::GroupMissing);
    store.fail(Op::ReadFrom, Fault::GroupMissing);
    store.clear_calls();

    assert!(matches!(
        consumer.consume().await,
        Err(StreamErr::GroupNotFound(_))
    ));
    assert_eq!(
        store.calls(),
        vec![
            Op::ReadNew,
            Op::Exists,
            Op::CreateGroup,
            Op::ReadNew,
            Op::ReadFrom
        ]
    );
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn other_errors_pass_through() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    push_n(&store, &stream, 1);

    let mut options = options("workers", "alice");
    options.set_pending(PendingTier::Enabled { batch_size: 10 });
    let mut consumer = consumer(&store, &stream, options).await;
    store.fail(Op::ReadNew, Fault::Backend("boom".to_owned()));
    store.clear_calls();

    match consumer.consume().await {
        Err(StreamErr::Backend(MockErr(e))) => assert_eq!(e, "boom"),
        other => panic!("Unexpected {other:?}"),
    }
    assert_eq!(store.calls(), vec![Op::ReadNew]);
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn ack_reports_nothing_acknowledged() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    let group = ConsumerGroup::new("workers");
    let sent = push_n(&store, &stream, 2);

    let mut consumer = consumer(&store, &stream, options("workers", "alice")).await;
    consumer.consume().await?;
    assert_eq!(store.pending_ids(&stream, &group), sent);

    assert_eq!(consumer.ack(&sent).await?, 2);
    assert!(store.pending_ids(&stream, &group).is_empty());
    assert!(matches!(
        consumer.ack(&sent).await,
        Err(StreamErr::NoAckedMessage)
    ));
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn ownership_queries() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    let sent = push_n(&store, &stream, 1);
    let id = sent[0];

    let mut alice = consumer(&store, &stream, options("workers", "alice")).await;
    assert!(matches!(
        alice.pending_record(id).await,
        Err(StreamErr::KeyNotFound(_))
    ));
    alice.consume().await?;

    let record = alice.pending_record(id).await?;
    assert_eq!(record.owner().id(), "alice");
    assert_eq!(record.delivery_count(), 1);
    assert!(alice.still_mine(id).await?);

    let mut options = options("workers", "bob");
    options
        .set_auto_claim(AutoClaimTier::Enabled {
            batch_size: 10,
            min_idle: Duration::from_secs(60),
        })
        .set_still_mine_idle(Duration::from_secs(30));
    let mut bob = consumer(&store, &stream, options).await;
    store.advance(Duration::from_secs(60));
    assert_eq!(ids(&bob.consume().await?), sent);

    assert!(!alice.still_mine(id).await?);
    assert!(matches!(
        alice.pending_record(id).await,
        Err(StreamErr::KeyNotFound(_))
    ));
    assert_eq!(bob.pending_record(id).await?.delivery_count(), 2);

    // bob only considers entries idle for 30 seconds or more
    assert!(!bob.still_mine(id).await?);
    store.advance(Duration::from_secs(30));
    assert!(bob.still_mine(id).await?);
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn create_group_at_position() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    let sent = push_n(&store, &stream, 3);

    let mut consumer =
        GroupConsumer::new(store.clone(), stream.clone(), options("workers", "alice"));
    consumer.create_group(sent[1]).await?;
    assert_eq!(ids(&consumer.consume().await?), sent[2..3]);

    assert!(matches!(
        consumer.create_group(EntryId::ORIGIN).await,
        Err(StreamErr::GroupExists(_))
    ));
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn consume_within_deadline() -> TestResult {
    init_logger();
    let store = MemoryStore::new();
    let stream = stream_key("orders");
    let sent = push_n(&store, &stream, 2);

    let mut consumer = consumer(&store, &stream, options("workers", "alice")).await;
    let entries = consumer.consume_timeout(Duration::from_secs(1)).await?;
    assert_eq!(ids(&entries), sent);
    Ok(())
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn dead_letter_stream_name() -> TestResult {
    let store = MemoryStore::new();
    let stream = stream_key("orders");

    let consumer = GroupConsumer::new(store.clone(), stream.clone(), options("workers", "alice"));
    assert_eq!(consumer.dead_letter_stream()?.name(), "dead:letters:orders");

    let mut custom = options("workers", "alice");
    custom.set_dead_letter_stream(stream_key("graveyard"));
    let consumer = GroupConsumer::new(store.clone(), stream, custom);
    assert_eq!(consumer.dead_letter_stream()?.name(), "graveyard");

    let consumer = GroupConsumer::new(
        store.clone(),
        stream_key("user{42}:events"),
        options("workers", "alice"),
    );
    assert_eq!(
        consumer.dead_letter_stream()?.name(),
        "dead:letters:user{42}:events"
    );

    let long = "x".repeat(240);
    let consumer = GroupConsumer::new(store, stream_key(&long), options("workers", "alice"));
    assert_eq!(
        consumer.dead_letter_stream()?.name(),
        format!("dead:letters:{long}")
    );
    Ok(())
}
