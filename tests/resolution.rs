use cachecrab::cache::cache_key;
use cachecrab::dns::{AnswerSource, PromotionOutcome, Resolution};
use cachecrab::store::RecordStore;
use cachecrab::{Question, StoredRecord};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use trust_dns_server::client::op::ResponseCode;
use trust_dns_server::client::rr::{Name, RData, Record, RecordType};

mod common;
use common::{CountingStore, Fixture};

fn example_a() -> StoredRecord {
    StoredRecord::new("example.com", "A", 300, "203.0.113.5")
}

fn question(qtype: RecordType) -> Option<Question> {
    Some(Question::new("example.com.", qtype))
}

/// Resolve, then run the promotion the response would have triggered to completion.
async fn resolve(fixture: &Fixture, question: Option<Question>) -> Resolution {
    let resolution = fixture.resolver.resolve(question).await;
    if let Some(handle) = fixture.resolver.promote(&resolution) {
        handle.await.unwrap();
    }
    resolution
}

#[tokio::test]
async fn a_record_is_answered_with_stored_ttl() {
    let fixture = Fixture::new([example_a()], 5).await;

    let resolution = resolve(&fixture, question(RecordType::A)).await;

    assert_eq!(resolution.response_code(), ResponseCode::NoError);
    assert_eq!(resolution.source(), Some(AnswerSource::Store));
    assert_eq!(
        resolution.answers(),
        &[Record::from_rdata(
            Name::from_ascii("example.com.").unwrap(),
            300,
            RData::A(Ipv4Addr::new(203, 0, 113, 5))
        )]
    );
}

#[tokio::test]
async fn other_type_for_known_domain_is_empty_success() {
    let fixture = Fixture::new([example_a()], 5).await;

    let resolution = resolve(&fixture, question(RecordType::AAAA)).await;

    assert_eq!(resolution.response_code(), ResponseCode::NoError);
    assert_eq!(resolution.source(), Some(AnswerSource::Store));
    assert!(resolution.answers().is_empty());
    // Nothing of that type to promote.
    assert!(!fixture.cache.contains("example.com", "AAAA").await.unwrap());
}

#[tokio::test]
async fn unknown_pair_is_nxdomain() {
    let fixture = Fixture::new([example_a()], 5).await;

    let resolution = resolve(&fixture, Some(Question::new("nope.example", RecordType::A))).await;

    assert_eq!(resolution, Resolution::Failed(ResponseCode::NXDomain));
    assert!(fixture.resolver.promote(&resolution).is_none());
}

#[tokio::test]
async fn rows_without_servable_answers_are_empty_success() {
    let fixture = Fixture::new(
        [
            StoredRecord::new("example.com", "A", 60, "not-an-address"),
            StoredRecord::new("example.com", "TXT", 60, "hello"),
        ],
        5,
    )
    .await;

    let resolution = resolve(&fixture, question(RecordType::A)).await;

    assert_eq!(resolution.response_code(), ResponseCode::NoError);
    assert!(resolution.answers().is_empty());
}

#[tokio::test]
async fn cached_entry_without_matching_answers_is_empty_success() {
    let fixture = Fixture::new(Vec::new(), 5).await;
    fixture
        .cache
        .put_records("example.com", "AAAA", &[example_a()])
        .await
        .unwrap();

    let resolution = resolve(&fixture, question(RecordType::AAAA)).await;

    assert_eq!(resolution.response_code(), ResponseCode::NoError);
    assert_eq!(resolution.source(), Some(AnswerSource::Cache));
    assert!(resolution.answers().is_empty());
    assert_eq!(fixture.store.lookups(), 0);
}

#[tokio::test]
async fn wildcard_returns_every_type() {
    let fixture = Fixture::new(
        [
            example_a(),
            StoredRecord::new("example.com", "TXT", 60, "hello"),
        ],
        5,
    )
    .await;

    let resolution = resolve(&fixture, question(RecordType::ANY)).await;
    let types: Vec<RecordType> = resolution
        .answers()
        .iter()
        .map(Record::record_type)
        .collect();

    assert_eq!(types, vec![RecordType::A, RecordType::TXT]);
}

#[tokio::test]
async fn invalid_a_value_does_not_fail_the_response() {
    let fixture = Fixture::new(
        [
            StoredRecord::new("example.com", "A", 60, "300.1.1.1"),
            example_a(),
        ],
        5,
    )
    .await;

    let resolution = resolve(&fixture, question(RecordType::A)).await;

    assert_eq!(resolution.response_code(), ResponseCode::NoError);
    assert_eq!(resolution.answers().len(), 1);
    assert_eq!(resolution.answers()[0].ttl(), 300);
}

#[tokio::test]
async fn missing_question_is_formerr_without_io() {
    let fixture = Fixture::new([example_a()], 1).await;

    let resolution = resolve(&fixture, None).await;

    assert_eq!(resolution, Resolution::Failed(ResponseCode::FormErr));
    assert_eq!(fixture.store.lookups(), 0);
    assert!(fixture.resolver.promote(&resolution).is_none());
    assert_eq!(
        fixture.store.read_hits("example.com", "A").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn store_failure_is_servfail() {
    let fixture = Fixture::new([example_a()], 1).await;
    fixture.store.fail_lookups(true);

    let resolution = resolve(&fixture, question(RecordType::A)).await;

    assert_eq!(resolution, Resolution::Failed(ResponseCode::ServFail));
    assert!(!fixture.cache.contains("example.com", "A").await.unwrap());
}

#[tokio::test]
async fn corrupt_cache_entry_falls_back_to_store() {
    let fixture = Fixture::new([example_a()], 5).await;
    fixture
        .cache_store
        .set(
            &cache_key("example.com", "A"),
            b"{not json".to_vec(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let resolution = resolve(&fixture, question(RecordType::A)).await;

    assert_eq!(resolution.source(), Some(AnswerSource::Store));
    assert_eq!(resolution.answers().len(), 1);
    assert_eq!(fixture.store.lookups(), 1);
}

#[tokio::test]
async fn below_threshold_never_writes_the_cache() {
    let fixture = Fixture::new([example_a()], 5).await;

    for _ in 0..4 {
        let resolution = resolve(&fixture, question(RecordType::A)).await;
        assert_eq!(resolution.source(), Some(AnswerSource::Store));
    }

    assert!(!fixture.cache.contains("example.com", "A").await.unwrap());
    assert_eq!(fixture.store.lookups(), 4);
}

#[tokio::test]
async fn threshold_crossing_promotes_to_cache() {
    let fixture = Fixture::new([example_a()], 2).await;

    for _ in 0..2 {
        let resolution = resolve(&fixture, question(RecordType::A)).await;
        assert_eq!(resolution.source(), Some(AnswerSource::Store));
    }
    assert!(fixture.cache.contains("example.com", "A").await.unwrap());
    // Two resolutions plus the promotion's re-fetch.
    let lookups = fixture.store.lookups();
    assert_eq!(lookups, 3);

    let resolution = resolve(&fixture, question(RecordType::A)).await;
    assert_eq!(resolution.source(), Some(AnswerSource::Cache));
    assert_eq!(resolution.answers().len(), 1);
    assert_eq!(fixture.store.lookups(), lookups);
}

#[tokio::test]
async fn cache_hits_keep_counting_without_rewriting() {
    let fixture = Fixture::new([example_a()], 1).await;
    resolve(&fixture, question(RecordType::A)).await;
    let lookups = fixture.store.lookups();

    let resolution = fixture.resolver.resolve(question(RecordType::A)).await;
    let outcome = fixture
        .resolver
        .promote(&resolution)
        .unwrap()
        .await
        .unwrap();

    assert_eq!(outcome, PromotionOutcome::AlreadyCached { hits: 2 });
    assert_eq!(fixture.store.lookups(), lookups);
}

#[tokio::test]
async fn cached_snapshot_does_not_track_store_changes() {
    let fixture = Fixture::new([example_a()], 1).await;
    resolve(&fixture, question(RecordType::A)).await;

    fixture
        .store
        .upsert(&StoredRecord::new("example.com", "A", 300, "203.0.113.9"))
        .await
        .unwrap();

    let resolution = resolve(&fixture, question(RecordType::A)).await;
    assert_eq!(resolution.source(), Some(AnswerSource::Cache));
    assert_eq!(resolution.answers().len(), 1);
}

#[tokio::test]
async fn concurrent_cold_lookups_all_reach_the_store() {
    let store = CountingStore::with_records([example_a()])
        .await
        .with_lookup_delay(Duration::from_millis(20));
    let fixture = Arc::new(Fixture::with_store(store, 1000));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let fixture = fixture.clone();
            tokio::spawn(async move { fixture.resolver.resolve(question(RecordType::A)).await })
        })
        .collect();
    for task in tasks {
        let resolution = task.await.unwrap();
        assert_eq!(resolution.source(), Some(AnswerSource::Store));
    }

    assert_eq!(fixture.store.lookups(), 8);
}

#[tokio::test]
async fn promotions_stop_after_shutdown() {
    let fixture = Fixture::new([example_a()], 1).await;
    fixture.resolver.promoter().shutdown();

    let resolution = fixture.resolver.resolve(question(RecordType::A)).await;

    assert_eq!(resolution.response_code(), ResponseCode::NoError);
    assert!(fixture.resolver.promote(&resolution).is_none());
    fixture.resolver.promoter().wait_idle().await;
    assert!(!fixture.cache.contains("example.com", "A").await.unwrap());
}
