mod helpers;

use std::sync::Arc;

use grimoire::lore::index::MetadataIndex;
use grimoire::lore::types::{ChunkMetadata, Importance};
use grimoire::vector::VectorStore;
use helpers::MemoryStore;

fn meta(topic_id: &str, category: &str, keywords: &[&str]) -> ChunkMetadata {
    ChunkMetadata {
        topic_id: topic_id.to_string(),
        topic_name: Some(format!("Topic {topic_id}")),
        category: category.to_string(),
        sub_category: None,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        questions: vec![],
        entities: vec![],
        importance: Importance::Medium,
        source: None,
        rest_session_id: None,
        created_at: "2026-08-26T00:00:00Z".into(),
        updated_at: "2026-08-26T00:00:00Z".into(),
    }
}

async fn index() -> (Arc<dyn VectorStore>, MetadataIndex) {
    let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
    let index = MetadataIndex::new(Arc::clone(&store), "meta", 1000);
    index.initialize().await.unwrap();
    (store, index)
}

#[tokio::test]
async fn aggregates_accumulate_across_chunks() {
    let (_store, index) = index().await;

    index
        .on_chunk_created(&meta("auth", "architecture", &["jwt", "tokens"]))
        .await
        .unwrap();
    index
        .on_chunk_created(&meta("auth", "architecture", &["tokens", "refresh"]))
        .await
        .unwrap();
    index
        .on_chunk_created(&meta("cache", "architecture", &["redis"]))
        .await
        .unwrap();

    let view = index.get_index(None).await.unwrap();
    assert_eq!(view.total_topics, 2);
    assert_eq!(view.total_chunks, 3);
    assert_eq!(view.categories.len(), 1);

    let arch = &view.categories[0];
    assert_eq!(arch.name, "architecture");
    assert_eq!(arch.topic_count, 2);
    assert_eq!(arch.chunk_count, 3);
}

#[tokio::test]
async fn topic_keywords_merge_without_duplicates() {
    let (store, index) = index().await;

    index
        .on_chunk_created(&meta("auth", "architecture", &["jwt", "tokens"]))
        .await
        .unwrap();
    index
        .on_chunk_created(&meta("auth", "architecture", &["tokens", "refresh"]))
        .await
        .unwrap();

    let record = store.get_by_id("meta", "topic:auth").await.unwrap().unwrap();
    let keywords: Vec<String> =
        serde_json::from_value(record.payload["keywords"].clone()).unwrap();
    assert_eq!(keywords, vec!["jwt", "tokens", "refresh"]);
    assert_eq!(record.payload["chunk_count"], 2);
}

#[tokio::test]
async fn zero_counts_delete_the_aggregate_records() {
    let (_store, index) = index().await;

    let m = meta("auth", "architecture", &["jwt"]);
    index.on_chunk_created(&m).await.unwrap();
    index.on_chunk_deleted(&m).await.unwrap();

    let view = index.get_index(None).await.unwrap();
    assert!(view.categories.is_empty());
    assert_eq!(view.total_topics, 0);
    assert_eq!(view.total_chunks, 0);
}

#[tokio::test]
async fn topic_reuse_across_categories_keeps_both_category_counts() {
    let (store, index) = index().await;

    index
        .on_chunk_created(&meta("shared", "architecture", &["a"]))
        .await
        .unwrap();
    index
        .on_chunk_created(&meta("shared", "ops", &["b"]))
        .await
        .unwrap();

    // The topic record follows the most recent write.
    let record = store.get_by_id("meta", "topic:shared").await.unwrap().unwrap();
    assert_eq!(record.payload["category"], "ops");
    assert_eq!(record.payload["chunk_count"], 2);

    // Both category aggregates keep their own chunk counts.
    let stats = index.get_category_stats().await.unwrap();
    assert_eq!(stats.get("architecture"), Some(&1));
    assert_eq!(stats.get("ops"), Some(&1));
}

#[tokio::test]
async fn get_index_scope_narrows_to_one_category() {
    let (_store, index) = index().await;

    index
        .on_chunk_created(&meta("t1", "architecture", &["a"]))
        .await
        .unwrap();
    index
        .on_chunk_created(&meta("t2", "ops", &["b"]))
        .await
        .unwrap();

    let view = index.get_index(Some("ops")).await.unwrap();
    assert_eq!(view.categories.len(), 1);
    assert_eq!(view.categories[0].name, "ops");
    assert_eq!(view.total_chunks, 1);
    assert_eq!(view.total_topics, 1);
}

#[tokio::test]
async fn sub_categories_union_on_the_category_record() {
    let (store, index) = index().await;

    let mut a = meta("t1", "ops", &["a"]);
    a.sub_category = Some("alerting".into());
    let mut b = meta("t2", "ops", &["b"]);
    b.sub_category = Some("paging".into());
    let mut c = meta("t3", "ops", &["c"]);
    c.sub_category = Some("alerting".into());

    for m in [&a, &b, &c] {
        index.on_chunk_created(m).await.unwrap();
    }

    let record = store.get_by_id("meta", "cat:ops").await.unwrap().unwrap();
    let subs: Vec<String> =
        serde_json::from_value(record.payload["sub_categories"].clone()).unwrap();
    assert_eq!(subs, vec!["alerting", "paging"]);
    assert_eq!(record.payload["topic_count"], 3);
}
