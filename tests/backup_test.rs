mod helpers;

use grimoire::lore::backup;
use grimoire::lore::store::Target;
use grimoire::lore::types::{Backup, BackupChunk};
use helpers::{chunk, engine, CANON};

#[tokio::test]
async fn export_then_import_restores_chunks_and_index() {
    let source = engine().await;
    let session = source.open_session().await;

    for (topic, category, text) in [
        ("auth", "architecture", "sessions are stored server side"),
        ("cache", "architecture", "the cache invalidates on write"),
    ] {
        source
            .chunks
            .scribe(
                &session,
                Target::Canon,
                chunk(topic, category, text),
                None,
                None,
                None,
            )
            .await
            .unwrap();
    }

    let document = backup::export(source.vectors.as_ref(), CANON, 10_000)
        .await
        .unwrap();
    assert_eq!(document.version, backup::BACKUP_VERSION);
    assert_eq!(document.total_chunks, 2);
    assert!(document.exported_at.is_some());

    // Round-trip through JSON, as a tool client would see it.
    let raw = serde_json::to_string(&document).unwrap();
    let document: Backup = serde_json::from_str(&raw).unwrap();

    let target = engine().await;
    let report = backup::import(
        target.vectors.as_ref(),
        target.embedder.as_ref(),
        &target.canon_index,
        CANON,
        document,
    )
    .await
    .unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.failed, 0);

    let stats = target.vectors.stats(CANON).await.unwrap();
    assert_eq!(stats.total_count, 2);

    let index = target.canon_index.get_index(None).await.unwrap();
    assert_eq!(index.total_chunks, 2);
    assert_eq!(index.total_topics, 2);

    // Imported chunks are re-embedded and searchable.
    let hits = target
        .searcher
        .semantic_search(CANON, "sessions are stored server side", 5, None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk["topic_id"], "auth");
}

#[tokio::test]
async fn import_fills_missing_metadata_with_defaults() {
    let eng = engine().await;

    let document = Backup {
        version: backup::BACKUP_VERSION.to_string(),
        exported_at: None,
        total_chunks: 1,
        chunks: vec![BackupChunk {
            id: None,
            text: "a bare chunk from a hand written backup".into(),
            topic_id: None,
            topic_name: None,
            category: None,
            sub_category: None,
            keywords: None,
            questions: None,
            entities: None,
            importance: None,
            source: None,
            created_at: None,
            updated_at: None,
        }],
    };

    let report = backup::import(
        eng.vectors.as_ref(),
        eng.embedder.as_ref(),
        &eng.canon_index,
        CANON,
        document,
    )
    .await
    .unwrap();
    assert_eq!(report.imported, 1);

    let points = eng.vectors.scroll(CANON, 10, None).await.unwrap();
    assert_eq!(points.len(), 1);
    let payload = &points[0].payload;
    assert_eq!(payload["topic_id"], "imported");
    assert_eq!(payload["category"], "imported");
    assert_eq!(payload["importance"], "medium");
    assert_eq!(payload["source"], "backup-import");
    assert!(payload["created_at"].as_str().is_some());

    let stats = eng.canon_index.get_category_stats().await.unwrap();
    assert_eq!(stats.get("imported"), Some(&1));
}

#[tokio::test]
async fn import_reports_failures_without_aborting() {
    let eng = engine().await;

    let good = BackupChunk {
        id: None,
        text: "a normal chunk that embeds fine".into(),
        topic_id: Some("ok".into()),
        topic_name: None,
        category: Some("notes".into()),
        sub_category: None,
        keywords: None,
        questions: None,
        entities: None,
        importance: None,
        source: None,
        created_at: None,
        updated_at: None,
    };
    // Importing into a collection that does not exist fails per chunk
    // rather than erroring the whole call.
    let document = Backup {
        version: backup::BACKUP_VERSION.to_string(),
        exported_at: None,
        total_chunks: 1,
        chunks: vec![good],
    };

    let report = backup::import(
        eng.vectors.as_ref(),
        eng.embedder.as_ref(),
        &eng.canon_index,
        "no_such_collection",
        document,
    )
    .await
    .unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
}
