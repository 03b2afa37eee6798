//! Built-in system guide chunks and the seeding routine behind the
//! `seed-guides` CLI command.
//!
//! Guide chunks live in the content collection under category `"system"`,
//! where session start snapshots them by `topic_id`. Ids are fixed so
//! re-seeding overwrites in place instead of accumulating copies.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::lore::index::MetadataIndex;
use crate::lore::now_rfc3339;
use crate::lore::types::{Chunk, ChunkMetadata, Importance};
use crate::vector::VectorStore;

struct SystemGuide {
    id: &'static str,
    topic_id: &'static str,
    keywords: &'static [&'static str],
    questions: &'static [&'static str],
    text: &'static str,
}

const SYSTEM_GUIDES: &[SystemGuide] = &[
    SystemGuide {
        id: "guide-chunking-principles",
        topic_id: "chunking_principles",
        keywords: &["chunking", "splitting", "guidance", "context"],
        questions: &[
            "How should knowledge be split into chunks?",
            "How big should a chunk be?",
        ],
        text: "Split knowledge into semantically independent units. Keep the \
               smallest unit that still carries its own context, and make \
               sure each chunk fully answers the questions attached to it. \
               Aim for 100 to 512 tokens per chunk.",
    },
    SystemGuide {
        id: "guide-metadata-rules",
        topic_id: "metadata_rules",
        keywords: &["metadata", "keywords", "questions", "entities"],
        questions: &[
            "Which metadata fields are required on a chunk?",
            "How should chunk questions be phrased?",
        ],
        text: "Every chunk needs a stable topic_id, a category, 3 to 10 \
               keywords, the questions it can answer, and its named entities \
               each tagged with a type. Phrase questions the way a reader \
               would actually search for them.",
    },
];

/// Upsert the built-in guides into `collection`. Aggregates are only
/// incremented for guides not already present, so repeat runs leave the
/// index counts untouched. Returns the number of guides written.
pub async fn seed(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    index: &MetadataIndex,
    collection: &str,
) -> Result<usize> {
    for guide in SYSTEM_GUIDES {
        let now = now_rfc3339();
        let chunk = Chunk {
            id: Some(guide.id.to_string()),
            text: guide.text.to_string(),
            metadata: ChunkMetadata {
                topic_id: guide.topic_id.to_string(),
                topic_name: None,
                category: "system".into(),
                sub_category: None,
                keywords: guide.keywords.iter().map(|k| k.to_string()).collect(),
                questions: guide.questions.iter().map(|q| q.to_string()).collect(),
                entities: vec![],
                importance: Importance::High,
                source: Some("system-seed".into()),
                rest_session_id: None,
                created_at: now.clone(),
                updated_at: now,
            },
        };

        let fresh = store.get_by_id(collection, guide.id).await?.is_none();
        let vector = embedder.embed(guide.text).await?;
        store
            .upsert(collection, guide.id, vector, chunk.to_payload())
            .await?;
        if fresh {
            index.on_chunk_created(&chunk.metadata).await?;
        }
    }

    tracing::info!(collection, count = SYSTEM_GUIDES.len(), "system guides seeded");
    Ok(SYSTEM_GUIDES.len())
}
