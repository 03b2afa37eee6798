#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use grimoire::config::RetrievalConfig;
use grimoire::embedding::Embedder;
use grimoire::error::{Error, Result};
use grimoire::lore::index::MetadataIndex;
use grimoire::lore::manager::LoreManager;
use grimoire::lore::search::Searcher;
use grimoire::lore::session::RestSessions;
use grimoire::lore::store::ChunkStore;
use grimoire::lore::types::{Chunk, ChunkMetadata, Importance};
use grimoire::vector::filter::Filter;
use grimoire::vector::{CollectionStats, ScoredPoint, StoredPoint, VectorStore};

pub const CANON: &str = "canon";
pub const CANON_META: &str = "canon_metadata";

#[derive(Default)]
struct Collection {
    dim: usize,
    points: BTreeMap<String, (Vec<f32>, Value)>,
}

/// In-memory stand-in for the vector store. Scores are raw dot products,
/// which equal cosine similarity because every embedder in the tests
/// produces unit-length vectors.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut HashMap<String, Collection>) -> T) -> T {
        let mut collections = self.collections.lock().unwrap();
        f(&mut collections)
    }
}

fn missing(collection: &str) -> Error {
    Error::NotFound(format!("collection not found: {collection}"))
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn create_collection(&self, name: &str, vector_dim: usize) -> Result<()> {
        self.with(|c| {
            c.insert(
                name.to_string(),
                Collection {
                    dim: vector_dim,
                    points: BTreeMap::new(),
                },
            );
        });
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.with(|c| c.contains_key(name)))
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.with(|c| c.remove(name));
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut names = self.with(|c| c.keys().cloned().collect::<Vec<_>>());
        names.sort();
        Ok(names)
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: Vec<f32>,
        payload: Value,
    ) -> Result<()> {
        self.with(|c| {
            let col = c.get_mut(collection).ok_or_else(|| missing(collection))?;
            col.points.insert(id.to_string(), (vector, payload));
            Ok(())
        })
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<StoredPoint>> {
        self.with(|c| {
            let col = c.get(collection).ok_or_else(|| missing(collection))?;
            Ok(col.points.get(id).map(|(_, payload)| StoredPoint {
                id: id.to_string(),
                payload: payload.clone(),
            }))
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.with(|c| {
            let col = c.get_mut(collection).ok_or_else(|| missing(collection))?;
            col.points.remove(id);
            Ok(())
        })
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&Filter>,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>> {
        let mut hits = self.with(|c| {
            let col = c.get(collection).ok_or_else(|| missing(collection))?;
            let mut hits = Vec::new();
            for (id, (stored, payload)) in &col.points {
                if let Some(f) = filter {
                    if !f.matches(payload) {
                        continue;
                    }
                }
                let score: f32 = stored.iter().zip(vector).map(|(a, b)| a * b).sum();
                if let Some(floor) = score_threshold {
                    if score < floor {
                        continue;
                    }
                }
                hits.push(ScoredPoint {
                    id: id.clone(),
                    score,
                    payload: payload.clone(),
                });
            }
            Ok::<_, Error>(hits)
        })?;
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(limit);
        Ok(hits)
    }

    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<StoredPoint>> {
        self.with(|c| {
            let col = c.get(collection).ok_or_else(|| missing(collection))?;
            Ok(col
                .points
                .iter()
                .filter(|(_, (_, payload))| filter.is_none_or(|f| f.matches(payload)))
                .take(limit)
                .map(|(id, (_, payload))| StoredPoint {
                    id: id.clone(),
                    payload: payload.clone(),
                })
                .collect())
        })
    }

    async fn stats(&self, collection: &str) -> Result<CollectionStats> {
        self.with(|c| {
            let col = c.get(collection).ok_or_else(|| missing(collection))?;
            let count = col.points.len() as u64;
            Ok(CollectionStats {
                total_count: count,
                vector_count: count,
            })
        })
    }
}

pub const TEST_DIM: usize = 32;

/// Deterministic bag-of-words embedder: each lowercased word hashes to one
/// dimension. Identical texts embed identically; texts sharing most words
/// land close in cosine space.
pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; TEST_DIM];
        for word in text.to_lowercase().split_whitespace() {
            let mut h: u64 = 0xcbf29ce484222325;
            for b in word.bytes() {
                h ^= b as u64;
                h = h.wrapping_mul(0x100000001b3);
            }
            v[(h % TEST_DIM as u64) as usize] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            v[0] = 1.0;
        } else {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }
}

/// The fully wired engine over in-memory collaborators.
pub struct TestEngine {
    pub vectors: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub searcher: Arc<Searcher>,
    pub sessions: Arc<RestSessions>,
    pub lores: Arc<LoreManager>,
    pub chunks: Arc<ChunkStore>,
    pub canon_index: Arc<MetadataIndex>,
}

impl TestEngine {
    /// Open a REST session and return its id.
    pub async fn open_session(&self) -> String {
        self.sessions
            .start(&self.searcher, CANON)
            .await
            .unwrap()
            .session_id
    }
}

/// Build the engine with canon collections provisioned, mirroring server
/// startup.
pub async fn engine() -> TestEngine {
    let vectors: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder);
    let retrieval = RetrievalConfig::default();

    vectors.create_collection(CANON, TEST_DIM).await.unwrap();
    let canon_index = Arc::new(MetadataIndex::new(
        Arc::clone(&vectors),
        CANON_META,
        retrieval.scroll_page_size,
    ));
    canon_index.initialize().await.unwrap();

    let searcher = Arc::new(Searcher::new(
        Arc::clone(&vectors),
        Arc::clone(&embedder),
        retrieval.clone(),
    ));
    let sessions = Arc::new(RestSessions::default());
    let lores = Arc::new(LoreManager::new(
        Arc::clone(&vectors),
        CANON_META,
        TEST_DIM,
        retrieval.scroll_page_size,
    ));
    let chunks = Arc::new(ChunkStore::new(
        Arc::clone(&vectors),
        Arc::clone(&embedder),
        Arc::clone(&searcher),
        Arc::clone(&sessions),
        Arc::clone(&lores),
        CANON,
        Arc::clone(&canon_index),
    ));

    TestEngine {
        vectors,
        embedder,
        searcher,
        sessions,
        lores,
        chunks,
        canon_index,
    }
}

/// A minimal valid chunk for write-path tests.
pub fn chunk(topic_id: &str, category: &str, text: &str) -> Chunk {
    Chunk {
        id: None,
        text: text.to_string(),
        metadata: ChunkMetadata {
            topic_id: topic_id.to_string(),
            topic_name: Some(format!("Topic {topic_id}")),
            category: category.to_string(),
            sub_category: None,
            keywords: vec!["alpha".into(), "beta".into()],
            questions: vec![],
            entities: vec![],
            importance: Importance::Medium,
            source: None,
            rest_session_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        },
    }
}
