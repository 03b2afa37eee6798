//! Retrieval engine — semantic search, hybrid keyword search, and
//! near-duplicate detection over one content collection at a time.

use std::sync::Arc;

use serde_json::Value;

use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::lore::types::SearchResult;
use crate::vector::filter::{convert_filter, Condition, Filter};
use crate::vector::VectorStore;

pub struct Searcher {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    config: RetrievalConfig,
}

impl Searcher {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    /// Embed the query, translate the filter, and search with the semantic
    /// similarity floor. Results come back ordered by descending score; ties
    /// keep the store's native order.
    pub async fn semantic_search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
        filter: Option<&Value>,
    ) -> Result<Vec<SearchResult>> {
        let vector = self.embedder.embed(query).await?;
        let filter = convert_filter(filter);
        let hits = self
            .store
            .search(
                collection,
                &vector,
                limit,
                filter.as_ref(),
                Some(self.config.semantic_score_floor),
            )
            .await?;
        Ok(to_results(hits))
    }

    /// Hybrid keyword search: a lower-cased any-match condition on the
    /// `keywords` field is ANDed into the user filter, and the space-joined
    /// keywords are embedded as a semantic proxy query. The similarity floor
    /// is lower than semantic search — the keyword filter already narrows
    /// the candidate set.
    pub async fn keyword_search(
        &self,
        collection: &str,
        keywords: &[String],
        limit: usize,
        filter: Option<&Value>,
    ) -> Result<Vec<SearchResult>> {
        let lowered: Vec<Value> = keywords
            .iter()
            .map(|k| Value::String(k.to_lowercase()))
            .collect();
        let keyword_condition = Condition::any("keywords", lowered);

        let mut combined = convert_filter(filter).unwrap_or_default();
        combined.must.push(keyword_condition);

        let vector = self.embedder.embed(&keywords.join(" ")).await?;
        let hits = self
            .store
            .search(
                collection,
                &vector,
                limit,
                Some(&combined),
                Some(self.config.keyword_score_floor),
            )
            .await?;
        Ok(to_results(hits))
    }

    /// Near-duplicate detection at the configured threshold, limit 5.
    /// Returns `None` when nothing clears the floor. A `Some` result is a
    /// warning signal for the caller, not a hard block.
    pub async fn detect_duplicates(
        &self,
        collection: &str,
        text: &str,
        threshold: Option<f32>,
    ) -> Result<Option<Vec<SearchResult>>> {
        let vector = self.embedder.embed(text).await?;
        let threshold = threshold.unwrap_or(self.config.dedup_threshold);
        let hits = self
            .store
            .search(collection, &vector, 5, None, Some(threshold))
            .await?;
        if hits.is_empty() {
            Ok(None)
        } else {
            Ok(Some(to_results(hits)))
        }
    }

    /// All chunks of one topic. Unscored structured scan; the sentinel score
    /// of 1.0 carries no ranking meaning.
    pub async fn get_by_topic(&self, collection: &str, topic_id: &str) -> Result<Vec<SearchResult>> {
        let filter = Filter::must(Condition::value("topic_id", topic_id));
        let points = self
            .store
            .scroll(collection, self.config.scroll_page_size.min(100), Some(&filter))
            .await?;
        Ok(points
            .into_iter()
            .map(|p| SearchResult {
                id: p.id,
                score: 1.0,
                chunk: p.payload,
            })
            .collect())
    }

    /// Chunks of one category, bounded. Same sentinel-score caveat as
    /// [`Self::get_by_topic`].
    pub async fn get_by_category(
        &self,
        collection: &str,
        category: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let filter = Filter::must(Condition::value("category", category));
        let points = self.store.scroll(collection, limit, Some(&filter)).await?;
        Ok(points
            .into_iter()
            .map(|p| SearchResult {
                id: p.id,
                score: 1.0,
                chunk: p.payload,
            })
            .collect())
    }
}

fn to_results(hits: Vec<crate::vector::ScoredPoint>) -> Vec<SearchResult> {
    hits.into_iter()
        .map(|hit| SearchResult {
            id: hit.id,
            score: hit.score,
            chunk: hit.payload,
        })
        .collect()
}
