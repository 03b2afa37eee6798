pub mod admin;
pub mod lore;
pub mod recall;
pub mod rest;
pub mod scribe;

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use serde_json::json;

use admin::{ExportParams, FilterGuideParams, GetIndexParams, ImportParams, StatsParams};
use lore::{
    ChronicleParams, EraseLoreParams, LoreDeleteParams, LoreStatsParams, LoresParams,
    ReviseLoreParams,
};
use recall::{FindParams, GetTopicParams, MemorizeParams, RecallFindParams, RecallParams};
use rest::{RestEndParams, RestParams};
use scribe::{EraseParams, ReviseParams, ScribeParams};

use crate::config::GrimoireConfig;
use crate::embedding::Embedder;
use crate::error::Error;
use crate::lore::backup;
use crate::lore::index::MetadataIndex;
use crate::lore::manager::LoreManager;
use crate::lore::search::Searcher;
use crate::lore::session::RestSessions;
use crate::lore::store::{ChunkStore, Target};
use crate::lore::types::Backup;
use crate::vector::filter;
use crate::vector::VectorStore;

/// The Grimoire MCP tool handler. Holds shared state (vector store,
/// embedder, sessions, lore manager) and exposes all MCP tools via the
/// `#[tool_router]` macro.
#[derive(Clone)]
pub struct GrimoireTools {
    tool_router: ToolRouter<Self>,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    searcher: Arc<Searcher>,
    sessions: Arc<RestSessions>,
    lores: Arc<LoreManager>,
    chunks: Arc<ChunkStore>,
    canon_index: Arc<MetadataIndex>,
    config: Arc<GrimoireConfig>,
}

/// Serialize a tool result. Domain failures are rendered as structured
/// `{"status":"error",...}` payloads rather than MCP protocol errors, so a
/// model client can read and react to them.
fn render<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

fn fail(err: Error) -> Result<String, String> {
    tracing::warn!(kind = err.kind(), %err, "tool call failed");
    Ok(json!({
        "status": "error",
        "kind": err.kind(),
        "message": err.to_string(),
    })
    .to_string())
}

#[tool_router]
impl GrimoireTools {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        searcher: Arc<Searcher>,
        sessions: Arc<RestSessions>,
        lores: Arc<LoreManager>,
        chunks: Arc<ChunkStore>,
        canon_index: Arc<MetadataIndex>,
        config: Arc<GrimoireConfig>,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            vectors,
            embedder,
            searcher,
            sessions,
            lores,
            chunks,
            canon_index,
            config,
        }
    }

    fn canon_collection(&self) -> &str {
        &self.config.qdrant.collection
    }

    // ── REST sessions ─────────────────────────────────────────────────────

    /// Open a time-boxed write session.
    #[tool(
        description = "Start a REST (knowledge-writing) session. Returns a session_id plus chunking and metadata guidance. Required before scribe/chronicle; sessions expire after 1 hour."
    )]
    async fn rest(&self, Parameters(_params): Parameters<RestParams>) -> Result<String, String> {
        tracing::info!("rest called");
        match self
            .sessions
            .start(&self.searcher, self.canon_collection())
            .await
        {
            Ok(start) => render(&start),
            Err(err) => fail(err),
        }
    }

    /// Close a write session.
    #[tool(description = "End a REST session. Returns the number of chunks scribed during it.")]
    async fn rest_end(
        &self,
        Parameters(params): Parameters<RestEndParams>,
    ) -> Result<String, String> {
        match self.sessions.end(&params.session_id) {
            Ok(scribed) => render(&json!({
                "status": "success",
                "session_id": params.session_id,
                "scribed_count": scribed,
            })),
            Err(err) => fail(err),
        }
    }

    // ── Canon writes ──────────────────────────────────────────────────────

    /// Store a chunk in the canon namespace.
    #[tool(
        description = "Store a knowledge chunk in canon. Requires an active REST session. Near-duplicate text returns a warning and stores nothing."
    )]
    async fn scribe(
        &self,
        Parameters(params): Parameters<ScribeParams>,
    ) -> Result<String, String> {
        tracing::info!(topic_id = %params.chunk.topic_id, "scribe called");
        match self
            .chunks
            .scribe(
                &params.session_id,
                Target::Canon,
                params.chunk.into_chunk(),
                None,
                params.source.as_deref(),
                None,
            )
            .await
        {
            Ok(outcome) => render(&outcome),
            Err(err) => fail(err),
        }
    }

    /// Delete a canon chunk by id.
    #[tool(description = "Delete a chunk from canon by id. Topic and category counts are updated.")]
    async fn erase(&self, Parameters(params): Parameters<EraseParams>) -> Result<String, String> {
        match self.chunks.erase(Target::Canon, &params.chunk_id).await {
            Ok(message) => render(&json!({"status": "success", "message": message})),
            Err(err) => fail(err),
        }
    }

    /// Replace a canon chunk's text.
    #[tool(
        description = "Replace a canon chunk's text by id. The chunk is re-embedded; metadata is preserved."
    )]
    async fn revise(
        &self,
        Parameters(params): Parameters<ReviseParams>,
    ) -> Result<String, String> {
        match self
            .chunks
            .revise(Target::Canon, &params.chunk_id, &params.new_text)
            .await
        {
            Ok(message) => render(&json!({"status": "success", "message": message})),
            Err(err) => fail(err),
        }
    }

    // ── Canon retrieval ───────────────────────────────────────────────────

    /// Semantic search over canon.
    #[tool(
        description = "Search canon by meaning. Returns chunks ranked by similarity; results below the similarity floor are dropped."
    )]
    async fn memorize(
        &self,
        Parameters(params): Parameters<MemorizeParams>,
    ) -> Result<String, String> {
        tracing::info!(query = %params.query, "memorize called");
        let limit = params.limit.unwrap_or_else(|| self.searcher.default_limit());
        match self
            .searcher
            .semantic_search(
                self.canon_collection(),
                &params.query,
                limit,
                params.filter.as_ref(),
            )
            .await
        {
            Ok(results) => {
                let total = results.len();
                render(&json!({"results": results, "total": total}))
            }
            Err(err) => fail(err),
        }
    }

    /// Keyword search over canon.
    #[tool(
        description = "Search canon by keywords. Matches chunk keyword lists exactly (case-insensitive), ranked by relevance to the joined keywords."
    )]
    async fn find(&self, Parameters(params): Parameters<FindParams>) -> Result<String, String> {
        let limit = params.limit.unwrap_or_else(|| self.searcher.default_limit());
        match self
            .searcher
            .keyword_search(
                self.canon_collection(),
                &params.keywords,
                limit,
                params.filter.as_ref(),
            )
            .await
        {
            Ok(results) => {
                let total = results.len();
                render(&json!({"results": results, "total": total}))
            }
            Err(err) => fail(err),
        }
    }

    /// Fetch every chunk of one topic.
    #[tool(description = "Fetch all canon chunks belonging to a topic_id.")]
    async fn get_topic(
        &self,
        Parameters(params): Parameters<GetTopicParams>,
    ) -> Result<String, String> {
        match self
            .searcher
            .get_by_topic(self.canon_collection(), &params.topic_id)
            .await
        {
            Ok(results) => {
                let total = results.len();
                render(&json!({
                    "topic_id": params.topic_id,
                    "chunks": results,
                    "total": total,
                }))
            }
            Err(err) => fail(err),
        }
    }

    // ── Canon administration ──────────────────────────────────────────────

    /// Store-level statistics.
    #[tool(description = "Get canon statistics: chunk counts and per-category totals.")]
    async fn stats(&self, Parameters(_params): Parameters<StatsParams>) -> Result<String, String> {
        let collection_stats = match self.vectors.stats(self.canon_collection()).await {
            Ok(s) => s,
            Err(err) => return fail(err),
        };
        match self.canon_index.get_category_stats().await {
            Ok(categories) => render(&json!({
                "total_chunks": collection_stats.total_count,
                "categories": categories,
            })),
            Err(err) => fail(err),
        }
    }

    /// Browse the category/topic index.
    #[tool(
        description = "Get the canon metadata index: categories with topic and chunk counts. Pass scope to narrow to one category."
    )]
    async fn get_index(
        &self,
        Parameters(params): Parameters<GetIndexParams>,
    ) -> Result<String, String> {
        match self.canon_index.get_index(params.scope.as_deref()).await {
            Ok(index) => render(&index),
            Err(err) => fail(err),
        }
    }

    /// Export canon to a portable backup document.
    #[tool(description = "Export every canon chunk as a JSON backup document.")]
    async fn export(
        &self,
        Parameters(_params): Parameters<ExportParams>,
    ) -> Result<String, String> {
        match backup::export(
            self.vectors.as_ref(),
            self.canon_collection(),
            self.config.retrieval.export_page_size,
        )
        .await
        {
            Ok(document) => render(&document),
            Err(err) => fail(err),
        }
    }

    /// Restore a backup document into canon.
    #[tool(
        description = "Import a backup document into canon. Chunks are re-embedded; failures are reported per chunk without aborting the batch."
    )]
    async fn import(
        &self,
        Parameters(params): Parameters<ImportParams>,
    ) -> Result<String, String> {
        let document: Backup = match serde_json::from_value(params.backup) {
            Ok(d) => d,
            Err(e) => return fail(Error::Validation(format!("malformed backup document: {e}"))),
        };
        match backup::import(
            self.vectors.as_ref(),
            self.embedder.as_ref(),
            &self.canon_index,
            self.canon_collection(),
            document,
        )
        .await
        {
            Ok(report) => render(&json!({
                "status": if report.failed == 0 { "success" } else { "warning" },
                "imported": report.imported,
                "failed": report.failed,
                "errors": report.errors,
            })),
            Err(err) => fail(err),
        }
    }

    /// Filter syntax reference.
    #[tool(description = "Get the metadata filter syntax guide with examples.")]
    async fn filter_guide(
        &self,
        Parameters(_params): Parameters<FilterGuideParams>,
    ) -> Result<String, String> {
        render(&json!({"guide": filter::filter_guide()}))
    }

    // ── Lores ─────────────────────────────────────────────────────────────

    /// Store a chunk in a named lore.
    #[tool(
        description = "Store a knowledge chunk in a named lore (isolated namespace). The lore is created on first use. Requires an active REST session."
    )]
    async fn chronicle(
        &self,
        Parameters(params): Parameters<ChronicleParams>,
    ) -> Result<String, String> {
        tracing::info!(lore = %params.lore_name, "chronicle called");
        match self
            .chunks
            .scribe(
                &params.session_id,
                Target::Lore(&params.lore_name),
                params.chunk.into_chunk(),
                params.category.as_deref(),
                params.source.as_deref(),
                params.description.as_deref(),
            )
            .await
        {
            Ok(outcome) => render(&outcome),
            Err(err) => fail(err),
        }
    }

    /// Semantic search within one lore.
    #[tool(description = "Search a lore by meaning. Same ranking and filters as memorize.")]
    async fn recall(
        &self,
        Parameters(params): Parameters<RecallParams>,
    ) -> Result<String, String> {
        if let Err(err) = self.require_lore(&params.lore_name).await {
            return fail(err);
        }
        let limit = params.limit.unwrap_or_else(|| self.searcher.default_limit());
        match self
            .searcher
            .semantic_search(
                &self.lores.collection_name(&params.lore_name),
                &params.query,
                limit,
                params.filter.as_ref(),
            )
            .await
        {
            Ok(results) => {
                let total = results.len();
                render(&json!({
                    "lore": params.lore_name,
                    "results": results,
                    "total": total,
                }))
            }
            Err(err) => fail(err),
        }
    }

    /// Keyword search within one lore.
    #[tool(description = "Search a lore by keywords. Same matching rules as find.")]
    async fn recall_find(
        &self,
        Parameters(params): Parameters<RecallFindParams>,
    ) -> Result<String, String> {
        if let Err(err) = self.require_lore(&params.lore_name).await {
            return fail(err);
        }
        let limit = params.limit.unwrap_or_else(|| self.searcher.default_limit());
        match self
            .searcher
            .keyword_search(
                &self.lores.collection_name(&params.lore_name),
                &params.keywords,
                limit,
                params.filter.as_ref(),
            )
            .await
        {
            Ok(results) => {
                let total = results.len();
                render(&json!({
                    "lore": params.lore_name,
                    "results": results,
                    "total": total,
                }))
            }
            Err(err) => fail(err),
        }
    }

    /// Delete a chunk from a lore.
    #[tool(description = "Delete a chunk from a lore by id.")]
    async fn erase_lore(
        &self,
        Parameters(params): Parameters<EraseLoreParams>,
    ) -> Result<String, String> {
        match self
            .chunks
            .erase(Target::Lore(&params.lore_name), &params.chunk_id)
            .await
        {
            Ok(message) => render(&json!({"status": "success", "message": message})),
            Err(err) => fail(err),
        }
    }

    /// Replace a lore chunk's text.
    #[tool(description = "Replace a lore chunk's text by id. Re-embedded; metadata preserved.")]
    async fn revise_lore(
        &self,
        Parameters(params): Parameters<ReviseLoreParams>,
    ) -> Result<String, String> {
        match self
            .chunks
            .revise(
                Target::Lore(&params.lore_name),
                &params.chunk_id,
                &params.new_text,
            )
            .await
        {
            Ok(message) => render(&json!({"status": "success", "message": message})),
            Err(err) => fail(err),
        }
    }

    /// List every lore.
    #[tool(description = "List all lores with descriptions and chunk counts.")]
    async fn lores(&self, Parameters(_params): Parameters<LoresParams>) -> Result<String, String> {
        match self.lores.list().await {
            Ok(lores) => {
                let total = lores.len();
                render(&json!({"lores": lores, "total": total}))
            }
            Err(err) => fail(err),
        }
    }

    /// Delete a lore and everything in it.
    #[tool(
        description = "Delete a lore: its chunks, its metadata index, and its catalog entry. Irreversible."
    )]
    async fn lore_delete(
        &self,
        Parameters(params): Parameters<LoreDeleteParams>,
    ) -> Result<String, String> {
        match self.lores.delete(&params.lore_name).await {
            Ok(()) => render(&json!({
                "status": "success",
                "message": format!("lore deleted: \"{}\"", params.lore_name),
            })),
            Err(err) => fail(err),
        }
    }

    /// Per-lore statistics.
    #[tool(description = "Get statistics for one lore: chunk counts and per-category totals.")]
    async fn lore_stats(
        &self,
        Parameters(params): Parameters<LoreStatsParams>,
    ) -> Result<String, String> {
        match self.lores.get_stats(&params.lore_name).await {
            Ok((collection_stats, categories)) => render(&json!({
                "lore": params.lore_name,
                "total_chunks": collection_stats.total_count,
                "categories": categories,
            })),
            Err(err) => fail(err),
        }
    }

    async fn require_lore(&self, name: &str) -> crate::error::Result<()> {
        crate::lore::manager::validate_lore_name(name)?;
        if !self.lores.exists(name).await? {
            return Err(Error::NotFound(format!("lore not found: \"{name}\"")));
        }
        Ok(())
    }
}

#[tool_handler]
impl ServerHandler for GrimoireTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Grimoire is a semantic knowledge store. Call rest() to open a write \
                 session, scribe/chronicle to store chunks, memorize/recall to search \
                 by meaning, and find/recall_find to search by keyword."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
