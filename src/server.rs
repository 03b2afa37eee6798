//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire up the
//! vector store, embedder, session table, and MCP tool handler into a
//! running server.

use std::sync::Arc;

use anyhow::Result;
use rmcp::ServiceExt;

use crate::config::GrimoireConfig;
use crate::embedding::{self, Embedder};
use crate::lore::index::MetadataIndex;
use crate::lore::manager::LoreManager;
use crate::lore::search::Searcher;
use crate::lore::session::RestSessions;
use crate::lore::store::ChunkStore;
use crate::tools::GrimoireTools;
use crate::vector::{self, VectorStore};

/// Shared setup: connect the vector store, ensure the canon collections,
/// build the embedder and the domain services.
async fn setup_shared_state(config: GrimoireConfig) -> Result<GrimoireTools> {
    let config = Arc::new(config);

    let vectors: Arc<dyn VectorStore> =
        Arc::new(vector::qdrant::QdrantStore::new(&config.qdrant.url));
    let embedder: Arc<dyn Embedder> =
        Arc::new(embedding::ollama::OllamaEmbedder::new(&config.embedding));

    // Canon content + metadata collections exist before the first tool call.
    let canon = &config.qdrant.collection;
    if !vectors.collection_exists(canon).await? {
        vectors
            .create_collection(canon, config.embedding.dimensions)
            .await?;
        tracing::info!(collection = %canon, "created canon collection");
    }
    let canon_index = Arc::new(MetadataIndex::new(
        Arc::clone(&vectors),
        config.qdrant.metadata_collection.clone(),
        config.retrieval.scroll_page_size,
    ));
    canon_index.initialize().await?;
    tracing::info!("vector store ready");

    let searcher = Arc::new(Searcher::new(
        Arc::clone(&vectors),
        Arc::clone(&embedder),
        config.retrieval.clone(),
    ));
    let sessions = Arc::new(RestSessions::default());
    let lores = Arc::new(LoreManager::new(
        Arc::clone(&vectors),
        config.qdrant.metadata_collection.clone(),
        config.embedding.dimensions,
        config.retrieval.scroll_page_size,
    ));
    let chunks = Arc::new(ChunkStore::new(
        Arc::clone(&vectors),
        Arc::clone(&embedder),
        Arc::clone(&searcher),
        Arc::clone(&sessions),
        Arc::clone(&lores),
        canon.clone(),
        Arc::clone(&canon_index),
    ));

    Ok(GrimoireTools::new(
        vectors,
        embedder,
        searcher,
        sessions,
        lores,
        chunks,
        canon_index,
        config,
    ))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: GrimoireConfig) -> Result<()> {
    tracing::info!("starting Grimoire MCP server on stdio");

    let tools = setup_shared_state(config).await?;
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: GrimoireConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting Grimoire MCP server on HTTP");

    let tools = setup_shared_state(config).await?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(tools.clone()),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
