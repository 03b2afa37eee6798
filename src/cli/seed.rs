//! CLI `seed-guides` command — install the built-in system guide chunks
//! that session start snapshots.

use std::sync::Arc;

use anyhow::Result;

use crate::config::GrimoireConfig;
use crate::embedding::ollama::OllamaEmbedder;
use crate::lore::guides;
use crate::lore::index::MetadataIndex;
use crate::vector::qdrant::QdrantStore;
use crate::vector::VectorStore;

pub async fn seed_guides(config: &GrimoireConfig) -> Result<()> {
    let collection = &config.qdrant.collection;
    println!("Seeding system guides into \"{collection}\"...");

    let store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(&config.qdrant.url));
    let embedder = OllamaEmbedder::new(&config.embedding);

    if !store.collection_exists(collection).await? {
        store
            .create_collection(collection, config.embedding.dimensions)
            .await?;
    }
    let index = MetadataIndex::new(
        Arc::clone(&store),
        config.qdrant.metadata_collection.clone(),
        config.retrieval.scroll_page_size,
    );
    index.initialize().await?;

    let count = guides::seed(store.as_ref(), &embedder, &index, collection).await?;
    println!("Done: {count} guide chunk(s) in place.");

    let stats = store.stats(collection).await?;
    println!("Canon now holds {} chunks.", stats.total_count);
    Ok(())
}
