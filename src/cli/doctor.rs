//! CLI `doctor` command — probe the backing services and print a health
//! report.

use anyhow::Result;

use crate::config::GrimoireConfig;
use crate::embedding::ollama::OllamaEmbedder;
use crate::embedding::Embedder;
use crate::vector::qdrant::QdrantStore;
use crate::vector::VectorStore;

/// Check connectivity to Qdrant and the embedding endpoint.
pub async fn doctor(config: &GrimoireConfig) -> Result<()> {
    println!("Grimoire Health Report");
    println!("======================");
    println!();

    let store = QdrantStore::new(&config.qdrant.url);
    println!("Qdrant:            {}", config.qdrant.url);
    match store.list_collections().await {
        Ok(collections) => {
            println!("  Status:          OK ({} collections)", collections.len());
            let canon = &config.qdrant.collection;
            if collections.iter().any(|c| c == canon) {
                match store.stats(canon).await {
                    Ok(stats) => {
                        println!("  Canon:           {} chunks", stats.total_count)
                    }
                    Err(err) => println!("  Canon:           stats failed ({err})"),
                }
            } else {
                println!("  Canon:           not provisioned yet (created on serve)");
            }
        }
        Err(err) => {
            println!("  Status:          FAILED ({err})");
        }
    }
    println!();

    let embedder = OllamaEmbedder::new(&config.embedding);
    println!("Embedding:         {}", config.embedding.ollama_host);
    println!("  Model:           {}", config.embedding.model);
    match embedder.embed("health probe").await {
        Ok(vector) => {
            println!("  Status:          OK ({} dimensions)", vector.len());
            if vector.len() != config.embedding.dimensions {
                println!(
                    "  WARNING: configured dimensions = {}, model returned {}",
                    config.embedding.dimensions,
                    vector.len()
                );
            }
        }
        Err(err) => {
            println!("  Status:          FAILED ({err})");
        }
    }

    Ok(())
}
