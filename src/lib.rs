//! Semantic knowledge store for AI agents — chunked, tagged, searchable
//! memory via MCP.
//!
//! Grimoire is an [MCP](https://modelcontextprotocol.io/) server that stores
//! knowledge as text chunks with structured metadata (topic, category,
//! keywords, questions, entities, importance). Chunks live in a default
//! **canon** namespace or in named, isolated **lores**, and writes are gated
//! behind time-boxed REST sessions that hand the client chunking and
//! metadata guidance up front.
//!
//! # Architecture
//!
//! - **Storage**: [Qdrant](https://qdrant.tech/) collections over REST; one
//!   content collection plus a payload-only metadata collection per
//!   namespace
//! - **Embeddings**: Ollama `/api/embeddings` with L2 normalization and an
//!   in-process cache
//! - **Search**: semantic similarity with a score floor, exact keyword
//!   matching, topic/category browsing, near-duplicate detection
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`] — configuration loading from TOML files and environment
//!   variables
//! - [`vector`] — vector store interface, metadata filters, Qdrant client
//! - [`embedding`] — text-to-vector embedding via Ollama
//! - [`lore`] — core engine: chunk store, sessions, retrieval, metadata
//!   index, lore catalog, backup

pub mod config;
pub mod embedding;
pub mod error;
pub mod lore;
pub mod vector;
