//! Qdrant REST client.
//!
//! Implements [`VectorStore`] against the Qdrant HTTP API. Writes use
//! `wait=true` so a returned upsert/delete is durable before the next
//! pipeline step runs. Connection failures surface as
//! [`Error::Unavailable`] with a remediation hint.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::filter::Filter;
use super::{point_id, CollectionStats, ScoredPoint, StoredPoint, VectorStore};
use crate::error::{Error, Result};

pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
}

impl QdrantStore {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn connect_error(&self, err: reqwest::Error) -> Error {
        if err.is_connect() || err.is_timeout() {
            Error::Unavailable(format!(
                "cannot reach vector store at {}: {err}. Is Qdrant running?",
                self.base_url
            ))
        } else {
            Error::Backend(anyhow::Error::new(err).context("vector store request failed"))
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(|e| self.connect_error(e))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Backend(anyhow::anyhow!("invalid vector store response: {e}")))?;
        if !status.is_success() {
            let detail = body
                .pointer("/status/error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(Error::Backend(anyhow::anyhow!(
                "vector store returned {status}: {detail}"
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn create_collection(&self, name: &str, vector_dim: usize) -> Result<()> {
        let body = json!({
            "vectors": { "size": vector_dim, "distance": "Cosine" }
        });
        self.send(
            self.client
                .put(self.url(&format!("/collections/{name}")))
                .json(&body),
        )
        .await?;
        tracing::info!(collection = name, dim = vector_dim, "collection created");
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let body = self
            .send(self.client.get(self.url("/collections")))
            .await?;
        let exists = body
            .pointer("/result/collections")
            .and_then(Value::as_array)
            .is_some_and(|cols| {
                cols.iter()
                    .any(|c| c.get("name").and_then(Value::as_str) == Some(name))
            });
        Ok(exists)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.send(self.client.delete(self.url(&format!("/collections/{name}"))))
            .await?;
        tracing::info!(collection = name, "collection deleted");
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let body = self
            .send(self.client.get(self.url("/collections")))
            .await?;
        let names = body
            .pointer("/result/collections")
            .and_then(Value::as_array)
            .map(|cols| {
                cols.iter()
                    .filter_map(|c| c.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: Vec<f32>,
        payload: Value,
    ) -> Result<()> {
        let body = json!({
            "points": [{ "id": point_id(id), "vector": vector, "payload": payload }]
        });
        self.send(
            self.client
                .put(self.url(&format!("/collections/{collection}/points?wait=true")))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<StoredPoint>> {
        let body = json!({
            "ids": [point_id(id)],
            "with_payload": true,
            "with_vector": false
        });
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("/collections/{collection}/points")))
                    .json(&body),
            )
            .await?;
        let point = response
            .pointer("/result/0")
            .map(|p| StoredPoint {
                // Callers key on payload fields; the physical id is enough here.
                id: p
                    .get("id")
                    .map(|v| v.to_string().trim_matches('"').to_string())
                    .unwrap_or_else(|| id.to_string()),
                payload: p.get("payload").cloned().unwrap_or(Value::Null),
            });
        Ok(point)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let body = json!({ "points": [point_id(id)] });
        self.send(
            self.client
                .post(self.url(&format!(
                    "/collections/{collection}/points/delete?wait=true"
                )))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&Filter>,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>> {
        let mut body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true
        });
        if let Some(filter) = filter {
            body["filter"] = serde_json::to_value(filter)
                .map_err(|e| Error::Backend(anyhow::anyhow!("filter serialization: {e}")))?;
        }
        if let Some(threshold) = score_threshold {
            body["score_threshold"] = json!(threshold);
        }
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("/collections/{collection}/points/search")))
                    .json(&body),
            )
            .await?;
        let results = response
            .pointer("/result")
            .and_then(Value::as_array)
            .map(|hits| {
                hits.iter()
                    .map(|hit| ScoredPoint {
                        id: hit
                            .get("id")
                            .map(|v| v.to_string().trim_matches('"').to_string())
                            .unwrap_or_default(),
                        score: hit.get("score").and_then(Value::as_f64).unwrap_or(0.0) as f32,
                        payload: hit.get("payload").cloned().unwrap_or(Value::Null),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(results)
    }

    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<StoredPoint>> {
        let mut body = json!({
            "limit": limit,
            "with_payload": true,
            "with_vector": false
        });
        if let Some(filter) = filter {
            body["filter"] = serde_json::to_value(filter)
                .map_err(|e| Error::Backend(anyhow::anyhow!("filter serialization: {e}")))?;
        }
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("/collections/{collection}/points/scroll")))
                    .json(&body),
            )
            .await?;
        let points = response
            .pointer("/result/points")
            .and_then(Value::as_array)
            .map(|points| {
                points
                    .iter()
                    .map(|p| StoredPoint {
                        id: p
                            .get("id")
                            .map(|v| v.to_string().trim_matches('"').to_string())
                            .unwrap_or_default(),
                        payload: p.get("payload").cloned().unwrap_or(Value::Null),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(points)
    }

    async fn stats(&self, collection: &str) -> Result<CollectionStats> {
        let response = self
            .send(
                self.client
                    .get(self.url(&format!("/collections/{collection}"))),
            )
            .await?;
        Ok(CollectionStats {
            total_count: response
                .pointer("/result/points_count")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            vector_count: response
                .pointer("/result/indexed_vectors_count")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        })
    }
}
