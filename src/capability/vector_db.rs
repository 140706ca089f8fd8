//! `ManagedVectorDb`: the managed vector index capability used for entity
//! resolution (embedding a filter value and matching against known column
//! values above a similarity threshold).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::embedder::cosine_similarity;

#[derive(Debug, thiserror::Error)]
pub enum VectorDbError {
    #[error("vector db connection failed: {0}")]
    ConnectionFailed(String),

    #[error("vector db operation failed: {0}")]
    Operation(String),

    #[error("dimension mismatch: index expects {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    pub metadata: HashMap<String, Value>,
}

#[async_trait]
pub trait ManagedVectorDb: Send + Sync {
    async fn create_index(&self, dim: usize) -> Result<(), VectorDbError>;

    async fn upsert_vectors(&self, vectors: Vec<(String, Vec<f32>)>, metadata: Vec<HashMap<String, Value>>) -> Result<(), VectorDbError>;

    async fn search(&self, vector: &[f32], top_k: usize, metadata_filters: Option<HashMap<String, Value>>) -> Result<Vec<VectorMatch>, VectorDbError>;

    async fn delete_index(&self) -> Result<(), VectorDbError>;

    async fn test_connection(&self) -> Result<(), VectorDbError>;
}

#[derive(Debug, Default)]
struct IndexState {
    dim: usize,
    vectors: Vec<(String, Vec<f32>, HashMap<String, Value>)>,
}

/// An in-memory vector index computing exact cosine-similarity search over
/// a linear scan, used by this crate's own tests in place of a managed
/// vector database.
#[derive(Debug, Default)]
pub struct InMemoryVectorDb {
    state: Mutex<Option<IndexState>>,
}

impl InMemoryVectorDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ManagedVectorDb for InMemoryVectorDb {
    async fn create_index(&self, dim: usize) -> Result<(), VectorDbError> {
        *self.state.lock().expect("vector db mutex poisoned") = Some(IndexState { dim, vectors: Vec::new() });
        Ok(())
    }

    async fn upsert_vectors(&self, vectors: Vec<(String, Vec<f32>)>, metadata: Vec<HashMap<String, Value>>) -> Result<(), VectorDbError> {
        let mut guard = self.state.lock().expect("vector db mutex poisoned");
        let state = guard.as_mut().ok_or_else(|| VectorDbError::Operation("index not created".into()))?;
        for ((id, vec), meta) in vectors.into_iter().zip(metadata.into_iter()) {
            if vec.len() != state.dim {
                return Err(VectorDbError::DimensionMismatch { expected: state.dim, got: vec.len() });
            }
            state.vectors.retain(|(existing_id, _, _)| existing_id != &id);
            state.vectors.push((id, vec, meta));
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize, metadata_filters: Option<HashMap<String, Value>>) -> Result<Vec<VectorMatch>, VectorDbError> {
        let guard = self.state.lock().expect("vector db mutex poisoned");
        let state = guard.as_ref().ok_or_else(|| VectorDbError::Operation("index not created".into()))?;
        let mut scored: Vec<VectorMatch> = state
            .vectors
            .iter()
            .filter(|(_, _, meta)| match &metadata_filters {
                None => true,
                Some(filters) => filters.iter().all(|(k, v)| meta.get(k) == Some(v)),
            })
            .map(|(id, vec, meta)| VectorMatch {
                id: id.clone(),
                score: cosine_similarity(vector, vec),
                metadata: meta.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_index(&self) -> Result<(), VectorDbError> {
        *self.state.lock().expect("vector db mutex poisoned") = None;
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), VectorDbError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_ranks_by_similarity_descending() {
        let db = InMemoryVectorDb::new();
        db.create_index(2).await.unwrap();
        db.upsert_vectors(
            vec![("a".into(), vec![1.0, 0.0]), ("b".into(), vec![0.0, 1.0])],
            vec![HashMap::new(), HashMap::new()],
        )
        .await
        .unwrap();
        let results = db.search(&[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(results[0].id, "a");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let db = InMemoryVectorDb::new();
        db.create_index(3).await.unwrap();
        let err = db.upsert_vectors(vec![("a".into(), vec![1.0, 0.0])], vec![HashMap::new()]).await.unwrap_err();
        assert!(matches!(err, VectorDbError::DimensionMismatch { expected: 3, got: 2 }));
    }
}
