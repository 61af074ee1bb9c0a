use crate::error::EmbeddingServiceError;
use crate::models::{RetrievedChunk, DEFAULT_TOP_K};
use crate::traits::{Embedder, VectorIndex};
use std::sync::Arc;

/// Thin adapter over the index: embed the query, take the top-k hits.
/// Holds no state of its own; an empty result passes through unchanged.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>, EmbeddingServiceError> {
        let vector = self.embedder.embed(query).await?;
        self.index.search(&vector, self.top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::Retriever;
    use crate::models::IndexRecord;
    use crate::store::DiskVectorStore;
    use crate::test_util::HashingEmbedder;
    use crate::traits::{Embedder, VectorIndex};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn empty_index_passes_through_as_empty() {
        let dir = tempdir().expect("tempdir");
        let index = Arc::new(DiskVectorStore::open(dir.path().join("index")));
        let retriever = Retriever::new(Arc::new(HashingEmbedder::default()), index);

        let hits = retriever.retrieve("anything").await.expect("retrieve");
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn returns_at_most_k_hits_with_own_text_first() {
        let dir = tempdir().expect("tempdir");
        let index = Arc::new(DiskVectorStore::open(dir.path().join("index")));
        let embedder = HashingEmbedder::default();

        let mut records = Vec::new();
        for (position, text) in ["the capital of France", "rust systems programming", "cooking"]
            .iter()
            .enumerate()
        {
            records.push(IndexRecord {
                chunk_id: format!("chunk-{position}"),
                document_id: "doc-1".to_string(),
                source_path: "/tmp/kb.pdf".to_string(),
                page: 1,
                chunk_index: position as u64,
                text: text.to_string(),
                vector: embedder.embed(text).await.expect("embed"),
            });
        }
        index.append(records).await.expect("append");

        let retriever =
            Retriever::new(Arc::new(embedder), index).with_top_k(2);
        let hits = retriever
            .retrieve("the capital of France")
            .await
            .expect("retrieve");

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "the capital of France");
        assert!(hits[0].score >= hits[1].score);
    }
}
