use crate::error::EmbeddingServiceError;
use crate::models::{IndexRecord, RetrievedChunk};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

const RECORDS_FILE: &str = "records.jsonl";

/// Similarity index persisted as a JSON-lines file under a fixed directory.
///
/// The directory is initialized lazily on the first append. Every search
/// re-reads the file from disk, so each request sees a point-in-time
/// snapshot of whatever has been persisted. Appends within one process are
/// serialized through a single-writer lock; cross-process writers are not
/// coordinated.
#[derive(Clone)]
pub struct DiskVectorStore {
    directory: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl DiskVectorStore {
    pub fn open(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn records_path(&self) -> PathBuf {
        self.directory.join(RECORDS_FILE)
    }

    async fn read_records(&self) -> Result<Vec<IndexRecord>, EmbeddingServiceError> {
        let raw = match tokio::fs::read_to_string(self.records_path()).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(EmbeddingServiceError::Storage(error)),
        };

        let mut records = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(line)?);
        }

        Ok(records)
    }
}

#[async_trait]
impl VectorIndex for DiskVectorStore {
    async fn append(&self, records: Vec<IndexRecord>) -> Result<(), EmbeddingServiceError> {
        if records.is_empty() {
            return Ok(());
        }

        let expected = records[0].vector.len();
        for record in &records {
            if record.vector.len() != expected {
                return Err(EmbeddingServiceError::DimensionMismatch {
                    got: record.vector.len(),
                    want: expected,
                });
            }
        }

        let mut lines = String::new();
        for record in &records {
            lines.push_str(&serde_json::to_string(record)?);
            lines.push('\n');
        }

        let _writer = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(EmbeddingServiceError::Storage)?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.records_path())
            .await
            .map_err(EmbeddingServiceError::Storage)?;
        file.write_all(lines.as_bytes())
            .await
            .map_err(EmbeddingServiceError::Storage)?;
        file.flush().await.map_err(EmbeddingServiceError::Storage)?;

        debug!(
            directory = %self.directory.display(),
            appended = records.len(),
            "index records appended"
        );

        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, EmbeddingServiceError> {
        let records = self.read_records().await?;

        let mut hits: Vec<RetrievedChunk> = records
            .into_iter()
            .filter(|record| record.vector.len() == vector.len())
            .map(|record| {
                let score = cosine_similarity(vector, &record.vector);
                RetrievedChunk {
                    chunk_id: record.chunk_id,
                    document_id: record.document_id,
                    source_path: record.source_path,
                    page: record.page,
                    text: record.text,
                    score,
                }
            })
            .collect();

        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize, EmbeddingServiceError> {
        Ok(self.read_records().await?.len())
    }
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    let mut dot = 0f64;
    let mut left_norm = 0f64;
    let mut right_norm = 0f64;

    for (a, b) in left.iter().zip(right.iter()) {
        dot += f64::from(*a) * f64::from(*b);
        left_norm += f64::from(*a) * f64::from(*a);
        right_norm += f64::from(*b) * f64::from(*b);
    }

    let magnitude = left_norm.sqrt() * right_norm.sqrt();
    if magnitude == 0.0 {
        return 0.0;
    }
    dot / magnitude
}
