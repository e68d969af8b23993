use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::llm::EmbeddingProvider;
use crate::rag::chunker::TextChunker;
use crate::store::{StoreManager, UserVectorStore};
use crate::types::{AppError, DocumentChunk, Result};

/// Document types accepted for upload, by file extension.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Summary of one ingestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub chunks_added: usize,
}

/// Returns true if the file's extension is on the upload allow-list.
pub fn is_allowed_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Chunks uploaded documents and embeds them into a user's store.
#[derive(Clone)]
pub struct DocumentIngestor {
    stores: StoreManager,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: TextChunker,
}

impl DocumentIngestor {
    pub fn new(
        stores: StoreManager,
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: TextChunker,
    ) -> Self {
        Self {
            stores,
            embedder,
            chunker,
        }
    }

    /// Ingest a set of uploaded files for a user.
    ///
    /// Files with a disallowed extension are skipped before any read;
    /// unreadable files are skipped with a warning. If no chunk can be
    /// extracted from any file the request fails with
    /// [`AppError::NoExtractableContent`] and no store is created.
    pub async fn ingest_files(&self, user_id: &str, paths: &[PathBuf]) -> Result<IngestReport> {
        let mut chunks = Vec::new();
        let mut files_indexed = 0;
        let mut files_skipped = 0;

        for path in paths {
            if !is_allowed_file(path) {
                warn!(user_id, ?path, "Rejected file with disallowed type");
                files_skipped += 1;
                continue;
            }

            let text = match tokio::fs::read_to_string(path).await {
                Ok(text) => text,
                Err(error) => {
                    warn!(user_id, ?path, %error, "Skipping unreadable file");
                    files_skipped += 1;
                    continue;
                }
            };

            let source = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            chunks.extend(self.chunker.split_documents([(source.as_str(), text.as_str())]));
            files_indexed += 1;
        }

        let chunks_added = self.ingest(user_id, chunks).await?;
        Ok(IngestReport {
            files_indexed,
            files_skipped,
            chunks_added,
        })
    }

    /// Embed `chunks` and append them to the user's store, creating the
    /// store on first upload.
    ///
    /// The store is reloaded from disk for every call; concurrent
    /// ingests for the same user are not coordinated, so two uploads
    /// finishing at the same time can lose one party's additions
    /// (last writer wins). A save failure is returned to the caller.
    pub async fn ingest(&self, user_id: &str, chunks: Vec<DocumentChunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Err(AppError::NoExtractableContent(
                "no content could be extracted from the uploaded documents".to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let added = chunks.len();
        let store = match self.stores.load(user_id).await {
            Some(mut store) => {
                store.append(chunks, embeddings)?;
                store
            }
            None => UserVectorStore::from_chunks(chunks, embeddings)?,
        };

        self.stores.save(user_id, &store).await?;

        info!(
            user_id,
            chunks_added = added,
            total_chunks = store.len(),
            "Documents ingested"
        );
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RetryPolicy;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Deterministic embedder: a fixed-dimension vector derived from the
    /// text's bytes.
    struct HashEmbedder;

    #[async_trait]
    impl EmbeddingProvider for HashEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut vector = vec![0.0f32; 4];
            for (i, byte) in text.bytes().enumerate() {
                vector[i % 4] += byte as f32 / 255.0;
            }
            Ok(vector)
        }
    }

    fn ingestor(dir: &TempDir) -> DocumentIngestor {
        DocumentIngestor::new(
            StoreManager::new(dir.path().join("stores"), RetryPolicy::new(3, Duration::ZERO)),
            Arc::new(HashEmbedder),
            TextChunker::new(1000, 200),
        )
    }

    fn stores(dir: &TempDir) -> StoreManager {
        StoreManager::new(dir.path().join("stores"), RetryPolicy::new(3, Duration::ZERO))
    }

    async fn write_upload(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    #[test]
    fn allow_list_is_case_insensitive_and_extension_based() {
        assert!(is_allowed_file(Path::new("notes.txt")));
        assert!(is_allowed_file(Path::new("README.MD")));
        assert!(!is_allowed_file(Path::new("report.pdf")));
        assert!(!is_allowed_file(Path::new("binary.exe")));
        assert!(!is_allowed_file(Path::new("no_extension")));
    }

    #[tokio::test]
    async fn small_upload_produces_one_chunk_and_a_present_store() {
        let dir = TempDir::new().unwrap();
        let path = write_upload(&dir, "facts.txt", "The sky is blue. Grass is green.").await;

        let report = ingestor(&dir).ingest_files("u1", &[path]).await.unwrap();

        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.chunks_added, 1);

        let store = stores(&dir).load("u1").await.expect("store should exist");
        assert_eq!(store.len(), 1);
        assert_eq!(store.chunks()[0].content, "The sky is blue. Grass is green.");
        assert_eq!(store.chunks()[0].source, "facts.txt");
    }

    #[tokio::test]
    async fn empty_upload_is_rejected_and_creates_no_store() {
        let dir = TempDir::new().unwrap();
        let path = write_upload(&dir, "empty.txt", "").await;

        let err = ingestor(&dir).ingest_files("u1", &[path]).await.unwrap_err();
        assert!(matches!(err, AppError::NoExtractableContent(_)));
        assert!(stores(&dir).load("u1").await.is_none());
    }

    #[tokio::test]
    async fn disallowed_file_types_are_skipped_before_parsing() {
        let dir = TempDir::new().unwrap();
        let allowed = write_upload(&dir, "ok.txt", "Some text content.").await;
        let disallowed = write_upload(&dir, "bad.exe", "binary stuff").await;

        let report = ingestor(&dir)
            .ingest_files("u1", &[allowed, disallowed])
            .await
            .unwrap();

        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.files_skipped, 1);
    }

    #[tokio::test]
    async fn only_disallowed_files_means_no_extractable_content() {
        let dir = TempDir::new().unwrap();
        let path = write_upload(&dir, "report.pdf", "pretend pdf").await;

        let err = ingestor(&dir).ingest_files("u1", &[path]).await.unwrap_err();
        assert!(matches!(err, AppError::NoExtractableContent(_)));
    }

    #[tokio::test]
    async fn second_upload_appends_without_disturbing_positions() {
        let dir = TempDir::new().unwrap();
        let ingestor = ingestor(&dir);

        let first = write_upload(&dir, "one.txt", "First document text.").await;
        ingestor.ingest_files("u1", &[first]).await.unwrap();

        let second = write_upload(&dir, "two.txt", "Second document text.").await;
        ingestor.ingest_files("u1", &[second]).await.unwrap();

        let store = stores(&dir).load("u1").await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.chunks()[0].source, "one.txt");
        assert_eq!(store.chunks()[1].source, "two.txt");
    }

    #[tokio::test]
    async fn missing_file_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let present = write_upload(&dir, "here.txt", "I exist.").await;
        let missing = dir.path().join("gone.txt");

        let report = ingestor(&dir)
            .ingest_files("u1", &[present, missing])
            .await
            .unwrap();

        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.files_skipped, 1);
    }
}
