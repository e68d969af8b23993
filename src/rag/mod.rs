//! Document ingestion: splitting uploads into overlapping chunks and
//! embedding them into a user's persistent vector store.

pub mod chunker;
pub mod ingest;

pub use chunker::TextChunker;
pub use ingest::{DocumentIngestor, IngestReport, ALLOWED_EXTENSIONS};
