use crate::types::DocumentChunk;

/// Splits text into bounded, overlapping character windows.
///
/// Splitting is purely a function of the input text and the configured
/// parameters: the same call always yields the same chunk sequence,
/// which the tests (and any future deduplication) rely on.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker producing chunks of at most `chunk_size`
    /// characters, with consecutive chunks sharing `chunk_overlap`
    /// characters.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero or `chunk_overlap >= chunk_size`;
    /// these are configuration errors, not data errors.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        assert!(
            chunk_overlap < chunk_size,
            "chunk_overlap must be smaller than chunk_size"
        );
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split `text` into chunk strings.
    ///
    /// Windows advance by `chunk_size - chunk_overlap` characters; each
    /// chunk is trimmed and whitespace-only windows are dropped. Text
    /// shorter than `chunk_size` yields a single chunk.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Split a batch of `(source, text)` documents, tagging each chunk
    /// with the source it came from.
    pub fn split_documents<'a, I>(&self, documents: I) -> Vec<DocumentChunk>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        documents
            .into_iter()
            .flat_map(|(source, text)| {
                self.split(text)
                    .into_iter()
                    .map(move |content| DocumentChunk::new(content, source))
            })
            .collect()
    }
}
