use super::{EvidenceIndex, Passage};
use crate::config::RetrievalConfig;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// Splits `text` on whitespace into windows of `chunk_size` words, each
/// starting `chunk_size - overlap` words after the previous one.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let size = chunk_size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + size).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += step;
    }
    chunks
}

/// Word-overlap search over narrative chunks. No embeddings, no network.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    chunks: Vec<String>,
    lowered: Vec<String>,
}

impl KeywordIndex {
    pub fn new(text: &str, config: &RetrievalConfig) -> Self {
        Self::from_chunks(chunk_text(text, config.chunk_size, config.chunk_overlap))
    }

    pub fn from_chunks(chunks: Vec<String>) -> Self {
        let lowered = chunks.iter().map(|c| c.to_lowercase()).collect();
        Self { chunks, lowered }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Scores each chunk by how many distinct query words it contains as
    /// substrings. Zero-score chunks are dropped; ties go to the later chunk.
    pub fn search(&self, query: &str, k: usize) -> Vec<Passage> {
        let lowered_query = query.to_lowercase();
        let words: HashSet<&str> = lowered_query.split_whitespace().collect();

        let mut scored: Vec<(usize, usize)> = self
            .lowered
            .iter()
            .enumerate()
            .filter_map(|(i, chunk)| {
                let score = words.iter().filter(|w| chunk.contains(**w)).count();
                (score > 0).then_some((score, i))
            })
            .collect();
        scored.sort_unstable_by(|a, b| b.cmp(a));

        scored
            .into_iter()
            .take(k)
            .map(|(_, i)| Passage {
                text: self.chunks[i].clone(),
            })
            .collect()
    }
}

#[async_trait]
impl EvidenceIndex for KeywordIndex {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        Ok(self.search(query, k))
    }
}
