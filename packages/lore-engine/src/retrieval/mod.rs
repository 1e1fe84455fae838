//! Evidence lookup over the narrative text.

pub mod keyword;

pub use keyword::{KeywordIndex, chunk_text};

use crate::config::RetrievalConfig;
use crate::domain::{ClaimId, RetrievalQuery};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
}

/// Anything that can return the passages most relevant to a query.
#[async_trait]
pub trait EvidenceIndex: Send + Sync {
    /// At most `k` passages, best first. May be empty.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimEvidence {
    pub claim_id: ClaimId,
    pub passages: Vec<Passage>,
}

/// Runs every query against the index. A failing lookup is logged and the
/// claim simply gets no evidence.
pub async fn gather_evidence(
    index: &dyn EvidenceIndex,
    queries: &[RetrievalQuery],
    top_k: usize,
) -> Vec<ClaimEvidence> {
    let mut evidence = Vec::with_capacity(queries.len());
    for query in queries {
        match index.retrieve(&query.query, top_k).await {
            Ok(passages) => {
                debug!(
                    "Claim {}: {} passages for '{}'",
                    query.claim_id,
                    passages.len(),
                    query.query
                );
                evidence.push(ClaimEvidence {
                    claim_id: query.claim_id.clone(),
                    passages,
                });
            }
            Err(e) => warn!("Evidence lookup failed for claim {}: {:#}", query.claim_id, e),
        }
    }
    evidence
}

/// Prompt-ready evidence block: a heading per claim and one bullet per
/// passage, each passage cut to `passage_max_chars`.
pub fn format_evidence(evidence: &[ClaimEvidence], config: &RetrievalConfig) -> String {
    let mut out = String::new();
    for entry in evidence {
        let _ = writeln!(out, "\nClaim {} Evidence:", entry.claim_id);
        for passage in entry.passages.iter().take(config.max_passages_per_claim) {
            let excerpt: String = passage.text.chars().take(config.passage_max_chars).collect();
            let _ = writeln!(out, "- {}...", excerpt);
        }
    }
    out
}
