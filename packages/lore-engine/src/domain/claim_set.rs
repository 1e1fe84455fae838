use super::records::*;
use super::types::*;
use std::collections::HashMap;
use tracing::debug;

/// The reconciled claim registry for one story.
///
/// Stages do not agree on importance tags, so registration follows a
/// last-seen-wins rule: the claim list, then the importance stage, then any
/// `Importance:` carried by the causal stage. Ids first seen in a later stage
/// are registered with empty text.
#[derive(Debug, Clone, Default)]
pub struct ClaimSet {
    claims: Vec<Claim>,
    index: HashMap<ClaimId, usize>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_claims(claims: impl IntoIterator<Item = Claim>) -> Self {
        let mut set = Self::new();
        for claim in claims {
            set.upsert(&claim.id, Some(&claim.text), Some(claim.importance));
        }
        set
    }

    pub fn reconcile(annotations: &StoryAnnotations) -> Self {
        let mut set = Self::from_claims(annotations.claims.iter().cloned());

        for tag in &annotations.importance {
            set.upsert(&tag.claim_id, None, tag.importance);
        }
        for result in &annotations.causal {
            set.upsert(&result.claim_id, None, result.importance);
        }

        debug!(
            "Reconciled {} claims ({} MAJOR)",
            set.len(),
            set.major_count()
        );
        set
    }

    fn upsert(&mut self, id: &str, text: Option<&str>, importance: Option<Importance>) {
        match self.index.get(id) {
            Some(&pos) => {
                let claim = &mut self.claims[pos];
                if let Some(text) = text.filter(|t| !t.is_empty()) {
                    claim.text = text.to_string();
                }
                if let Some(importance) = importance {
                    claim.importance = importance;
                }
            }
            None => {
                self.index.insert(id.to_string(), self.claims.len());
                self.claims.push(Claim::new(
                    id,
                    text.unwrap_or_default(),
                    importance.unwrap_or_default(),
                ));
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Claim> {
        self.index.get(id).map(|&pos| &self.claims[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.iter()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn major_count(&self) -> usize {
        self.claims.iter().filter(|c| c.is_major()).count()
    }

    /// One verdict per registered claim that the causal stage covered, in
    /// first-seen order. Repeated records overwrite earlier ones. A fatal
    /// verdict is only valid for a MAJOR claim and is demoted to a soft
    /// contradiction otherwise.
    pub fn effective_verdicts(&self, causal: &[CausalResult]) -> Vec<(ClaimId, CausalVerdict)> {
        let mut order: Vec<ClaimId> = Vec::new();
        let mut latest: HashMap<&str, CausalVerdict> = HashMap::new();

        for result in causal {
            let Some(claim) = self.get(&result.claim_id) else {
                continue;
            };
            let mut verdict = result.verdict;
            if verdict == CausalVerdict::FatalContradiction && !claim.is_major() {
                debug!("Demoting fatal verdict on MINOR claim {}", claim.id);
                verdict = CausalVerdict::SoftContradiction;
            }
            if latest.insert(result.claim_id.as_str(), verdict).is_none() {
                order.push(result.claim_id.clone());
            }
        }

        order
            .into_iter()
            .map(|id| {
                let verdict = latest[id.as_str()];
                (id, verdict)
            })
            .collect()
    }

    /// Claims whose effective verdict is a fatal contradiction.
    pub fn fatal_roots(&self, causal: &[CausalResult]) -> Vec<ClaimId> {
        self.effective_verdicts(causal)
            .into_iter()
            .filter(|(_, v)| *v == CausalVerdict::FatalContradiction)
            .map(|(id, _)| id)
            .collect()
    }
}
