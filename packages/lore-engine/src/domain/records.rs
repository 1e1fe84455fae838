use super::types::*;
use serde::{Deserialize, Serialize};

/// An atomic assertion extracted from a backstory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub text: String,
    pub importance: Importance,
}

impl Claim {
    pub fn new(id: impl Into<ClaimId>, text: impl Into<String>, importance: Importance) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            importance,
        }
    }

    pub fn is_major(&self) -> bool {
        self.importance == Importance::Major
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceTag {
    pub claim_id: ClaimId,
    pub importance: Option<Importance>,
    pub reason: Option<String>,
}

/// `claim_id` depends on `prerequisite_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub claim_id: ClaimId,
    pub prerequisite_id: ClaimId,
    pub reason: String,
}

impl DependencyEdge {
    pub fn new(claim_id: impl Into<ClaimId>, prerequisite_id: impl Into<ClaimId>) -> Self {
        Self {
            claim_id: claim_id.into(),
            prerequisite_id: prerequisite_id.into(),
            reason: String::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub claim_id: ClaimId,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalAnnotation {
    pub claim_id: ClaimId,
    pub phase: Phase,
    /// `None` when the oracle named the phase but gave no recognisable status.
    pub status: Option<TemporalStatus>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalResult {
    pub claim_id: ClaimId,
    pub importance: Option<Importance>,
    pub verdict: CausalVerdict,
    pub explanation: Option<String>,
}

impl CausalResult {
    pub fn new(claim_id: impl Into<ClaimId>, verdict: CausalVerdict) -> Self {
        Self {
            claim_id: claim_id.into(),
            importance: None,
            verdict,
            explanation: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseStates {
    pub early: Option<String>,
    pub mid: Option<String>,
    pub late: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryTransition {
    pub claim_id: ClaimId,
    pub importance: Option<Importance>,
    pub states: PhaseStates,
    pub transition_type: TransitionType,
    pub trigger_events: Vec<String>,
    pub analysis: Option<String>,
}

impl MemoryTransition {
    pub fn new(claim_id: impl Into<ClaimId>, transition_type: TransitionType) -> Self {
        Self {
            claim_id: claim_id.into(),
            importance: None,
            states: PhaseStates::default(),
            transition_type,
            trigger_events: Vec::new(),
            analysis: None,
        }
    }
}

/// Orphan status as claimed by the oracle. Evidence only; the claim graph
/// recomputes the authoritative status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrphanProposal {
    pub claim_id: ClaimId,
    pub status: OrphanStatus,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualCheck {
    pub claim_id: ClaimId,
    pub hypothesis: Option<String>,
    pub expectation: Option<String>,
    pub result: CounterfactualResult,
    pub explanation: Option<String>,
}

impl CounterfactualCheck {
    pub fn new(claim_id: impl Into<ClaimId>, result: CounterfactualResult) -> Self {
        Self {
            claim_id: claim_id.into(),
            hypothesis: None,
            expectation: None,
            result,
            explanation: None,
        }
    }
}

/// What the terminal oracle response said about itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleDecision {
    pub prediction: Option<u8>,
    pub confidence: Option<f64>,
    pub rationale: Option<String>,
}

/// Everything parsed out of the oracle for one story.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryAnnotations {
    pub claims: Vec<Claim>,
    pub importance: Vec<ImportanceTag>,
    pub dependencies: Vec<DependencyEdge>,
    pub temporal: Vec<TemporalAnnotation>,
    pub causal: Vec<CausalResult>,
    pub memory: Vec<MemoryTransition>,
    pub orphan_proposals: Vec<OrphanProposal>,
    pub counterfactuals: Vec<CounterfactualCheck>,
}
