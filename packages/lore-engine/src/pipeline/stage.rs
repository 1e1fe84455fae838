use serde::{Deserialize, Serialize};

/// The stages of one story pass, in execution order. Every stage except
/// `Evidence` is an oracle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Claims,
    Importance,
    Dependencies,
    Queries,
    Evidence,
    Temporal,
    Causal,
    Memory,
    Validation,
    Counterfactual,
    Decision,
}

impl Stage {
    pub const ALL: [Stage; 11] = [
        Stage::Claims,
        Stage::Importance,
        Stage::Dependencies,
        Stage::Queries,
        Stage::Evidence,
        Stage::Temporal,
        Stage::Causal,
        Stage::Memory,
        Stage::Validation,
        Stage::Counterfactual,
        Stage::Decision,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Claims => "claims",
            Stage::Importance => "importance",
            Stage::Dependencies => "dependencies",
            Stage::Queries => "queries",
            Stage::Evidence => "evidence",
            Stage::Temporal => "temporal",
            Stage::Causal => "causal",
            Stage::Memory => "memory",
            Stage::Validation => "validation",
            Stage::Counterfactual => "counterfactual",
            Stage::Decision => "decision",
        }
    }

    /// Generation budget for the stage's oracle call.
    pub fn max_new_tokens(&self) -> Option<u32> {
        match self {
            Stage::Claims | Stage::Queries => Some(800),
            Stage::Importance | Stage::Dependencies => Some(1000),
            Stage::Evidence => None,
            Stage::Temporal | Stage::Causal | Stage::Memory => Some(3000),
            Stage::Validation => Some(2000),
            Stage::Counterfactual => Some(2500),
            Stage::Decision => Some(600),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_evidence_skips_the_oracle() {
        let offline: Vec<Stage> = Stage::ALL
            .into_iter()
            .filter(|s| s.max_new_tokens().is_none())
            .collect();
        assert_eq!(offline, vec![Stage::Evidence]);
        assert_eq!(Stage::Decision.max_new_tokens(), Some(600));
    }

    #[test]
    fn test_serialized_name_matches_display() {
        for stage in Stage::ALL {
            let json = serde_json::to_value(stage).unwrap();
            assert_eq!(json, stage.name());
        }
    }
}
