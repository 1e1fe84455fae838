use crate::error::LoreError;
use anyhow::{Context, Result};
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tokio::fs;

const CONFIG_SCHEMA: &str = include_str!("../schemas/lore-config.schema.json");

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LoreConfig {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Per-claim penalty weights, one per signal category.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PenaltyWeights {
    pub major_fatal: f64,
    pub major_soft: f64,
    /// Any contradiction on a MINOR claim.
    pub minor_contradiction: f64,
    pub memory_impossible: f64,
    pub orphaned: f64,
    pub counterfactual_violated: f64,
    /// Per phase marked CONTRADICTS. Reported but unweighted by default.
    pub temporal_contradiction: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            major_fatal: 1.0,
            major_soft: 0.3,
            minor_contradiction: 0.2,
            memory_impossible: 0.5,
            orphaned: 0.4,
            counterfactual_violated: 0.5,
            temporal_contradiction: 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub penalties: PenaltyWeights,
    /// Added to the total possible penalty for every MAJOR claim.
    pub major_weight: f64,
    /// Scores strictly below the threshold predict inconsistency.
    pub threshold: f64,
    pub default_confidence_consistent: f64,
    pub default_confidence_inconsistent: f64,
    pub rationale_max_chars: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            penalties: PenaltyWeights::default(),
            major_weight: 1.0,
            threshold: 0.4,
            default_confidence_consistent: 0.8,
            default_confidence_inconsistent: 0.2,
            rationale_max_chars: 300,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_passages_per_claim: usize,
    pub passage_max_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            chunk_size: 1000,
            chunk_overlap: 200,
            max_passages_per_claim: 5,
            passage_max_chars: 400,
        }
    }
}

impl LoreConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let instance: Value = serde_json::from_str(content).context("Config is not valid JSON")?;
        Self::validate_schema(&instance)?;
        let config: LoreConfig = serde_json::from_value(instance)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, or the defaults when no path is given.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to load config {}", path.display()))
    }

    fn validate_schema(instance: &Value) -> Result<()> {
        let schema_val: Value = serde_json::from_str(CONFIG_SCHEMA)?;
        let compiled = JSONSchema::compile(&schema_val)
            .map_err(|e| anyhow::anyhow!("Failed to compile config schema: {}", e))?;

        if let Err(errors) = compiled.validate(instance) {
            let error_msgs: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(LoreError::config_invalid(error_msgs.join(", ")).into());
        }
        Ok(())
    }

    /// Checks the constraints the schema cannot express, plus the schema
    /// ones again for configs built in code.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        let p = &s.penalties;
        let r = &self.retrieval;

        let weights = [
            ("major_fatal", p.major_fatal),
            ("major_soft", p.major_soft),
            ("minor_contradiction", p.minor_contradiction),
            ("memory_impossible", p.memory_impossible),
            ("orphaned", p.orphaned),
            ("counterfactual_violated", p.counterfactual_violated),
            ("temporal_contradiction", p.temporal_contradiction),
        ];
        if let Some((name, value)) = weights.iter().find(|(_, v)| !(v.is_finite() && *v >= 0.0)) {
            return Err(LoreError::config_invalid(format!(
                "penalty '{}' must be a non-negative number, got {}",
                name, value
            ))
            .into());
        }
        if !(s.major_weight.is_finite() && s.major_weight > 0.0) {
            return Err(LoreError::config_invalid("major_weight must be positive").into());
        }
        let unit = [
            ("threshold", s.threshold),
            ("default_confidence_consistent", s.default_confidence_consistent),
            ("default_confidence_inconsistent", s.default_confidence_inconsistent),
        ];
        if let Some((name, value)) = unit.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            return Err(LoreError::config_invalid(format!(
                "{} must be within [0, 1], got {}",
                name, value
            ))
            .into());
        }
        if s.rationale_max_chars == 0 {
            return Err(LoreError::config_invalid("rationale_max_chars must be positive").into());
        }
        if r.top_k == 0 || r.chunk_size == 0 || r.max_passages_per_claim == 0 {
            return Err(LoreError::config_invalid(
                "top_k, chunk_size and max_passages_per_claim must be positive",
            )
            .into());
        }
        if r.chunk_overlap >= r.chunk_size {
            return Err(LoreError::config_invalid(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                r.chunk_overlap, r.chunk_size
            ))
            .into());
        }
        Ok(())
    }
}
