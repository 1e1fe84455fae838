//! One story pass: oracle stages, evidence lookup, scoring, decision.
//!
//! Stages run strictly in sequence and every oracle call is awaited before
//! the next prompt is built. A failure anywhere inside a story surfaces as an
//! error from [`StoryPipeline::evaluate`]; [`StoryPipeline::run_batch`] turns
//! that into a skipped story and carries on.

pub mod stage;

pub use stage::Stage;

use crate::config::{LoreConfig, RetrievalConfig};
use crate::domain::StoryAnnotations;
use crate::error::LoreError;
use crate::interaction::RunObserver;
use crate::logging::RunLogger;
use crate::oracle::{GenerationOptions, Oracle};
use crate::parser;
use crate::prompts::{self, DecisionContext};
use crate::retrieval::{self, EvidenceIndex, KeywordIndex};
use crate::scoring::{ClaimSignals, ConsistencyEngine, Decision, ScoreBreakdown};
use crate::stories::{StoryCatalog, StorySource};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Backstory and narrative sharing one story id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryInput {
    pub story_id: String,
    pub backstory: String,
    pub narrative: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryVerdict {
    pub story_id: String,
    pub decision: Decision,
    pub breakdown: ScoreBreakdown,
    pub claim_count: usize,
    /// Claims with at least one signal, in claim order.
    pub flagged: Vec<ClaimSignals>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryFailure {
    pub story_id: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub verdicts: Vec<StoryVerdict>,
    pub failed: Vec<StoryFailure>,
}

pub type IndexFactory =
    Box<dyn Fn(&str, &RetrievalConfig) -> Box<dyn EvidenceIndex> + Send + Sync>;

pub struct StoryPipeline<O: Oracle> {
    oracle: O,
    config: LoreConfig,
    engine: ConsistencyEngine,
    index_factory: IndexFactory,
    logger: Option<RunLogger>,
    observer: Option<Arc<dyn RunObserver>>,
}

fn keyword_index(text: &str, config: &RetrievalConfig) -> Box<dyn EvidenceIndex> {
    Box::new(KeywordIndex::new(text, config))
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        warn!("Failed to write run log: {:#}", e);
    }
}

impl<O: Oracle> StoryPipeline<O> {
    pub fn new(oracle: O, config: LoreConfig) -> Self {
        Self {
            oracle,
            engine: ConsistencyEngine::new(config.scoring.clone()),
            config,
            index_factory: Box::new(keyword_index),
            logger: None,
            observer: None,
        }
    }

    pub fn with_logger(mut self, logger: RunLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Swaps the per-story evidence index (default: [`KeywordIndex`]).
    pub fn with_index_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str, &RetrievalConfig) -> Box<dyn EvidenceIndex> + Send + Sync + 'static,
    {
        self.index_factory = Box::new(factory);
        self
    }

    pub fn config(&self) -> &LoreConfig {
        &self.config
    }

    pub fn logger(&self) -> Option<&RunLogger> {
        self.logger.as_ref()
    }

    /// Judges every story in the catalog. Stories that fail are logged,
    /// reported to the observer and left out of `verdicts`.
    pub async fn run_batch(&self, catalog: &StoryCatalog, mode: &str) -> BatchOutcome {
        let total = catalog.stories.len();
        info!("Judging {} stories ({} skipped at discovery)", total, catalog.skipped.len());
        if let Some(logger) = &self.logger {
            report(logger.log_run_start(total, mode).await);
            for skipped in &catalog.skipped {
                report(logger.log_story_skipped(&skipped.story_id, &skipped.reason).await);
            }
        }

        let mut outcome = BatchOutcome::default();
        for (index, source) in catalog.stories.iter().enumerate() {
            if let Some(observer) = &self.observer {
                observer.start_story(&source.story_id, index, total);
            }
            match self.judge_source(source).await {
                Ok(verdict) => {
                    if let Some(observer) = &self.observer {
                        observer.story_judged(&verdict);
                    }
                    outcome.verdicts.push(verdict);
                }
                Err(e) => {
                    let message = format!("{:#}", e);
                    error!("Error processing story {}: {}", source.story_id, message);
                    if let Some(logger) = &self.logger {
                        let summary = format!("Story {} failed", source.story_id);
                        report(logger.log_error(&summary, Some(message.as_str())).await);
                    }
                    if let Some(observer) = &self.observer {
                        observer.story_failed(&source.story_id, &message);
                    }
                    outcome.failed.push(StoryFailure {
                        story_id: source.story_id.clone(),
                        error: message,
                    });
                }
            }
        }

        if let Some(logger) = &self.logger {
            report(
                logger
                    .log_run_end(outcome.verdicts.len(), outcome.failed.len())
                    .await,
            );
        }
        outcome
    }

    async fn judge_source(&self, source: &StorySource) -> Result<StoryVerdict> {
        let input = source.load().await?;
        self.evaluate(&input).await
    }

    /// Runs all stages for one story and returns its verdict.
    pub async fn evaluate(&self, input: &StoryInput) -> Result<StoryVerdict> {
        let id = input.story_id.as_str();
        info!("Processing story {}", id);
        if let Some(logger) = &self.logger {
            report(logger.log_story_start(id).await);
        }

        let retrieval_config = &self.config.retrieval;
        let index = (self.index_factory)(&input.narrative, retrieval_config);
        let mut annotations = StoryAnnotations::default();

        let claims_text = self
            .ask(id, Stage::Claims, prompts::extract_claims(&input.backstory))
            .await?;
        annotations.claims = parser::parse_claims(&claims_text);
        self.stage_done(id, Stage::Claims, annotations.claims.len()).await;
        if annotations.claims.is_empty() {
            warn!("Story {}: no claims recognised in oracle output", id);
        }
        let claims = prompts::render_claims(&annotations.claims);

        let importance_text = self
            .ask(id, Stage::Importance, prompts::classify_importance(&claims))
            .await?;
        annotations.importance = parser::parse_importance(&importance_text);
        self.stage_done(id, Stage::Importance, annotations.importance.len()).await;

        let dependencies_text = self
            .ask(id, Stage::Dependencies, prompts::map_dependencies(&claims))
            .await?;
        annotations.dependencies = parser::parse_dependencies(&dependencies_text);
        self.stage_done(id, Stage::Dependencies, annotations.dependencies.len()).await;

        let queries_text = self
            .ask(id, Stage::Queries, prompts::generate_queries(&claims))
            .await?;
        let queries = parser::parse_queries(&queries_text);
        self.stage_done(id, Stage::Queries, queries.len()).await;

        self.start_step(id, Stage::Evidence);
        let evidence =
            retrieval::gather_evidence(index.as_ref(), &queries, retrieval_config.top_k).await;
        let evidence_text = retrieval::format_evidence(&evidence, retrieval_config);
        self.end_step(id, Stage::Evidence);
        self.stage_done(id, Stage::Evidence, evidence.len()).await;

        let temporal_text = self
            .ask(id, Stage::Temporal, prompts::temporal_analysis(&claims, &evidence_text))
            .await?;
        annotations.temporal = parser::parse_temporal(&temporal_text);
        self.stage_done(id, Stage::Temporal, annotations.temporal.len()).await;

        let causal_text = self
            .ask(
                id,
                Stage::Causal,
                prompts::causal_evaluation(&claims, &importance_text, &temporal_text),
            )
            .await?;
        annotations.causal = parser::parse_causal(&causal_text);
        self.stage_done(id, Stage::Causal, annotations.causal.len()).await;

        let memory_text = self
            .ask(
                id,
                Stage::Memory,
                prompts::memory_propagation(&claims, &temporal_text, &importance_text),
            )
            .await?;
        annotations.memory = parser::parse_memory(&memory_text);
        self.stage_done(id, Stage::Memory, annotations.memory.len()).await;

        let validation_text = self
            .ask(
                id,
                Stage::Validation,
                prompts::cross_claim_validation(&claims, &causal_text, &dependencies_text),
            )
            .await?;
        annotations.orphan_proposals = parser::parse_orphan_proposals(&validation_text);
        self.stage_done(id, Stage::Validation, annotations.orphan_proposals.len()).await;

        let counterfactual_text = self
            .ask(
                id,
                Stage::Counterfactual,
                prompts::counterfactual_verification(&claims, &evidence_text, &importance_text),
            )
            .await?;
        annotations.counterfactuals = parser::parse_counterfactuals(&counterfactual_text);
        self.stage_done(id, Stage::Counterfactual, annotations.counterfactuals.len()).await;

        let assessment = self.engine.assess(&annotations);
        debug!("Story {} score:\n{}", id, assessment.breakdown.render());
        if let Some(logger) = &self.logger {
            report(logger.log_score_computed(id, &assessment.breakdown).await);
        }

        let decision_text = self
            .ask(
                id,
                Stage::Decision,
                prompts::final_decision(&DecisionContext {
                    breakdown: &assessment.breakdown,
                    threshold: self.config.scoring.threshold,
                    signals: &assessment.signals,
                    causal: &causal_text,
                    memory: &memory_text,
                    counterfactual: &counterfactual_text,
                }),
            )
            .await?;
        let decision = self.engine.decide(&assessment, &decision_text);
        self.stage_done(id, Stage::Decision, 1).await;

        info!(
            "Story {}: prediction {} (score {:.3}, confidence {:.2})",
            id, decision.prediction, assessment.breakdown.final_score, decision.confidence_score
        );
        if let Some(logger) = &self.logger {
            report(
                logger
                    .log_decision_made(
                        id,
                        decision.prediction,
                        decision.confidence_score,
                        &decision.rationale,
                    )
                    .await,
            );
        }

        Ok(StoryVerdict {
            story_id: input.story_id.clone(),
            claim_count: assessment.claims.len(),
            flagged: assessment.flagged().cloned().collect(),
            breakdown: assessment.breakdown,
            decision,
        })
    }

    /// One oracle round trip for `stage`. Failures come back as
    /// [`LoreError::StageFailed`].
    async fn ask(&self, story_id: &str, stage: Stage, prompt: String) -> Result<String> {
        self.start_step(story_id, stage);
        if let Some(logger) = &self.logger {
            report(logger.log_prompt_sent(story_id, stage, &prompt).await);
        }

        let response = self
            .oracle
            .generate(&prompt, GenerationOptions::for_stage(stage))
            .await
            .map_err(|e| LoreError::stage_failed(stage, e))?;

        if let Some(logger) = &self.logger {
            report(logger.log_response_received(story_id, stage, &response).await);
        }
        self.end_step(story_id, stage);
        Ok(response)
    }

    async fn stage_done(&self, story_id: &str, stage: Stage, records: usize) {
        debug!("Story {}: {} produced {} records", story_id, stage, records);
        if let Some(logger) = &self.logger {
            report(logger.log_stage_complete(story_id, stage, records).await);
        }
    }

    fn start_step(&self, story_id: &str, stage: Stage) {
        if let Some(observer) = &self.observer {
            observer.start_step(story_id, stage);
        }
    }

    fn end_step(&self, story_id: &str, stage: Stage) {
        if let Some(observer) = &self.observer {
            observer.end_step(story_id, stage);
        }
    }
}
