use anyhow::Result;
use async_trait::async_trait;
use lore_engine::config::LoreConfig;
use lore_engine::oracle::{GenerationOptions, Oracle};
use lore_engine::pipeline::{Stage, StoryPipeline};
use lore_engine::sink::{OutputMode, ResultRow, ResultSink};
use lore_engine::stories::discover_stories;
use std::path::PathBuf;
use std::sync::Mutex;

/// Answers each prompt with the canned response for the story currently
/// being judged. The story is picked up from the claim extraction prompt.
struct FixtureOracle {
    current: Mutex<Option<&'static Script>>,
    calls: Mutex<Vec<Stage>>,
}

struct Script {
    marker: &'static str,
    claims: &'static str,
    importance: &'static str,
    dependencies: &'static str,
    queries: &'static str,
    temporal: &'static str,
    causal: &'static str,
    memory: &'static str,
    validation: &'static str,
    counterfactual: &'static str,
    decision: &'static str,
}

const FORGE: Script = Script {
    marker: "Ivo",
    claims: "1. Was apprenticed to a blacksmith as a boy.\n2. Loves the forge more than anything.\n3. Hums while he works.",
    importance: "Claim 1\nImportance: MAJOR\nClaim 2\nImportance: MAJOR\nClaim 3\nImportance: MINOR",
    dependencies: "Claim 2 -> Claim 1 (the love grew out of the apprenticeship)",
    queries: "Claim 1: apprenticed smith\nClaim 2: forge dawn\nClaim 3: humming",
    temporal: "Claim 1\nEARLY:\nStatus: Supports\nClaim 2\nLATE:\nStatus: Supports",
    causal: "Claim 1\nResult: CONSISTENT\nClaim 2\nResult: CONSISTENT\nClaim 3\nResult: CONSISTENT",
    memory: "Claim 2\nTransition Type: GRADUAL\nTrigger Events: NONE FOUND",
    validation: "Claim 2\nStatus: VALID",
    counterfactual: "Claim 2\nVerification Result: SATISFIED",
    decision: "Prediction: 1\nConfidence Score: 0.9\nRationale: Ivo's devotion to the forge holds throughout.",
};

const LIGHTHOUSE: Script = Script {
    marker: "Mara",
    claims: "1. Grew up tending the lighthouse on Skerry Island.\n2. Swore never to leave the island.\n3. Dreams of becoming the next lighthouse keeper.",
    importance: "Claim 1\nImportance: MAJOR\nClaim 2\nImportance: MAJOR\nClaim 3\nImportance: MINOR",
    dependencies: "Claim 3 -> Claim 2 (keeping the light means staying)",
    queries: "Claim 1: lighthouse lamp\nClaim 2: sailed Lisbon\nClaim 3: keeper cottage",
    temporal: "Claim 1\nEARLY: Supports\nClaim 2\nLATE:\nStatus: Contradicts\nExplanation: sails for Lisbon",
    causal: "Claim 1\nResult: CONSISTENT\nClaim 2\nResult: FATAL CONTRADICTION\nClaim 3\nResult: CONSISTENT",
    memory: "Claim 2\nTransition Type: SUDDEN\nTrigger Events: storm",
    validation: "Claim 3\nStatus: CAUSALLY ORPHANED",
    counterfactual: "Claim 2\nVerification Result: VIOLATED",
    decision: "Prediction: 0\nConfidence Score: 0.3\nRationale: Root Claim 2 contradicted, \"she sailed for Lisbon\"",
};

impl FixtureOracle {
    fn new() -> Self {
        Self {
            current: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

fn stage_of(prompt: &str) -> Stage {
    let markers = [
        ("Make the final consistency judgment", Stage::Decision),
        ("Extract all explicit and implicit claims", Stage::Claims),
        ("Classify each claim as MAJOR or MINOR", Stage::Importance),
        ("Map logical dependencies", Stage::Dependencies),
        ("short search query", Stage::Queries),
        ("temporal constraint mapping", Stage::Temporal),
        ("Evaluate narrative consistency", Stage::Causal),
        ("mental state", Stage::Memory),
        ("cross-claim dependency validation", Stage::Validation),
        ("counterfactual verification", Stage::Counterfactual),
    ];
    markers
        .iter()
        .find(|(marker, _)| prompt.contains(marker))
        .map(|(_, stage)| *stage)
        .unwrap_or(Stage::Evidence)
}

#[async_trait]
impl Oracle for FixtureOracle {
    async fn generate(&self, prompt: &str, _options: GenerationOptions) -> Result<String> {
        let stage = stage_of(prompt);
        self.calls.lock().unwrap().push(stage);

        if stage == Stage::Claims {
            let script = [&FORGE, &LIGHTHOUSE]
                .into_iter()
                .find(|s| prompt.contains(s.marker));
            *self.current.lock().unwrap() = script;
        }
        let Some(script) = *self.current.lock().unwrap() else {
            anyhow::bail!("no fixture for prompt");
        };

        let text = match stage {
            Stage::Claims => script.claims,
            Stage::Importance => script.importance,
            Stage::Dependencies => script.dependencies,
            Stage::Queries => script.queries,
            Stage::Temporal => script.temporal,
            Stage::Causal => script.causal,
            Stage::Memory => script.memory,
            Stage::Validation => script.validation,
            Stage::Counterfactual => script.counterfactual,
            Stage::Decision => script.decision,
            Stage::Evidence => anyhow::bail!("unrecognised prompt"),
        };
        Ok(text.to_string())
    }
}

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/data")
}

#[tokio::test]
async fn test_mock_judging_run() -> Result<()> {
    let catalog = discover_stories(&fixtures()).await?;
    assert_eq!(catalog.stories.len(), 2);
    assert_eq!(catalog.skipped.len(), 1);
    assert_eq!(catalog.skipped[0].story_id, "3");

    let oracle = FixtureOracle::new();
    let pipeline = StoryPipeline::new(oracle, LoreConfig::default());
    let outcome = pipeline.run_batch(&catalog, OutputMode::Debug.name()).await;
    assert!(outcome.failed.is_empty(), "{:?}", outcome.failed);

    let forge = &outcome.verdicts[0];
    assert_eq!(forge.story_id, "1");
    assert_eq!(forge.decision.prediction, 1);
    assert_eq!(forge.breakdown.final_score, 1.0);
    assert!(forge.flagged.is_empty());

    let lighthouse = &outcome.verdicts[1];
    assert_eq!(lighthouse.story_id, "2");
    assert_eq!(lighthouse.decision.prediction, 0);
    // FATAL (1.0) + orphaned claim 3 (0.4) + VIOLATED (0.5) over two MAJOR claims
    assert!((lighthouse.breakdown.total_penalty - 1.9).abs() < 1e-9);
    assert!((lighthouse.breakdown.final_score - 0.05).abs() < 1e-9);
    assert!(lighthouse.decision.cites_flagged_claim);

    let dir = tempfile::tempdir()?;
    let sink = ResultSink::new(dir.path().join("results.csv"), OutputMode::Debug);
    let rows: Vec<ResultRow> = outcome.verdicts.iter().map(ResultRow::from).collect();
    sink.write_all(&rows).await?;

    let csv = std::fs::read_to_string(sink.path())?;
    assert_eq!(
        csv,
        "story_id,prediction,confidence_score,rationale\n\
         1,1,0.9,Ivo's devotion to the forge holds throughout.\n\
         2,0,0.3,\"Root Claim 2 contradicted, \"\"she sailed for Lisbon\"\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_every_stage_is_asked_once_per_story() -> Result<()> {
    let catalog = discover_stories(&fixtures()).await?;
    let oracle = std::sync::Arc::new(FixtureOracle::new());
    let pipeline = StoryPipeline::new(oracle.clone(), LoreConfig::default());
    pipeline.run_batch(&catalog, OutputMode::Submission.name()).await;

    let calls = oracle.calls.lock().unwrap().clone();
    let expected: Vec<Stage> = Stage::ALL
        .into_iter()
        .filter(|s| *s != Stage::Evidence)
        .collect();
    assert_eq!(calls.len(), expected.len() * 2);
    assert_eq!(&calls[..expected.len()], expected.as_slice());
    assert!(!calls.contains(&Stage::Evidence));
    Ok(())
}
