#![cfg(feature = "e2e")]

use anyhow::Result;
use lore_engine::config::LoreConfig;
use lore_engine::oracle::ShellOracle;
use lore_engine::pipeline::StoryPipeline;
use lore_engine::stories::discover_stories;
use std::path::PathBuf;

/// Needs a working `gemini` CLI on PATH.
#[tokio::test]
async fn test_judges_fixture_stories_with_gemini() -> Result<()> {
    let data_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/data");
    let catalog = discover_stories(&data_dir).await?;

    let oracle = ShellOracle::new("gemini").with_model("gemini-2.5-flash".to_string());
    let pipeline = StoryPipeline::new(oracle, LoreConfig::default());
    let outcome = pipeline.run_batch(&catalog, "debug").await;

    for verdict in &outcome.verdicts {
        println!(
            "Story {}: {} ({:.3}) {}",
            verdict.story_id,
            verdict.decision.prediction,
            verdict.breakdown.final_score,
            verdict.decision.rationale
        );
        assert!((0.0..=1.0).contains(&verdict.breakdown.final_score));
        assert!(verdict.decision.prediction <= 1);
    }
    assert_eq!(outcome.verdicts.len() + outcome.failed.len(), catalog.stories.len());
    Ok(())
}
