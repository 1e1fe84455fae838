//! Story discovery in a data directory.
//!
//! A story is a `story_<id>.txt` narrative plus a `backstory_<id>.txt`
//! sharing the same id.

use crate::error::LoreError;
use crate::pipeline::StoryInput;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

const NARRATIVE_PREFIX: &str = "story_";
const BACKSTORY_PREFIX: &str = "backstory_";
const EXTENSION: &str = ".txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySource {
    pub story_id: String,
    pub narrative_path: PathBuf,
    pub backstory_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStory {
    pub story_id: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct StoryCatalog {
    /// Sorted by narrative file name.
    pub stories: Vec<StorySource>,
    pub skipped: Vec<SkippedStory>,
}

impl StorySource {
    pub async fn load(&self) -> Result<StoryInput> {
        Ok(StoryInput {
            story_id: self.story_id.clone(),
            narrative: read_input(&self.story_id, &self.narrative_path).await?,
            backstory: read_input(&self.story_id, &self.backstory_path).await?,
        })
    }
}

async fn read_input(story_id: &str, path: &Path) -> Result<String> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(LoreError::StoryInputMissing {
            story_id: story_id.to_string(),
            path: path.to_path_buf(),
        }
        .into());
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Lists the stories in `data_dir`. Narratives without a backstory are
/// reported in `skipped` rather than failing discovery.
pub async fn discover_stories(data_dir: &Path) -> Result<StoryCatalog> {
    let mut entries = tokio::fs::read_dir(data_dir)
        .await
        .with_context(|| format!("Failed to read data directory {}", data_dir.display()))?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();

    let mut catalog = StoryCatalog::default();
    for name in names {
        let Some(story_id) = name
            .strip_prefix(NARRATIVE_PREFIX)
            .and_then(|rest| rest.strip_suffix(EXTENSION))
        else {
            continue;
        };
        if story_id.is_empty() {
            continue;
        }

        let backstory_path = data_dir.join(format!("{BACKSTORY_PREFIX}{story_id}{EXTENSION}"));
        if !tokio::fs::try_exists(&backstory_path).await.unwrap_or(false) {
            warn!("Skipping story {}: no matching backstory", story_id);
            catalog.skipped.push(SkippedStory {
                story_id: story_id.to_string(),
                reason: format!("missing {}", backstory_path.display()),
            });
            continue;
        }

        catalog.stories.push(StorySource {
            story_id: story_id.to_string(),
            narrative_path: data_dir.join(&name),
            backstory_path,
        });
    }

    Ok(catalog)
}
