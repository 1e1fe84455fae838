//! CSV result file.
//!
//! Submission mode writes `story_id,prediction,rationale`; debug mode adds
//! `confidence_score` before `rationale`. Fields are quoted per RFC 4180.

use crate::pipeline::StoryVerdict;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    Submission,
    #[default]
    Debug,
}

impl OutputMode {
    pub fn name(&self) -> &'static str {
        match self {
            OutputMode::Submission => "submission",
            OutputMode::Debug => "debug",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            OutputMode::Submission => &["story_id", "prediction", "rationale"],
            OutputMode::Debug => &["story_id", "prediction", "confidence_score", "rationale"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub story_id: String,
    pub prediction: u8,
    pub confidence_score: f64,
    pub rationale: String,
}

impl From<&StoryVerdict> for ResultRow {
    fn from(verdict: &StoryVerdict) -> Self {
        Self {
            story_id: verdict.story_id.clone(),
            prediction: verdict.decision.prediction,
            confidence_score: verdict.decision.confidence_score,
            rationale: verdict.decision.rationale.clone(),
        }
    }
}

pub struct ResultSink {
    path: PathBuf,
    mode: OutputMode,
}

impl ResultSink {
    pub fn new(path: impl Into<PathBuf>, mode: OutputMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Replaces the file with a header plus every row, in order.
    pub async fn write_all(&self, rows: &[ResultRow]) -> Result<()> {
        let mut content = self.header();
        for row in rows {
            content.push_str(&self.render(row));
        }
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        info!("Saved {} results to {}", rows.len(), self.path.display());
        Ok(())
    }

    /// Adds one row, writing the header first only when the file is new.
    pub async fn append(&self, row: &ResultRow) -> Result<()> {
        let exists = tokio::fs::try_exists(&self.path).await.unwrap_or(false);
        let mut content = if exists { String::new() } else { self.header() };
        content.push_str(&self.render(row));

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        info!("Appended result for story {} to {}", row.story_id, self.path.display());
        Ok(())
    }

    fn header(&self) -> String {
        let mut line = self.mode.columns().join(",");
        line.push('\n');
        line
    }

    fn render(&self, row: &ResultRow) -> String {
        let prediction = row.prediction.to_string();
        let confidence = row.confidence_score.to_string();
        let fields: Vec<&str> = match self.mode {
            OutputMode::Submission => vec![
                row.story_id.as_str(),
                prediction.as_str(),
                row.rationale.as_str(),
            ],
            OutputMode::Debug => vec![
                row.story_id.as_str(),
                prediction.as_str(),
                confidence.as_str(),
                row.rationale.as_str(),
            ],
        };
        let mut line = fields.into_iter().map(quote).collect::<Vec<_>>().join(",");
        line.push('\n');
        line
    }
}

/// Quotes a field when it contains a delimiter, quote or line break.
pub fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(id: &str, prediction: u8, rationale: &str) -> ResultRow {
        ResultRow {
            story_id: id.to_string(),
            prediction,
            confidence_score: 0.6,
            rationale: rationale.to_string(),
        }
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a, b"), "\"a, b\"");
        assert_eq!(quote(r#"he said "no""#), r#""he said ""no""""#);
        assert_eq!(quote("two\nlines"), "\"two\nlines\"");
    }

    #[tokio::test]
    async fn test_write_all_debug_columns() {
        let dir = tempdir().unwrap();
        let sink = ResultSink::new(dir.path().join("results.csv"), OutputMode::Debug);
        sink.write_all(&[row("1", 1, "Fine"), row("2", 0, "Claim 3, contradicted")])
            .await
            .unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(
            content,
            "story_id,prediction,confidence_score,rationale\n1,1,0.6,Fine\n2,0,0.6,\"Claim 3, contradicted\"\n"
        );
    }

    #[tokio::test]
    async fn test_submission_mode_drops_confidence() {
        let dir = tempdir().unwrap();
        let sink = ResultSink::new(dir.path().join("results.csv"), OutputMode::Submission);
        sink.write_all(&[row("7", 1, "ok")]).await.unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content, "story_id,prediction,rationale\n7,1,ok\n");
    }

    #[tokio::test]
    async fn test_append_writes_header_once() {
        let dir = tempdir().unwrap();
        let sink = ResultSink::new(dir.path().join("results.csv"), OutputMode::Submission);
        sink.append(&row("1", 1, "a")).await.unwrap();
        sink.append(&row("2", 0, "b")).await.unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content, "story_id,prediction,rationale\n1,1,a\n2,0,b\n");
    }
}
