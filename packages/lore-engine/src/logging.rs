use crate::pipeline::Stage;
use crate::scoring::ScoreBreakdown;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Structured log event types for a judging run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LogEventType {
    RunStart,
    StoryStart,
    PromptSent,
    ResponseReceived,
    StageComplete,
    ScoreComputed,
    DecisionMade,
    StorySkipped,
    RunEnd,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single structured log entry, serialized as one JSON line in the JSONL file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: String,
    pub event_type: LogEventType,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEvent {
    pub fn new(
        event_type: LogEventType,
        level: LogLevel,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event_type,
            level,
            message: message.into(),
            details,
        }
    }

    pub fn info_with_details(
        event_type: LogEventType,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::new(event_type, LogLevel::Info, message, Some(details))
    }

    pub fn debug_with_details(
        event_type: LogEventType,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::new(event_type, LogLevel::Debug, message, Some(details))
    }

    pub fn warn_with_details(
        event_type: LogEventType,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::new(event_type, LogLevel::Warn, message, Some(details))
    }
}

/// Writes one JSONL execution log per run.
///
/// Each run gets `<log_dir>/run_<timestamp>_<id>.jsonl`; every event is
/// appended and flushed on its own so a crashed run still leaves a usable log.
pub struct RunLogger {
    run_id: String,
    log_file_path: PathBuf,
}

impl RunLogger {
    /// Creates the log directory if needed and names a fresh log file.
    pub async fn new(log_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(log_dir)
            .await
            .context("Failed to create log directory")?;

        let run_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let log_file_path = log_dir.join(format!("run_{}_{}.jsonl", stamp, run_id));

        Ok(Self {
            run_id,
            log_file_path,
        })
    }

    /// Appends a log event as a JSON line to the execution log file.
    pub async fn log(&self, event: LogEvent) -> Result<()> {
        let mut line = serde_json::to_string(&event).context("Failed to serialize log event")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .context("Failed to open log file")?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    pub async fn log_run_start(&self, story_count: usize, mode: &str) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::RunStart,
            format!("Started run {} over {} stories", self.run_id, story_count),
            serde_json::json!({
                "run_id": self.run_id,
                "story_count": story_count,
                "mode": mode,
            }),
        ))
        .await
    }

    pub async fn log_story_start(&self, story_id: &str) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::StoryStart,
            format!("Judging story {}", story_id),
            serde_json::json!({ "story_id": story_id }),
        ))
        .await
    }

    /// Full prompt text, at debug level.
    pub async fn log_prompt_sent(&self, story_id: &str, stage: Stage, prompt: &str) -> Result<()> {
        self.log(LogEvent::debug_with_details(
            LogEventType::PromptSent,
            format!("Prompt sent for {} (story {})", stage, story_id),
            serde_json::json!({
                "story_id": story_id,
                "stage": stage,
                "prompt": prompt,
                "prompt_length": prompt.len(),
            }),
        ))
        .await
    }

    pub async fn log_response_received(
        &self,
        story_id: &str,
        stage: Stage,
        response: &str,
    ) -> Result<()> {
        self.log(LogEvent::debug_with_details(
            LogEventType::ResponseReceived,
            format!("Response for {} (story {})", stage, story_id),
            serde_json::json!({
                "story_id": story_id,
                "stage": stage,
                "response": response,
                "response_length": response.len(),
            }),
        ))
        .await
    }

    /// `records` is how many structured records the stage parsed.
    pub async fn log_stage_complete(
        &self,
        story_id: &str,
        stage: Stage,
        records: usize,
    ) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::StageComplete,
            format!("{} complete for story {}: {} records", stage, story_id, records),
            serde_json::json!({
                "story_id": story_id,
                "stage": stage,
                "records": records,
            }),
        ))
        .await
    }

    pub async fn log_score_computed(&self, story_id: &str, breakdown: &ScoreBreakdown) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::ScoreComputed,
            format!("Story {} scored {:.3}", story_id, breakdown.final_score),
            serde_json::json!({
                "story_id": story_id,
                "breakdown": serde_json::to_value(breakdown)?,
            }),
        ))
        .await
    }

    pub async fn log_decision_made(
        &self,
        story_id: &str,
        prediction: u8,
        confidence: f64,
        rationale: &str,
    ) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::DecisionMade,
            format!(
                "Story {} judged {} (confidence {:.2})",
                story_id,
                if prediction == 1 { "consistent" } else { "inconsistent" },
                confidence
            ),
            serde_json::json!({
                "story_id": story_id,
                "prediction": prediction,
                "confidence_score": confidence,
                "rationale": rationale,
            }),
        ))
        .await
    }

    pub async fn log_story_skipped(&self, story_id: &str, reason: &str) -> Result<()> {
        self.log(LogEvent::warn_with_details(
            LogEventType::StorySkipped,
            format!("Skipped story {}: {}", story_id, reason),
            serde_json::json!({
                "story_id": story_id,
                "reason": reason,
            }),
        ))
        .await
    }

    pub async fn log_run_end(&self, judged: usize, failed: usize) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::RunEnd,
            format!("Run {} finished: {} judged, {} failed", self.run_id, judged, failed),
            serde_json::json!({
                "run_id": self.run_id,
                "judged": judged,
                "failed": failed,
            }),
        ))
        .await
    }

    pub async fn log_error(&self, message: &str, details: Option<&str>) -> Result<()> {
        self.log(LogEvent::new(
            LogEventType::Error,
            LogLevel::Error,
            message,
            details.map(|d| serde_json::json!({ "error": d })),
        ))
        .await
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Returns the path to the log file.
    pub fn log_file_path(&self) -> &Path {
        &self.log_file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn read_events(logger: &RunLogger) -> Vec<LogEvent> {
        let content = tokio::fs::read_to_string(logger.log_file_path())
            .await
            .unwrap();
        content
            .trim()
            .split('\n')
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_logger_writes_story_events() {
        let tmp = tempdir().unwrap();
        let logger = RunLogger::new(&tmp.path().join("runs")).await.unwrap();

        logger.log_run_start(2, "debug").await.unwrap();
        logger.log_story_start("12").await.unwrap();
        logger
            .log_prompt_sent("12", Stage::Claims, "Extract claims please")
            .await
            .unwrap();
        logger
            .log_response_received("12", Stage::Claims, "1. Born at sea")
            .await
            .unwrap();
        logger
            .log_stage_complete("12", Stage::Claims, 1)
            .await
            .unwrap();
        logger
            .log_decision_made("12", 1, 0.8, "No contradictions")
            .await
            .unwrap();

        let events = read_events(&logger).await;
        assert_eq!(events.len(), 6);
        assert!(events.iter().all(|e| !e.timestamp.is_empty()));

        assert_eq!(events[0].event_type, LogEventType::RunStart);
        assert_eq!(events[0].level, LogLevel::Info);

        let prompt = &events[2];
        assert_eq!(prompt.event_type, LogEventType::PromptSent);
        assert_eq!(prompt.level, LogLevel::Debug);
        let details = prompt.details.as_ref().unwrap();
        assert_eq!(details["stage"], "claims");
        assert_eq!(details["prompt_length"], 21);

        assert_eq!(events[5].details.as_ref().unwrap()["prediction"], 1);
    }

    #[tokio::test]
    async fn test_logger_skip_and_error_events() {
        let tmp = tempdir().unwrap();
        let logger = RunLogger::new(tmp.path()).await.unwrap();

        logger
            .log_story_skipped("3", "missing backstory")
            .await
            .unwrap();
        logger
            .log_error("Story 4 failed", Some("oracle timed out"))
            .await
            .unwrap();
        logger.log_run_end(1, 1).await.unwrap();

        let events = read_events(&logger).await;
        assert_eq!(events[0].event_type, LogEventType::StorySkipped);
        assert_eq!(events[0].level, LogLevel::Warn);
        assert_eq!(events[1].level, LogLevel::Error);
        assert_eq!(events[1].details.as_ref().unwrap()["error"], "oracle timed out");
        assert_eq!(events[2].event_type, LogEventType::RunEnd);
    }

    #[tokio::test]
    async fn test_each_run_gets_its_own_file() {
        let tmp = tempdir().unwrap();
        let first = RunLogger::new(tmp.path()).await.unwrap();
        let second = RunLogger::new(tmp.path()).await.unwrap();
        assert_ne!(first.log_file_path(), second.log_file_path());
        assert!(
            first
                .log_file_path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("run_")
        );
    }
}
