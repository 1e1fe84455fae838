use crate::pipeline::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Typed failures surfaced by the engine. Everything else travels as
/// `anyhow::Error`.
#[derive(Debug, Error)]
pub enum LoreError {
    /// An oracle call for a pipeline stage failed after the adapter gave up.
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    /// The oracle adapter cannot be constructed (missing token, empty command).
    #[error("Oracle misconfigured: {0}")]
    OracleMisconfigured(String),

    #[error("Oracle endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Story {story_id}: missing input {}", path.display())]
    StoryInputMissing { story_id: String, path: PathBuf },
}

impl LoreError {
    pub fn stage_failed(stage: Stage, source: anyhow::Error) -> Self {
        Self::StageFailed {
            stage,
            source: source.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }
}
