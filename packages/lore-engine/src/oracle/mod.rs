//! Text-generation backends.
//!
//! Every stage of a story pass asks an [`Oracle`] for free text and parses
//! the answer. Retries, timeouts and backoff belong to the adapters; the
//! pipeline sees one `Result` per call.

pub mod http;
pub mod shell;

pub use http::HttpOracle;
pub use shell::ShellOracle;

use crate::pipeline::Stage;
use anyhow::Result;
use async_trait::async_trait;

pub const DEFAULT_TEMPERATURE: f32 = 0.1;
const FALLBACK_MAX_NEW_TOKENS: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_new_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: FALLBACK_MAX_NEW_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl GenerationOptions {
    pub fn for_stage(stage: Stage) -> Self {
        Self {
            max_new_tokens: stage.max_new_tokens().unwrap_or(FALLBACK_MAX_NEW_TOKENS),
            ..Self::default()
        }
    }
}

/// Abstract interface for a text generator (AI CLI, hosted inference API).
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String>;
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for std::sync::Arc<T> {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String> {
        (**self).generate(prompt, options).await
    }
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Box<T> {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String> {
        (**self).generate(prompt, options).await
    }
}

// Exposed for e2e and integration testing
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type ScriptedAction = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

    /// Replays queued responses in order, then answers with `fallback`.
    /// Every prompt it receives is recorded.
    #[derive(Clone)]
    pub struct ScriptedOracle {
        pub responses: Arc<Mutex<VecDeque<ScriptedAction>>>,
        pub prompts: Arc<Mutex<Vec<(String, GenerationOptions)>>>,
        pub fallback: String,
    }

    impl Default for ScriptedOracle {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ScriptedOracle {
        pub fn new() -> Self {
            Self {
                responses: Arc::new(Mutex::new(VecDeque::new())),
                prompts: Arc::new(Mutex::new(Vec::new())),
                fallback: "MOCK_RESPONSE".to_string(),
            }
        }

        pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
            self.fallback = fallback.into();
            self
        }

        pub fn add_response(&self, response: impl Into<String>) {
            let response = response.into();
            let mut guard = self.responses.lock().unwrap();
            guard.push_back(Box::new(move |_| Ok(response.clone())));
        }

        pub fn add_action<F>(&self, action: F)
        where
            F: Fn(&str) -> Result<String> + Send + Sync + 'static,
        {
            let mut guard = self.responses.lock().unwrap();
            guard.push_back(Box::new(action));
        }

        pub fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub fn recorded_prompts(&self) -> Vec<String> {
            self.prompts
                .lock()
                .unwrap()
                .iter()
                .map(|(p, _)| p.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), options));

            let action_opt = {
                let mut guard = self.responses.lock().unwrap();
                guard.pop_front()
            };

            if let Some(action) = action_opt {
                action(prompt)
            } else {
                Ok(self.fallback.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::ScriptedOracle;
    use super::*;

    #[test]
    fn test_options_follow_stage_budget() {
        let options = GenerationOptions::for_stage(Stage::Temporal);
        assert_eq!(options.max_new_tokens, 3000);
        assert_eq!(options.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(
            GenerationOptions::for_stage(Stage::Evidence).max_new_tokens,
            FALLBACK_MAX_NEW_TOKENS
        );
    }

    #[tokio::test]
    async fn test_scripted_oracle_replays_then_falls_back() {
        let oracle = ScriptedOracle::new();
        oracle.add_response("first");
        oracle.add_action(|prompt| Ok(format!("echo: {prompt}")));
        oracle.add_action(|_| Err(anyhow::anyhow!("boom")));

        let options = GenerationOptions::default();
        assert_eq!(oracle.generate("a", options).await.unwrap(), "first");
        assert_eq!(oracle.generate("b", options).await.unwrap(), "echo: b");
        assert!(oracle.generate("c", options).await.is_err());
        assert_eq!(oracle.generate("d", options).await.unwrap(), "MOCK_RESPONSE");
        assert_eq!(oracle.recorded_prompts(), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_scripted_oracle_custom_fallback() {
        let oracle = ScriptedOracle::new().with_fallback("Prediction: 1");
        let options = GenerationOptions::for_stage(Stage::Decision);
        assert_eq!(oracle.generate("x", options).await.unwrap(), "Prediction: 1");
        assert_eq!(oracle.prompt_count(), 1);
        assert_eq!(oracle.prompts.lock().unwrap()[0].1.max_new_tokens, 600);
    }
}
