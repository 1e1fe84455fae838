use crate::pipeline::{Stage, StoryVerdict};

/// Progress hooks for whoever is driving a run (terminal, tests).
pub trait RunObserver: Send + Sync {
    /// A story pass is starting (`index` is zero-based).
    fn start_story(&self, story_id: &str, index: usize, total: usize);

    /// Indicate that a long-running stage is starting (e.g., show spinner).
    fn start_step(&self, story_id: &str, stage: Stage);

    fn end_step(&self, story_id: &str, stage: Stage);

    fn story_judged(&self, verdict: &StoryVerdict);

    /// The story was dropped from the results.
    fn story_failed(&self, story_id: &str, error: &str);

    fn log_info(&self, msg: &str);

    fn log_error(&self, msg: &str);
}

// Exposed for testing
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every callback as a short line, e.g. `"step 7 causal"`.
    #[derive(Default, Clone)]
    pub struct RecordingObserver {
        pub events: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingObserver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl RunObserver for RecordingObserver {
        fn start_story(&self, story_id: &str, index: usize, total: usize) {
            self.push(format!("story {} {}/{}", story_id, index + 1, total));
        }

        fn start_step(&self, story_id: &str, stage: Stage) {
            self.push(format!("step {} {}", story_id, stage));
        }

        fn end_step(&self, _story_id: &str, _stage: Stage) {}

        fn story_judged(&self, verdict: &StoryVerdict) {
            self.push(format!(
                "judged {} {}",
                verdict.story_id, verdict.decision.prediction
            ));
        }

        fn story_failed(&self, story_id: &str, _error: &str) {
            self.push(format!("failed {}", story_id));
        }

        fn log_info(&self, _msg: &str) {}
        fn log_error(&self, _msg: &str) {}
    }
}
