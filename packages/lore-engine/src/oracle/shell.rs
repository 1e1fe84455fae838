use super::{GenerationOptions, Oracle};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const MAX_ATTEMPTS: u32 = 3;
const STDERR_EXCERPT_CHARS: usize = 500;

/// Runs an AI CLI (default: gemini) once per prompt: `<exe> [-m model] -p <prompt>`.
#[derive(Debug, Clone)]
pub struct ShellOracle {
    pub executable: String,
    pub model: Option<String>,
    pub work_dir: Option<PathBuf>,
    /// Base of the exponential backoff between rate-limited attempts.
    pub backoff_unit: Duration,
}

impl ShellOracle {
    pub fn new(executable: &str) -> Self {
        Self {
            executable: executable.to_string(),
            model: None,
            work_dir: None,
            backoff_unit: Duration::from_secs(1),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = Some(work_dir);
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    async fn execute_prompt(&self, prompt: &str) -> Result<String> {
        let mut cmd = Command::new(&self.executable);
        if let Some(dir) = &self.work_dir {
            cmd.current_dir(dir);
        }
        if let Some(model) = &self.model {
            cmd.arg("-m").arg(model);
        }
        cmd.arg("-p").arg(prompt);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!(
            "Running {} ({} prompt chars)",
            self.executable,
            prompt.chars().count()
        );

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to spawn AI CLI '{}'", self.executable))?;

        if !output.status.success() {
            // stderr goes into the error so the retry loop can spot rate limiting
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "AI CLI failed with status: {}. Stderr: {}",
                output.status,
                stderr.chars().take(STDERR_EXCERPT_CHARS).collect::<String>()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub(crate) fn is_rate_limit(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("exhausted your capacity")
        || lower.contains("rate limit")
        || lower.contains("quota")
}

#[async_trait]
impl Oracle for ShellOracle {
    /// The CLI picks its own generation budget; options are not forwarded.
    async fn generate(&self, prompt: &str, _options: GenerationOptions) -> Result<String> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.execute_prompt(prompt).await {
                Ok(output) => return Ok(output),
                Err(e) => {
                    if is_rate_limit(&format!("{e:#}")) && attempt < MAX_ATTEMPTS {
                        let backoff = self.backoff_unit * 2u32.pow(attempt); // 2, 4 units
                        warn!(
                            "Model rate limited (attempt {}/{}). Retrying in {:?}...",
                            attempt, MAX_ATTEMPTS, backoff
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_oracle_builder() {
        let oracle = ShellOracle::new("gemini")
            .with_model("gemini-2.0-flash".to_string())
            .with_work_dir(PathBuf::from("/tmp"))
            .with_backoff_unit(Duration::from_millis(5));

        assert_eq!(oracle.executable, "gemini");
        assert_eq!(oracle.model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(oracle.work_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(oracle.backoff_unit, Duration::from_millis(5));
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limit("Stderr: You have exhausted your capacity"));
        assert!(is_rate_limit("429 Rate limit reached"));
        assert!(is_rate_limit("quota exceeded"));
        assert!(!is_rate_limit("segmentation fault"));
    }

    #[tokio::test]
    async fn test_shell_oracle_invalid_command() {
        let oracle = ShellOracle::new("non_existent_command_12345");
        let result = oracle.generate("hello", GenerationOptions::default()).await;
        assert!(result.is_err());
    }

    #[cfg(unix)]
    fn write_script(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_oracle_passes_model_and_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "fake-ai", r#"echo "$@""#);

        let oracle = ShellOracle::new(script.to_str().unwrap()).with_model("m1".to_string());
        let output = oracle
            .generate("Is it consistent?", GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(output.trim(), "-m m1 -p Is it consistent?");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_oracle_retries_on_rate_limit() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("calls");
        let body = format!(
            r#"echo x >> "{0}"
if [ "$(wc -l < "{0}")" -lt 2 ]; then
  echo "rate limit hit" >&2
  exit 1
fi
echo recovered"#,
            counter.display()
        );
        let script = write_script(dir.path(), "flaky-ai", &body);

        let oracle = ShellOracle::new(script.to_str().unwrap())
            .with_backoff_unit(Duration::from_millis(1));
        let output = oracle
            .generate("prompt", GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(output.trim(), "recovered");
        assert_eq!(std::fs::read_to_string(&counter).unwrap().lines().count(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_oracle_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "broken-ai", "echo 'model not found' >&2\nexit 3");

        let oracle = ShellOracle::new(script.to_str().unwrap());
        let err = oracle
            .generate("prompt", GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }
}
