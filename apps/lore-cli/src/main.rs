use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::ProgressBar;
use lore_engine::{
    config::LoreConfig,
    interaction::RunObserver,
    logging::RunLogger,
    oracle::{HttpOracle, Oracle, ShellOracle, http::DEFAULT_MODEL},
    pipeline::{Stage, StoryPipeline, StoryVerdict},
    sink::{OutputMode, ResultRow, ResultSink},
    stories::discover_stories,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Judge whether backstories stay consistent with their narratives", long_about = None)]
struct Args {
    /// Directory holding story_<id>.txt and backstory_<id>.txt pairs
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Result CSV path
    #[arg(short, long, default_value = "results.csv")]
    output: PathBuf,

    /// Write the submission columns only (no confidence score)
    #[arg(long)]
    submission: bool,

    /// Which oracle answers the stage prompts
    #[arg(long, value_enum, default_value_t = Provider::Shell)]
    provider: Provider,

    /// Executable to use for AI calls (default: "gemini")
    #[arg(long, default_value = "gemini")]
    ai_cmd: String,

    /// Model to use (provider default when omitted)
    #[arg(short, long)]
    model: Option<String>,

    /// JSON config file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Passages retrieved per claim query
    #[arg(long)]
    top_k: Option<usize>,

    /// Directory for the per-run JSONL execution logs
    #[arg(long, default_value = ".lore/runs")]
    log_dir: PathBuf,

    /// Append rows to an existing result file instead of replacing it
    #[arg(long)]
    append: bool,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    /// Local AI CLI executable
    Shell,
    /// Hosted text-generation endpoint
    Http,
}

impl Args {
    fn output_mode(&self) -> OutputMode {
        if self.submission {
            OutputMode::Submission
        } else {
            OutputMode::Debug
        }
    }
}

/// Terminal progress: one spinner per stage, one line per story.
struct ConsoleObserver {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleObserver {
    fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.spinner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clear_spinner(&self) {
        if let Some(spinner) = self.slot().take() {
            spinner.finish_and_clear();
        }
    }
}

impl RunObserver for ConsoleObserver {
    fn start_story(&self, story_id: &str, index: usize, total: usize) {
        info!("Story {} ({}/{})", story_id, index + 1, total);
        println!(
            "\n{} {}",
            style(format!("[{}/{}]", index + 1, total)).dim(),
            style(format!("Story {}", story_id)).bold().cyan()
        );
    }

    fn start_step(&self, story_id: &str, stage: Stage) {
        self.clear_spinner();
        let spinner = ProgressBar::new_spinner();
        spinner.set_message(format!("{}: {}...", story_id, stage));
        spinner.enable_steady_tick(Duration::from_millis(100));
        *self.slot() = Some(spinner);
    }

    fn end_step(&self, _story_id: &str, _stage: Stage) {
        self.clear_spinner();
    }

    fn story_judged(&self, verdict: &StoryVerdict) {
        self.clear_spinner();
        let label = if verdict.decision.prediction == 1 {
            style("CONSISTENT").bold().green()
        } else {
            style("INCONSISTENT").bold().red()
        };
        println!(
            "  {} score {:.3} confidence {} ({} claims, {} flagged)",
            label,
            verdict.breakdown.final_score,
            verdict.decision.confidence_score,
            verdict.claim_count,
            verdict.flagged.len()
        );
        println!("  {}", style(&verdict.decision.rationale).dim());
    }

    fn story_failed(&self, story_id: &str, error: &str) {
        self.clear_spinner();
        println!(
            "  {} {}",
            style(format!("Story {} failed:", story_id)).red(),
            error
        );
    }

    fn log_info(&self, msg: &str) {
        info!("{}", msg);
        println!("{}", style(msg).green());
    }

    fn log_error(&self, msg: &str) {
        warn!("{}", msg);
        println!("{}", style(msg).red());
    }
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("info,lore_cli=debug,lore_engine=debug")
    } else {
        EnvFilter::new("warn,lore_cli=info,lore_engine=info")
    };

    fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn build_oracle(args: &Args) -> Result<Box<dyn Oracle>> {
    match args.provider {
        Provider::Shell => {
            let mut oracle = ShellOracle::new(&args.ai_cmd);
            if let Some(model) = &args.model {
                oracle = oracle.with_model(model.clone());
            }
            Ok(Box::new(oracle))
        }
        Provider::Http => {
            let model = args.model.as_deref().unwrap_or(DEFAULT_MODEL);
            Ok(Box::new(HttpOracle::from_env(model)?))
        }
    }
}

async fn load_config(args: &Args) -> Result<LoreConfig> {
    let mut config = LoreConfig::load(args.config.as_deref()).await?;
    if let Some(top_k) = args.top_k {
        config.retrieval.top_k = top_k;
        config.validate()?;
    }
    Ok(config)
}

async fn write_results(sink: &ResultSink, rows: &[ResultRow], append: bool) -> Result<()> {
    if append {
        for row in rows {
            sink.append(row).await?;
        }
        Ok(())
    } else {
        sink.write_all(rows).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    setup_logging(args.debug);

    println!(
        "\n{}",
        style("   LORE CONSISTENCY JUDGE   ")
            .bold()
            .on_blue()
            .white()
    );
    println!("{}", style("----------------------------").dim());

    let config = load_config(&args).await?;
    let oracle = build_oracle(&args)?;
    let logger = RunLogger::new(&args.log_dir).await?;
    println!(
        "{}",
        style(format!("Run log: {}", logger.log_file_path().display())).dim()
    );

    let catalog = discover_stories(&args.data_dir).await?;
    let observer = Arc::new(ConsoleObserver::new());
    observer.log_info(&format!(
        "Found {} stories in {}",
        catalog.stories.len(),
        args.data_dir.display()
    ));
    for skipped in &catalog.skipped {
        observer.log_error(&format!("Skipping story {}: {}", skipped.story_id, skipped.reason));
    }

    let mode = args.output_mode();
    let pipeline = StoryPipeline::new(oracle, config)
        .with_logger(logger)
        .with_observer(observer.clone());
    let outcome = pipeline.run_batch(&catalog, mode.name()).await;

    let rows: Vec<ResultRow> = outcome.verdicts.iter().map(ResultRow::from).collect();
    let sink = ResultSink::new(args.output.clone(), mode);
    write_results(&sink, &rows, args.append).await?;

    println!(
        "\n{}",
        style(format!(
            "Judged {} stories, results in {}",
            outcome.verdicts.len(),
            sink.path().display()
        ))
        .bold()
        .green()
    );
    if !outcome.failed.is_empty() {
        println!(
            "{}",
            style(format!("{} stories failed and were omitted:", outcome.failed.len())).yellow()
        );
        for failure in &outcome.failed {
            println!("  {} {}", style(&failure.story_id).yellow(), failure.error);
        }
    }

    Ok(())
}
