use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use futures::future::join_all;
use serde::Serialize;

use docroute::application::services::{PipelineRun, Submission, WorkerHandle};
use docroute::domain::{ConversionResult, DocumentSource, Tier};
use docroute::infrastructure::observability::{TracingConfig, init_tracing};
use docroute::presentation::{AppState, Settings};

#[derive(Debug, Parser)]
#[command(name = "docroute", version, about = "Convert documents through the cheapest adequate tier")]
struct Cli {
    /// Files to convert.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Declared MIME type; inferred from the extension when omitted.
    #[arg(long)]
    mime: Option<String>,

    /// Most expensive tier allowed (fast, layout_aware, generative_assisted).
    #[arg(long, env = "DOCROUTE_MAX_TIER")]
    max_tier: Option<Tier>,

    /// Quality of an earlier conversion of the same document(s).
    #[arg(long)]
    prior_quality: Option<f32>,

    /// Print router and cache counters to stderr when done.
    #[arg(long)]
    stats: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    filename: &'a str,
    result: &'a ConversionResult,
    states: Vec<&'static str>,
    rationale: &'a str,
    overall_complexity: f32,
    complexity_confidence: f32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load settings")?;

    init_tracing(&TracingConfig::new(
        settings.environment.as_str(),
        settings.logging.json,
        settings.logging.filter.clone(),
    ));

    let state = AppState::from_settings(settings).context("Failed to build pipeline")?;
    let (workers, worker_task) = state.spawn_workers();

    let jobs = cli
        .files
        .iter()
        .map(|path| convert_file(&state, &workers, &cli, path));
    let outcomes = join_all(jobs).await;

    let mut failures = 0usize;
    for (path, outcome) in cli.files.iter().zip(outcomes) {
        match outcome {
            Ok(run) => print_run(&cli, path, &run)?,
            Err(e) => {
                failures += 1;
                tracing::error!(file = %path.display(), error = %format!("{e:#}"), "Conversion failed");
                eprintln!("{}: {e:#}", path.display());
            }
        }
    }

    if cli.stats {
        let router = state.orchestrator.router().stats();
        eprintln!(
            "routing: fast={} layout_aware={} generative_assisted={} cache_skips={} degraded={} escalations={}",
            router.fast,
            router.layout_aware,
            router.generative_assisted,
            router.cache_skips,
            router.degraded,
            router.escalations
        );
        if let Some(cache) = state.orchestrator.cache() {
            let stats = cache.stats();
            eprintln!(
                "cache: entries={} hits={} misses={} hit_rate={:.2}",
                stats.entries,
                stats.hits,
                stats.misses,
                stats.hit_rate()
            );
        }
    }

    drop(workers);
    drop(state);
    worker_task.await.context("Worker task panicked")?;

    if failures > 0 {
        anyhow::bail!("{failures} of {} documents failed", cli.files.len());
    }
    Ok(())
}

async fn convert_file(
    state: &AppState,
    workers: &WorkerHandle,
    cli: &Cli,
    path: &Path,
) -> anyhow::Result<PipelineRun> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let source = DocumentSource::new(filename, cli.mime.clone().unwrap_or_default());

    let document = state.parser.parse(&data, &source).await?;
    let mut submission = Submission::new(document);
    submission.classification = source.kind();
    submission.prior_quality = cli.prior_quality;
    submission.tier_ceiling = cli.max_tier;

    Ok(workers.submit(submission).await?)
}

fn print_run(cli: &Cli, path: &Path, run: &PipelineRun) -> anyhow::Result<()> {
    match cli.format {
        OutputFormat::Text => {
            println!(
                "==> {} [{} quality={:.2}{}]",
                path.display(),
                run.result.tier_used,
                run.result.quality_score,
                if run.result.cached { " cached" } else { "" }
            );
            for warning in &run.result.warnings {
                println!("warning: {warning}");
            }
            println!("{}\n", run.result.text);
        }
        OutputFormat::Json => {
            let filename = path.display().to_string();
            let report = Report {
                filename: &filename,
                result: &run.result,
                states: run.trail.states().iter().map(|s| s.as_str()).collect(),
                rationale: &run.decision.rationale,
                overall_complexity: run.complexity.overall(),
                complexity_confidence: run.complexity.confidence(),
            };
            println!("{}", serde_json::to_string(&report)?);
        }
    }
    Ok(())
}
