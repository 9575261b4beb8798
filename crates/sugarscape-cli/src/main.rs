use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::path::PathBuf;
use sugarscape_core::{ModelConfig, RunSummary, SugarField, SugarscapeModel};
use tracing_subscriber::EnvFilter;

/// Peak capacity of the built-in landscape used when no map is supplied.
const DEFAULT_PEAK_CAPACITY: u32 = 4;

/// Batch driver: run seeded Sugarscape replicates and print their run
/// summaries as a JSON array on stdout.
#[derive(Parser, Debug)]
#[command(name = "sugarscape", version)]
struct Args {
    /// Ticks to run per replicate.
    #[arg(long, default_value_t = 100)]
    steps: usize,

    /// Base seed; replicate `i` uses `seed + i`. Drawn at random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of independent replicates, run in parallel.
    #[arg(long, default_value_t = 1)]
    replicates: usize,

    /// JSON model configuration; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Whitespace-separated capacity matrix, one x-row per line.
    #[arg(long)]
    sugar_map: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

fn load_config(args: &Args) -> Result<ModelConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ModelConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate().context("invalid model configuration")?;
    Ok(config)
}

fn load_field(args: &Args, config: &ModelConfig) -> Result<SugarField> {
    match &args.sugar_map {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading sugar map {}", path.display()))?;
            SugarField::parse(&text).with_context(|| format!("parsing sugar map {}", path.display()))
        }
        None => SugarField::two_peaks(config.width, config.height, DEFAULT_PEAK_CAPACITY)
            .context("building default landscape"),
    }
}

fn run_replicate(config: ModelConfig, field: SugarField, steps: usize) -> Result<RunSummary> {
    let mut model = SugarscapeModel::try_new(config, field)?;
    let summary = model.try_run(steps)?;
    tracing::info!(
        seed = summary.seed,
        steps = summary.steps,
        final_population = summary.final_population,
        "Replicate finished"
    );
    Ok(summary)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.replicates > 0, "--replicates must be positive");
    let config = load_config(&args)?;
    let field = load_field(&args, &config)?;

    let summaries = (0..args.replicates)
        .into_par_iter()
        .map(|i| {
            let config = ModelConfig {
                seed: config.seed.map(|s| s.wrapping_add(i as u64)),
                ..config.clone()
            };
            run_replicate(config, field.clone(), args.steps)
                .with_context(|| format!("replicate {i}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let out = if args.pretty {
        serde_json::to_string_pretty(&summaries)?
    } else {
        serde_json::to_string(&summaries)?
    };
    println!("{out}");
    Ok(())
}
