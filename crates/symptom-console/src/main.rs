mod render;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use symptom_engine::aggregate::MergePolicy;
use symptom_engine::overrides::OverrideTable;
use symptom_engine::rules::{DEFAULT_TOP_N, ScoringRules};
use symptom_engine::scorer::ScoringStrategy;
use symptom_engine::{DataPaths, EngineContext, SymptomSet};

/// Rank likely conditions for a comma-separated symptom list.
#[derive(Debug, Parser)]
#[command(name = "symptom-console", version)]
struct Args {
    /// Directory holding Training.csv and the reference tables.
    #[arg(long = "data-dir", env = "SYMPTOM_DATA_DIR", value_name = "DIR")]
    data_dir: PathBuf,

    /// "boosted" or "strict".
    #[arg(long, default_value = "boosted")]
    strategy: ScoringStrategy,

    /// JSON override rules replacing the built-in table.
    #[arg(long, env = "SYMPTOM_OVERRIDES_PATH", value_name = "FILE")]
    overrides: Option<PathBuf>,

    #[arg(long = "top-n", env = "SYMPTOM_TOP_N", default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Symptoms, e.g. `itching, skin_rash`. Prompted for when omitted.
    symptoms: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    if args.top_n == 0 {
        bail!("--top-n must be a positive integer");
    }

    let mut rules = ScoringRules::default().with_top_n(args.top_n);
    if let Some(path) = &args.overrides {
        rules = rules.with_overrides(OverrideTable::load(path)?);
    }

    let paths = DataPaths::in_dir(&args.data_dir);
    let engine = EngineContext::load(&paths, rules)
        .with_context(|| format!("loading data from {}", args.data_dir.display()))?;

    let line = if args.symptoms.is_empty() {
        prompt("Enter your symptoms (comma-separated).......")?
    } else {
        args.symptoms.join(",")
    };
    let query = SymptomSet::parse(&line);
    if query.is_empty() {
        bail!("no symptoms provided");
    }
    debug!(symptoms = query.len(), strategy = %args.strategy, "ranking");

    let prediction = engine.predict(&query, args.strategy, MergePolicy::Ordered);
    print!(
        "{}",
        render::render_report(&prediction.candidates, &prediction.recommendations)
    );
    Ok(())
}

fn prompt(message: &str) -> anyhow::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{message}")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
