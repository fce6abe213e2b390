use adwatch_core::config::{ScanConfig, Settings};
use adwatch_core::domain::record::Metric;
use adwatch_core::report::AnomalyFilter;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;

#[derive(Debug, Parser)]
#[command(name = "adwatch_worker")]
struct Args {
    /// Unified ad performance CSV (one row per campaign per day).
    #[arg(long)]
    input: PathBuf,

    /// Where the annotated CSV and the JSON run report are written.
    /// Defaults to ADWATCH_OUTPUT_DIR, then `data`.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    window_size: Option<usize>,

    #[arg(long)]
    min_window: Option<usize>,

    /// Robust z-score magnitude a value must exceed to be flagged.
    #[arg(long)]
    threshold: Option<f64>,

    /// Only list anomalies (and platform insights) for this platform.
    #[arg(long)]
    platform: Option<String>,

    /// Only list anomalies on this metric (spend, roas or ctr).
    #[arg(long)]
    metric: Option<Metric>,

    /// Compute and log everything, write nothing.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(&args, &settings) {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(input = %args.input.display(), error = %err, "anomaly run failed");
        return Err(err);
    }

    Ok(())
}

fn run(args: &Args, settings: &Settings) -> anyhow::Result<()> {
    let config = resolve_scan_config(args, ScanConfig::from_env());
    config.validate()?;

    let filter = AnomalyFilter {
        platform: args.platform.clone(),
        metric: args.metric,
    };

    let records = adwatch_core::ingest::read_records_from_path(&args.input)?;
    if records.is_empty() {
        tracing::warn!(input = %args.input.display(), "no records in input; nothing to analyze");
    }

    let analysis =
        adwatch_core::pipeline::analyze(&records, &config, &filter, chrono::Utc::now());
    output::log_report(&analysis.report);

    if args.dry_run {
        tracing::info!(
            run_id = %analysis.report.run_id,
            dry_run = true,
            "skipping output files"
        );
        return Ok(());
    }

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(settings.output_dir()));
    let written = output::write_outputs(&output_dir, &analysis)?;

    tracing::info!(
        run_id = %analysis.report.run_id,
        annotated = %written.annotated_csv.display(),
        report = %written.report_json.display(),
        "wrote anomaly outputs"
    );
    Ok(())
}

/// CLI flags win over environment overrides, which win over defaults.
fn resolve_scan_config(args: &Args, base: ScanConfig) -> ScanConfig {
    ScanConfig {
        window_size: args.window_size.unwrap_or(base.window_size),
        min_window: args.min_window.unwrap_or(base.min_window),
        threshold: args.threshold.unwrap_or(base.threshold),
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
