//! tolerance-interval: normal tolerance intervals from the command line.
//!
//! Usage:
//!   tolerance-interval --data lot7.csv
//!   tolerance-interval --data lot7.csv --sided upper --limit 10.5 --out-dir results
//!   tolerance-interval --mean 10 --sd 2 --n 25 --alpha 0.1 --p 0.9 --sided "One Sided - Upper Limit"
//!   tolerance-interval --data lot7.csv --lower-limit 9 --upper-limit 11 --json

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tolerance_engine::{
    IntervalParameters, PlotLabels, SampleSpecification, Sidedness, SpecificationLimits,
    ToleranceIntervalEngine, ToleranceRequest,
};

mod config;
mod export;
mod input;
mod render;

use config::CliConfig;
use render::RenderOptions;

#[derive(Parser, Debug)]
#[command(
    name = "tolerance-interval",
    version,
    about = "Normal tolerance intervals (NIST e-Handbook 7.2.6.3)"
)]
struct Cli {
    /// CSV or text file whose first column holds the sample
    #[arg(long, conflicts_with_all = ["mean", "sd", "n"])]
    data: Option<PathBuf>,

    /// Sample mean (with --sd and --n instead of --data)
    #[arg(long, allow_negative_numbers = true, requires_all = ["sd", "n"])]
    mean: Option<f64>,

    /// Sample standard deviation
    #[arg(long, requires = "mean")]
    sd: Option<f64>,

    /// Sample size
    #[arg(long, requires = "mean")]
    n: Option<usize>,

    /// Confidence complement (default TOLERANCE_ALPHA or 0.05)
    #[arg(long)]
    alpha: Option<f64>,

    /// Population proportion to cover (default TOLERANCE_PROPORTION or 0.95)
    #[arg(long)]
    p: Option<f64>,

    /// "Two Sided", "One Sided - Upper Limit" / "upper", "One Sided - Lower Limit" / "lower"
    #[arg(long, default_value = "Two Sided")]
    sided: String,

    /// Lower specification limit
    #[arg(long, allow_negative_numbers = true)]
    lower_limit: Option<f64>,

    /// Upper specification limit
    #[arg(long, allow_negative_numbers = true)]
    upper_limit: Option<f64>,

    /// Specification limit of a one-sided interval
    #[arg(long, allow_negative_numbers = true, conflicts_with_all = ["lower_limit", "upper_limit"])]
    limit: Option<f64>,

    /// X axis label (default: the column header)
    #[arg(long)]
    x_label: Option<String>,

    /// Chart title (default: the file name)
    #[arg(long)]
    title: Option<String>,

    /// Folder for the chart and summary files (default TOLERANCE_RESULT_DIR)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

/// A request plus the name its result files are saved under.
#[derive(Debug)]
struct Job {
    request: ToleranceRequest,
    stem: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "tolerance_cli=info,tolerance_engine=warn".into())
    };
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    let config = CliConfig::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    run(&cli, &config)
}

fn run(cli: &Cli, config: &CliConfig) -> Result<()> {
    let job = build_job(cli, config)?;
    let params = &job.request.parameters;
    tracing::info!(
        sided = %params.sidedness,
        alpha = params.alpha,
        p = params.p,
        "constructing tolerance interval"
    );

    let engine = ToleranceIntervalEngine::new();
    let result = engine
        .compute(&job.request)
        .context("tolerance interval could not be constructed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.summary_table);
        println!();
        println!("{}", result.statement);
    }

    if let Some(dir) = cli.out_dir.as_ref().or(config.result_dir.as_ref()) {
        let options = RenderOptions::from_config(config);
        export::write_outputs(dir, &job.stem, &result, &options)?;
    }

    Ok(())
}

fn build_job(cli: &Cli, config: &CliConfig) -> Result<Job> {
    let (sample, column, stem) = match (&cli.data, cli.mean, cli.sd, cli.n) {
        (Some(path), _, _, _) => {
            let loaded = input::load_sample(path)?;
            (SampleSpecification::raw(loaded.values), loaded.column, loaded.stem)
        }
        (None, Some(mean), Some(sd), Some(n)) => (
            SampleSpecification::summary(mean, sd, n),
            None,
            "summary".to_string(),
        ),
        _ => bail!("provide either --data <FILE> or --mean, --sd and --n"),
    };

    let sidedness: Sidedness = cli.sided.parse()?;
    let limits = match (sidedness, cli.limit) {
        (Sidedness::OneSidedUpper, Some(limit)) => SpecificationLimits::upper(limit),
        (Sidedness::OneSidedLower, Some(limit)) => SpecificationLimits::lower(limit),
        (Sidedness::TwoSided, Some(_)) => {
            bail!("--limit applies to one-sided intervals; use --lower-limit/--upper-limit")
        }
        (_, None) => SpecificationLimits {
            lower: cli.lower_limit,
            upper: cli.upper_limit,
        },
    };

    let parameters = IntervalParameters::new(
        cli.alpha.unwrap_or(config.alpha),
        cli.p.unwrap_or(config.proportion),
        sidedness,
    );

    let labels = PlotLabels::new(
        cli.x_label
            .clone()
            .or(column)
            .unwrap_or_else(|| "Value".to_string()),
        cli.title.clone().unwrap_or_else(|| stem.clone()),
    );

    Ok(Job {
        request: ToleranceRequest::new(sample, parameters)
            .with_limits(limits)
            .with_labels(labels),
        stem,
    })
}
