//! diffnuisances CLI

use anyhow::Result;
use clap::Parser;
use nd_compare::{CompareConfig, SortKey, TableBuilder, ToleranceConfig, sort_evaluated, sort_rows};
use nd_pulls::PullRegistry;
use nd_report::Dialect;
use nd_translate::{FitFile, JsonWorkspace};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "diffnuisances")]
#[command(about = "Compare nuisance parameters between prefit, background-only and signal-plus-background fits")]
#[command(version)]
struct Cli {
    /// Fit file (JSON with `fit_s`, `fit_b` and `nuisances_prefit`)
    input: PathBuf,

    /// Report nuisances whose value changes by more than this amount of sigmas
    #[arg(long = "vtol", visible_alias = "val-tolerance", default_value = "0.30")]
    vtol: f64,

    /// Report nuisances whose sigma changes by more than this amount
    #[arg(long = "stol", visible_alias = "sig-tolerance", default_value = "0.10")]
    stol: f64,

    /// Severe threshold on the value change, in sigmas
    #[arg(long = "vtol2", default_value = "2.0")]
    vtol2: f64,

    /// Severe threshold on the sigma change
    #[arg(long = "stol2", default_value = "0.50")]
    stol2: f64,

    /// Print all nuisances, even the ones which are unchanged w.r.t. prefit
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Report also absolute values of nuisance values and errors, not only the ones normalized to the input sigma
    #[arg(short = 'A', long = "abs")]
    abs: bool,

    /// Parameter of interest
    #[arg(short, long, default_value = "r")]
    poi: String,

    /// Output format: text, latex, twiki, html
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Write plot data (JSON) to this file
    #[arg(short = 'g', long)]
    histogram: Option<PathBuf>,

    /// Report pulls with this definition (relDiffAsymErrs, unconstPullAsym, diffPullAsym)
    #[arg(long = "pull-def")]
    pull_def: Option<String>,

    /// Use the b-only fit in place of the s+b fit
    #[arg(long)]
    skip_fit_s: bool,

    /// Use the s+b fit in place of the b-only fit
    #[arg(long)]
    skip_fit_b: bool,

    /// Row ordering: correlation, impact, dnll
    #[arg(long, default_value = "correlation")]
    sort_by: String,

    /// Only include nuisances whose full name matches this regular expression
    #[arg(long, default_value = ".*")]
    regex: String,

    /// Likelihood workspace (JSON) used to compute constraint dnll
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Maximum number of nuisances per plot page
    #[arg(long, default_value = "65")]
    max_nuis: usize,

    /// Output file for the report. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log_level)
        .with_target(false)
        .init();

    cmd_diff(cli)
}

fn cmd_diff(cli: Cli) -> Result<()> {
    let dialect: Dialect = cli.format.parse()?;
    let sort_by: SortKey = cli.sort_by.parse()?;
    let tolerances =
        ToleranceConfig { value: cli.vtol, sigma: cli.stol, value_severe: cli.vtol2, sigma_severe: cli.stol2 };
    if [tolerances.value, tolerances.sigma, tolerances.value_severe, tolerances.sigma_severe]
        .iter()
        .any(|t| !(t.is_finite() && *t >= 0.0))
    {
        anyhow::bail!("tolerances must be finite and non-negative");
    }

    let config = CompareConfig {
        tolerances,
        show_all: cli.all,
        absolute_values: cli.abs,
        poi: cli.poi,
        pull_definition: cli.pull_def,
        name_filter: cli.regex,
        sort_by,
        max_nuis: cli.max_nuis,
        skip_fit_s: cli.skip_fit_s,
        skip_fit_b: cli.skip_fit_b,
    };
    let registry = PullRegistry::standard();
    let plan = config.resolve(&registry, cli.workspace.is_some())?;
    let cfg = plan.config();

    let snapshots = FitFile::open(&cli.input)?.snapshots(cfg.skip_fit_s, cfg.skip_fit_b)?;
    let mut workspace = cli.workspace.as_deref().map(JsonWorkspace::open).transpose()?;

    let mut builder = TableBuilder::new(&plan, &snapshots);
    if let Some(ws) = workspace.as_mut() {
        builder = builder.with_workspace(ws);
    }
    let table = builder.build()?;
    let rows = sort_rows(&table, cfg.sort_by);
    tracing::info!(rows = rows.len(), sort_by = %cfg.sort_by, dialect = %dialect, "rendering report");

    let input = cli.input.display().to_string();
    let mut report = nd_report::run_header(&input, nd_report::now_unix_ms()?, cfg)?;
    report.push_str("\n\n");
    report.push_str(&nd_report::render_table(&rows, cfg, table.has_dnll(), dialect));

    if let Some(path) = cli.histogram.as_deref() {
        let plotted = sort_evaluated(&table, cfg.sort_by);
        let artifact =
            nd_report::nuisance_artifact(&plotted, plan.pull().is_some(), cfg.max_nuis, table.has_dnll())?;
        write_json(path, serde_json::to_value(&artifact)?)?;
    }
    write_text(cli.output.as_ref(), &report)
}

fn write_json(path: &Path, value: serde_json::Value) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    tracing::info!(path = %path.display(), "plot data written");
    Ok(())
}

fn write_text(output: Option<&PathBuf>, text: &str) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, text)?;
        tracing::info!(path = %path.display(), "report written");
    } else {
        print!("{text}");
    }
    Ok(())
}
