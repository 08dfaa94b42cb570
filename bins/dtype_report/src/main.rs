use std::path::PathBuf;

use clap::{Parser, ValueHint};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "dtype-report",
    about = "Scalar vs SIMD dtype comparison report (speedup geomeans by region)"
)]
struct Cli {
    /// Path to the scalar benchmark results CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/scalar.csv")]
    scalar_csv: PathBuf,

    /// Path to the SIMD benchmark results CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/simd.csv")]
    simd_csv: PathBuf,

    /// Path for the combined summary CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/dtype_summary.csv")]
    summary_csv: PathBuf,

    /// Directory for rendered charts and the Markdown report.
    #[arg(long, value_name = "DIR", default_value = "plots/dtype")]
    out_dir: PathBuf,

    /// Optional pretty-printed JSON dump of the summary.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    json: Option<PathBuf>,
}

fn main() -> shared::AppResult<()> {
    shared::init_tracing();

    let cli = Cli::parse();
    let merged = dtype_report::join_and_derive(&cli.scalar_csv, &cli.simd_csv)?;
    let summary = dtype_report::build_summary(&merged)?;
    let stride1 = dtype_report::build_stride1_summary(&merged)?;

    let combined = dtype_report::combined_csv(&summary, &stride1)?;
    render::write_summary_csv(&cli.summary_csv, &combined)?;
    info!(path = ?cli.summary_csv, "wrote dtype summary CSV");

    dtype_report::write_outputs(&summary, &stride1, &cli.out_dir)?;
    if let Some(path) = cli.json.as_ref() {
        render::write_json(path, &combined)?;
        info!(path = ?path, "wrote JSON summary");
    }
    info!(out_dir = ?cli.out_dir, groups = summary.rows.len(), "dtype report complete");
    Ok(())
}
