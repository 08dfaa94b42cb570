use std::path::PathBuf;

use clap::{Parser, ValueHint};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "align-report",
    about = "Aligned vs misaligned geometric-mean delta report"
)]
struct Cli {
    /// Path to the SIMD benchmark results CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/simd.csv")]
    simd_csv: PathBuf,

    /// Precomputed summary CSV; loaded instead of the raw samples when it
    /// exists, written after computing otherwise.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/aln_vs_mis_summary.csv")]
    summary_csv: PathBuf,

    /// Directory for the Markdown summary and delta charts.
    #[arg(long, value_name = "DIR", default_value = "plots/align")]
    out_dir: PathBuf,

    /// Optional pretty-printed JSON dump of the final table.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    json: Option<PathBuf>,
}

fn main() -> shared::AppResult<()> {
    shared::init_tracing();

    let cli = Cli::parse();
    let computed = !cli.summary_csv.exists();
    let summary = align_report::load_or_compute(&cli.simd_csv, &cli.summary_csv)?;
    if computed {
        render::write_summary_csv(&cli.summary_csv, &summary)?;
        info!(path = ?cli.summary_csv, "wrote alignment summary CSV");
    }

    let rendered = align_report::write_outputs(summary, &cli.out_dir)?;
    if let Some(path) = cli.json.as_ref() {
        render::write_json(path, &rendered)?;
        info!(path = ?path, "wrote JSON summary");
    }
    info!(out_dir = ?cli.out_dir, groups = rendered.rows.len(), "alignment report complete");
    Ok(())
}
