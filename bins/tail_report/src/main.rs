use std::path::PathBuf;

use clap::{Parser, ValueHint};
use tracing::info;

use tail_report::Lanes;

#[derive(Debug, Parser)]
#[command(
    name = "tail-report",
    about = "Tail-processing performance impact report (N % lanes != 0 vs exact multiples)"
)]
struct Cli {
    /// Path to the SIMD benchmark results CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/simd.csv")]
    simd_csv: PathBuf,

    /// f32 vector width (AVX2=8, AVX-512=16).
    #[arg(long, value_name = "LANES", default_value_t = 8)]
    f32_lanes: u64,

    /// f64 vector width (AVX2=4, AVX-512=8).
    #[arg(long, value_name = "LANES", default_value_t = 4)]
    f64_lanes: u64,

    /// Path for the delta summary CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/tail_delta_summary.csv")]
    summary_csv: PathBuf,

    /// Directory for the Markdown summary and delta charts.
    #[arg(long, value_name = "DIR", default_value = "plots/tail")]
    out_dir: PathBuf,

    /// Optional pretty-printed JSON dump of the final table.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    json: Option<PathBuf>,
}

fn main() -> shared::AppResult<()> {
    shared::init_tracing();

    let cli = Cli::parse();
    let lanes = Lanes {
        f32_lanes: cli.f32_lanes,
        f64_lanes: cli.f64_lanes,
    };

    let table = tail_report::load_and_flag(&cli.simd_csv, lanes)?;
    let summary = tail_report::build_delta_summary(&table)?;
    let rendered = tail_report::write_outputs(summary, &cli.summary_csv, &cli.out_dir)?;

    if let Some(path) = cli.json.as_ref() {
        render::write_json(path, &rendered)?;
        info!(path = ?path, "wrote JSON summary");
    }
    info!(out_dir = ?cli.out_dir, groups = rendered.rows.len(), "tail report complete");
    Ok(())
}
