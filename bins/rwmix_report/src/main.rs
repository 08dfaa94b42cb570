use std::path::PathBuf;

use clap::{Parser, ValueHint};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "rwmix-report",
    about = "Read/write mix bandwidth report (grouped bars with error bars)"
)]
struct Cli {
    /// Raw read/write-mix CSV (mode, read_pct, stride_B, bw_gbs).
    #[arg(value_name = "CSV", value_hint = ValueHint::FilePath)]
    raw_csv: PathBuf,

    /// Path for the aggregated summary CSV (defaults to
    /// `rwmix_summary.csv` next to the input).
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    summary_csv: Option<PathBuf>,

    /// Path for the grouped bar chart.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "figs/bw_rwmix.svg")]
    fig_path: PathBuf,

    /// Path for the Markdown section.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "out/rwmix.md")]
    out_md: PathBuf,
}

fn main() -> shared::AppResult<()> {
    shared::init_tracing();

    let cli = Cli::parse();
    let summary = rwmix_report::build_summary(&cli.raw_csv)?;

    let summary_csv = cli.summary_csv.clone().unwrap_or_else(|| {
        cli.raw_csv
            .parent()
            .map(|p| p.join("rwmix_summary.csv"))
            .unwrap_or_else(|| PathBuf::from("rwmix_summary.csv"))
    });
    render::write_summary_csv(&summary_csv, &summary)?;
    info!(path = ?summary_csv, "wrote rwmix summary CSV");

    rwmix_report::write_outputs(&summary, &cli.fig_path, &cli.out_md)?;
    info!(out_md = ?cli.out_md, groups = summary.rows.len(), "read/write-mix report complete");
    Ok(())
}
