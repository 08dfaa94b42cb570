use std::path::PathBuf;

use clap::{Parser, ValueHint};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "loaded-latency-report",
    about = "Throughput-bucketed loaded-latency curve with knee detection"
)]
struct Cli {
    /// Raw loaded-latency CSV (rep, bandwidth_gbs, latency_ns).
    #[arg(value_name = "CSV", value_hint = ValueHint::FilePath)]
    raw_csv: PathBuf,

    /// Directory for the latency curve chart.
    #[arg(long, value_name = "DIR", default_value = "figs/loaded")]
    fig_dir: PathBuf,

    /// Path for the Markdown section.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "out/loaded_latency.md")]
    out_md: PathBuf,

    /// Optional pretty-printed JSON dump of the bucket table.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    json: Option<PathBuf>,
}

fn main() -> shared::AppResult<()> {
    shared::init_tracing();

    let cli = Cli::parse();
    let table = loaded_latency_report::load_and_bucket(&cli.raw_csv)?;
    let summary = loaded_latency_report::build_summary(&table)?;
    loaded_latency_report::write_outputs(&table, &summary, &cli.fig_dir, &cli.out_md)?;

    if let Some(path) = cli.json.as_ref() {
        render::write_json(path, &summary)?;
        info!(path = ?path, "wrote JSON summary");
    }
    info!(out_md = ?cli.out_md, buckets = summary.rows.len(), "loaded-latency report complete");
    Ok(())
}
