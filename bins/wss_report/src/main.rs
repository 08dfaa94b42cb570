use std::path::PathBuf;

use clap::{Parser, ValueHint};
use tracing::info;

use wss_report::CacheSizes;

#[derive(Debug, Parser)]
#[command(
    name = "wss-report",
    about = "Working-set size sweep report with cache-capacity markers"
)]
struct Cli {
    /// Raw working-set sweep CSV (bytes, rep, ns_per_access).
    #[arg(value_name = "CSV", value_hint = ValueHint::FilePath)]
    raw_csv: PathBuf,

    /// Path for the latency curve chart.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "figs/wss_curve.svg")]
    fig_path: PathBuf,

    /// Path for the Markdown section.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "out/wss.md")]
    out_md: PathBuf,

    /// L1d capacity marker in KiB.
    #[arg(long, value_name = "KIB", default_value_t = 32.0)]
    l1d_kib: f64,

    /// L2 capacity marker in KiB.
    #[arg(long, value_name = "KIB", default_value_t = 1024.0)]
    l2_kib: f64,

    /// L3 capacity marker in KiB.
    #[arg(long, value_name = "KIB", default_value_t = 16384.0)]
    l3_kib: f64,
}

fn main() -> shared::AppResult<()> {
    shared::init_tracing();

    let cli = Cli::parse();
    let summary = wss_report::build_summary(&cli.raw_csv)?;
    let caches = CacheSizes {
        l1d_kib: cli.l1d_kib,
        l2_kib: cli.l2_kib,
        l3_kib: cli.l3_kib,
    };
    wss_report::write_outputs(&summary, caches, &cli.fig_path, &cli.out_md)?;

    info!(out_md = ?cli.out_md, sizes = summary.rows.len(), "working-set report complete");
    Ok(())
}
