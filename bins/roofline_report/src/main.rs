use std::path::PathBuf;

use clap::{Parser, ValueHint};
use tracing::info;

use roofline_report::RooflineParams;

#[derive(Debug, Parser)]
#[command(
    name = "roofline-report",
    about = "Roofline analysis report: AI vs measured GFLOP/s with bottleneck classification"
)]
struct Cli {
    /// Path to the SIMD benchmark results CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/simd.csv")]
    simd_csv: PathBuf,

    /// Measured or estimated memory bandwidth in GiB/s (default: estimated
    /// from the 95th percentile of the measured bandwidth column).
    #[arg(long, value_name = "GIBPS")]
    bmem: Option<f64>,

    /// Single-thread peak GFLOP/s (default: cache-resident 98th percentile
    /// with 15% headroom).
    #[arg(long, value_name = "GFLOPS")]
    peak_gflops: Option<f64>,

    /// FLOPs per element for the stencil kernel.
    #[arg(long, value_name = "FLOPS", default_value_t = 3.0)]
    stencil_flops: f64,

    /// Filter condition, e.g. "stride=1;misalign=0".
    #[arg(long, value_name = "EXPR", default_value = "stride=1")]
    pick: String,

    /// Tag regions (L1/L2/LLC/DRAM) by N instead of a single ALL region.
    #[arg(long)]
    regionize: bool,

    /// Directory for the roofline charts.
    #[arg(long, value_name = "DIR", default_value = "plots/roofline")]
    out_dir: PathBuf,

    /// Path for the Markdown report.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "reports/roofline.md")]
    report_md: PathBuf,
}

fn main() -> shared::AppResult<()> {
    shared::init_tracing();

    let cli = Cli::parse();
    let params = RooflineParams {
        b_mem: cli.bmem,
        peak_gflops: cli.peak_gflops,
        stencil_flops: cli.stencil_flops,
        pick: cli.pick.clone(),
        regionize: cli.regionize,
    };

    let table = roofline_report::prepare(&cli.simd_csv, &params)?;
    let b_mem = roofline_report::estimate_bandwidth(&table, params.b_mem);
    let p_peak = roofline_report::estimate_peak(&table, params.peak_gflops);
    info!(b_mem = format!("{b_mem:.2}"), p_peak = format!("{p_peak:.2}"), "roofline parameters");

    let summary = roofline_report::build_points(&table)?;
    roofline_report::write_outputs(&summary, &params, b_mem, p_peak, &cli.out_dir, &cli.report_md)?;

    info!(report = ?cli.report_md, groups = summary.rows.len(), "roofline report complete");
    Ok(())
}
