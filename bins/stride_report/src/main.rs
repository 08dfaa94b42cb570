use std::path::PathBuf;

use clap::{Parser, ValueHint};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "stride-report",
    about = "Stride sweep summary with grouped bar charts for representative sizes"
)]
struct Cli {
    /// Path to the SIMD benchmark results CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/simd.csv")]
    simd_csv: PathBuf,

    /// Path for the absolute metric CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/stride_abs.csv")]
    abs_csv: PathBuf,

    /// Path for the stride=1-relative CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/stride_rel.csv")]
    rel_csv: PathBuf,

    /// Path for the representative-size plot set CSV.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, default_value = "data/stride_plotset.csv")]
    plotset_csv: PathBuf,

    /// Directory for rendered charts and the Markdown summary.
    #[arg(long, value_name = "DIR", default_value = "plots/stride")]
    out_dir: PathBuf,

    /// Also generate line charts for each (kernel, dtype, N).
    #[arg(long)]
    with_lines: bool,
}

fn main() -> shared::AppResult<()> {
    shared::init_tracing();

    let cli = Cli::parse();
    let table = stride_report::load_sweep(&cli.simd_csv)?;
    let with_rel = stride_report::add_relative(&table)?;

    render::write_table_csv(&cli.abs_csv, &table)?;
    render::write_table_csv(&cli.rel_csv, &with_rel)?;
    render::write_table_csv(&cli.plotset_csv, &stride_report::plotset(&table)?)?;

    render::write_text(
        &cli.out_dir.join("stride_summary.md"),
        &stride_report::render_markdown(&with_rel),
    )?;
    stride_report::write_grouped_bars(&table, &cli.out_dir)?;
    if cli.with_lines {
        stride_report::write_line_charts(&table, &cli.out_dir)?;
    }

    info!(out_dir = ?cli.out_dir, rows = table.len(), "stride report complete");
    Ok(())
}
