//! Aligned-vs-misaligned report: pairs every aligned sample with its
//! misaligned counterpart on (kernel, dtype, stride, n), reduces the
//! per-pair relative changes with a geometric mean, and renders the
//! per-(kernel, dtype, stride) percentage deltas.

use std::path::Path;

use render::md::{self, Align};
use render::svg;
use shared::AppResult;
use stats::{aggregate, append_overall, Reducer, Summary};
use tabular::{inner_join, Predicate, Table};
use tracing::info;

const KEYS: [&str; 3] = ["kernel", "dtype", "stride"];
const DELTA_COLUMNS: [&str; 3] = [
    "geo_mean_delta_gflops_%",
    "geo_mean_delta_cpe_%",
    "geo_mean_delta_gibps_%",
];

/// Load a precomputed summary if one exists at `summary_csv`, otherwise
/// compute it from the raw SIMD samples. The returned summary carries no
/// overall row yet.
pub fn load_or_compute(simd_csv: &Path, summary_csv: &Path) -> AppResult<Summary> {
    if summary_csv.exists() {
        info!(path = ?summary_csv, "loading precomputed alignment summary");
        let table = Table::from_csv_path(summary_csv)?;
        let stat_columns: Vec<&str> = DELTA_COLUMNS.iter().chain(["samples"].iter()).copied().collect();
        return Summary::from_table(&table, &KEYS, &stat_columns);
    }
    compute_summary(simd_csv)
}

/// Compute the per-group geometric-mean deltas from `simd.csv`.
pub fn compute_summary(simd_csv: &Path) -> AppResult<Summary> {
    let raw = Table::from_csv_path(simd_csv)?;

    // Only verified samples count, when the harness recorded verification.
    let verified = raw.filter(&[Predicate::equals("verified", "1")], false)?;

    let kernel = verified.require(&["kernel"])?.to_string();
    let dtype = verified.require(&["dtype"])?.to_string();
    let stride = verified.require(&["stride"])?.to_string();
    let n = verified.require(&["n"])?.to_string();
    let gflops = verified.require(tabular::GFLOPS)?.to_string();
    let cpe = verified.require(tabular::CPE)?.to_string();
    let gibps = verified.require(tabular::GIBPS)?.to_string();

    // The misalign dimension is the comparison arm; it must exist.
    let aligned = verified.filter(&[Predicate::equals("misalign", "0")], true)?;
    let misaligned = verified.filter(&[Predicate::equals("misalign", "1")], true)?;

    let mapping = [
        (kernel.as_str(), "kernel"),
        (dtype.as_str(), "dtype"),
        (stride.as_str(), "stride"),
        (n.as_str(), "n"),
        (gflops.as_str(), "gflops"),
        (cpe.as_str(), "cpe"),
        (gibps.as_str(), "gibps"),
    ];
    let aligned = aligned.select_as(&mapping)?;
    let misaligned = misaligned.select_as(&mapping)?;

    let mut merged = inner_join(&aligned, &misaligned, &["kernel", "dtype", "stride", "n"], "_al", "_mi")?;
    info!(pairs = merged.len(), "paired aligned/misaligned samples");

    for metric in ["gflops", "cpe", "gibps"] {
        let al_col = format!("{metric}_al");
        let mi_col = format!("{metric}_mi");
        let deltas: Vec<Option<f64>> = (0..merged.len())
            .map(|row| match (merged.number(row, &al_col), merged.number(row, &mi_col)) {
                (Some(al), Some(mi)) if al != 0.0 => Some(mi / al - 1.0),
                _ => None,
            })
            .collect();
        merged.add_column(format!("delta_{metric}"), deltas)?;
    }

    let mut summary = aggregate(
        &merged,
        &KEYS,
        &[
            Reducer::geo_mean_delta(DELTA_COLUMNS[0], "delta_gflops"),
            Reducer::geo_mean_delta(DELTA_COLUMNS[1], "delta_cpe"),
            Reducer::geo_mean_delta(DELTA_COLUMNS[2], "delta_gibps"),
            Reducer::count("samples", "delta_gflops"),
        ],
    )?;
    for column in DELTA_COLUMNS {
        summary.scale_stat(column, 100.0);
    }
    Ok(summary)
}

/// Append the overall row and render Markdown + charts into `out_dir`.
pub fn write_outputs(mut summary: Summary, out_dir: &Path) -> AppResult<Summary> {
    append_overall(&mut summary, &["ALL", "-", "0"], &["samples"])?;

    let mut rows = Vec::new();
    for row in &summary.rows {
        rows.push(vec![
            summary.key_of(row, "kernel").to_string(),
            summary.key_of(row, "dtype").to_string(),
            summary.key_of(row, "stride").to_string(),
            md::signed(summary.stat_of(row, DELTA_COLUMNS[0]), 2),
            md::signed(summary.stat_of(row, DELTA_COLUMNS[1]), 2),
            md::signed(summary.stat_of(row, DELTA_COLUMNS[2]), 2),
            md::count(summary.stat_of(row, "samples")),
        ]);
    }
    let mut doc = String::new();
    doc.push_str("### Aligned vs Misaligned Overall Performance Change Summary\n");
    doc.push_str(&md::table(
        &["kernel", "dtype", "stride", "ΔGFLOP/s (%)", "ΔCPE (%)", "ΔGiB/s (%)", "samples"],
        &[
            Align::Left,
            Align::Left,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
        ],
        &rows,
    ));
    render::write_text(&out_dir.join("aln_vs_mis_summary.md"), &doc)?;

    let labels: Vec<String> = summary
        .rows
        .iter()
        .map(|row| {
            format!(
                "{}-{}-s{}",
                summary.key_of(row, "kernel"),
                summary.key_of(row, "dtype"),
                summary.key_of(row, "stride")
            )
        })
        .collect();
    for (column, y_label, file) in [
        (DELTA_COLUMNS[0], "ΔGFLOP/s (%)", "aln_vs_mis_delta_gflops.svg"),
        (DELTA_COLUMNS[1], "ΔCPE (%)", "aln_vs_mis_delta_cpe.svg"),
        (DELTA_COLUMNS[2], "ΔGiB/s (%)", "aln_vs_mis_delta_gibps.svg"),
    ] {
        let values: Vec<Option<f64>> = summary.rows.iter().map(|r| summary.stat_of(r, column)).collect();
        let chart = svg::bar_chart(
            "Aligned vs Misaligned: Geometric-Mean Delta (%)",
            y_label,
            &labels,
            &values,
        );
        render::write_text(&out_dir.join(file), &chart)?;
    }

    Ok(summary)
}
