//! Tail-processing impact report: splits verified, aligned samples by
//! whether `n` is an exact multiple of the vector width, then compares the
//! two arms' geometric means per (kernel, dtype, stride).
//!
//! The exact and tail arms hold disjoint problem sizes by construction, so
//! samples cannot be paired one-to-one; the delta is the ratio of the two
//! independently computed geometric means.

use std::path::Path;

use render::md::{self, Align};
use render::svg;
use shared::AppResult;
use stats::{aggregate, aggregate_delta, append_overall, Reducer, Summary, SummaryRow};
use tabular::{Predicate, Table};
use tracing::info;

const KEYS: [&str; 3] = ["kernel", "dtype", "stride"];
const GEO_COLUMNS: [&str; 3] = ["geo_gflops", "geo_cpe", "geo_gibps"];
const DELTA_COLUMNS: [&str; 3] = ["delta_gflops_%", "delta_cpe_%", "delta_gibps_%"];

#[derive(Debug, Clone, Copy)]
pub struct Lanes {
    pub f32_lanes: u64,
    pub f64_lanes: u64,
}

impl Lanes {
    pub fn for_dtype(&self, dtype: &str) -> u64 {
        if dtype.eq_ignore_ascii_case("f32") {
            self.f32_lanes
        } else {
            self.f64_lanes
        }
    }
}

/// Load the SIMD samples, keep verified aligned rows, and mark each with a
/// tail flag.
pub fn load_and_flag(simd_csv: &Path, lanes: Lanes) -> AppResult<Table> {
    let raw = Table::from_csv_path(simd_csv)?;
    let filtered = raw.filter(
        &[
            Predicate::equals("verified", "1"),
            Predicate::equals("misalign", "0"),
        ],
        false,
    )?;

    let kernel = filtered.require(&["kernel"])?.to_string();
    let dtype = filtered.require(&["dtype"])?.to_string();
    let stride = filtered.require(&["stride"])?.to_string();
    let n = filtered.require(&["n"])?.to_string();
    let gflops = filtered.require(tabular::GFLOPS)?.to_string();
    let cpe = filtered.require(tabular::CPE)?.to_string();
    let gibps = filtered.require(tabular::GIBPS)?.to_string();

    let mut table = filtered.select_as(&[
        (kernel.as_str(), "kernel"),
        (dtype.as_str(), "dtype"),
        (stride.as_str(), "stride"),
        (n.as_str(), "n"),
        (gflops.as_str(), "gflops"),
        (cpe.as_str(), "cpe"),
        (gibps.as_str(), "gibps"),
    ])?;

    let flags: Vec<Option<f64>> = (0..table.len())
        .map(|row| {
            let n = table.number(row, "n")?;
            let lanes = lanes.for_dtype(table.text(row, "dtype")).max(1);
            Some(if (n as u64) % lanes != 0 { 1.0 } else { 0.0 })
        })
        .collect();
    table.add_column("tail_flag", flags)?;
    Ok(table)
}

fn geo_reducers() -> Vec<Reducer> {
    vec![
        Reducer::count("samples", "gflops"),
        Reducer::geo_mean(GEO_COLUMNS[0], "gflops"),
        Reducer::geo_mean(GEO_COLUMNS[1], "cpe"),
        Reducer::geo_mean(GEO_COLUMNS[2], "gibps"),
    ]
}

/// Compare the tail arm against the exact-multiple arm per group key.
pub fn build_delta_summary(table: &Table) -> AppResult<Summary> {
    let exact = table.filter(&[Predicate::equals("tail_flag", "0")], false)?;
    let tail = table.filter(&[Predicate::equals("tail_flag", "1")], false)?;

    let exact_geo = aggregate(&exact, &KEYS, &geo_reducers())?;
    let tail_geo = aggregate(&tail, &KEYS, &geo_reducers())?;
    info!(
        exact_groups = exact_geo.rows.len(),
        tail_groups = tail_geo.rows.len(),
        "aggregated tail arms"
    );

    let pairs = aggregate_delta(&exact_geo, &tail_geo, &GEO_COLUMNS, Some("samples"))?;

    let mut summary = Summary::new(
        KEYS.iter().map(|k| (*k).to_string()).collect(),
        DELTA_COLUMNS
            .iter()
            .map(|c| (*c).to_string())
            .chain(["samples_exact".to_string(), "samples_tail".to_string()])
            .collect(),
    );
    for pair in pairs {
        let mut stats: Vec<Option<f64>> = pair.deltas.clone();
        stats.push(pair.baseline_samples);
        stats.push(pair.treatment_samples);
        summary.rows.push(SummaryRow { key: pair.key, stats });
    }
    Ok(summary)
}

/// Append the overall row and write CSV + Markdown + charts.
pub fn write_outputs(mut summary: Summary, summary_csv: &Path, out_dir: &Path) -> AppResult<Summary> {
    append_overall(&mut summary, &["ALL", "-", "0"], &["samples_exact", "samples_tail"])?;
    render::write_summary_csv(summary_csv, &summary)?;

    let mut rows = Vec::new();
    for row in &summary.rows {
        rows.push(vec![
            summary.key_of(row, "kernel").to_string(),
            summary.key_of(row, "dtype").to_string(),
            summary.key_of(row, "stride").to_string(),
            md::signed(summary.stat_of(row, DELTA_COLUMNS[0]), 2),
            md::signed(summary.stat_of(row, DELTA_COLUMNS[1]), 2),
            md::signed(summary.stat_of(row, DELTA_COLUMNS[2]), 2),
            format!(
                "{}/{}",
                md::count(summary.stat_of(row, "samples_exact")),
                md::count(summary.stat_of(row, "samples_tail"))
            ),
        ]);
    }
    let mut doc = String::new();
    doc.push_str("### Tail Processing (Tail) Performance Change Summary\n");
    doc.push_str(&md::table(
        &[
            "kernel",
            "dtype",
            "stride",
            "ΔGFLOP/s (%)",
            "ΔCPE (%)",
            "ΔGiB/s (%)",
            "samples(exact/tail)",
        ],
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
    render::write_text(&out_dir.join("tail_delta_summary.md"), &doc)?;

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
        (DELTA_COLUMNS[0], "ΔGFLOP/s (%)", "tail_delta_gflops.svg"),
        (DELTA_COLUMNS[1], "ΔCPE (%)", "tail_delta_cpe.svg"),
        (DELTA_COLUMNS[2], "ΔGiB/s (%)", "tail_delta_gibps.svg"),
    ] {
        let values: Vec<Option<f64>> = summary.rows.iter().map(|r| summary.stat_of(r, column)).collect();
        let chart = svg::bar_chart("Tail (N%lanes!=0) vs Exact Multiples", y_label, &labels, &values);
        render::write_text(&out_dir.join(file), &chart)?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const LANES: Lanes = Lanes {
        f32_lanes: 8,
        f64_lanes: 4,
    };

    fn write_simd_csv(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("simd.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "kernel,dtype,n,stride,misalign,gflops,cpe,GiBps,verified").unwrap();
        // Exact multiples of 8 lanes at 20 GFLOP/s, tails at 19.
        for n in [1024, 2048] {
            writeln!(file, "dot,f32,{n},1,0,20.0,0.5,80.0,1").unwrap();
        }
        for n in [1025, 2049] {
            writeln!(file, "dot,f32,{n},1,0,19.0,0.52,76.0,1").unwrap();
        }
        // Misaligned and unverified rows are excluded.
        writeln!(file, "dot,f32,1024,1,1,5.0,2.0,20.0,1").unwrap();
        writeln!(file, "dot,f32,1024,1,0,5.0,2.0,20.0,0").unwrap();
        path
    }

    #[test]
    fn tail_flag_follows_dtype_lanes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simd.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "kernel,dtype,n,stride,misalign,gflops,cpe,GiBps,verified").unwrap();
        writeln!(file, "dot,f32,1028,1,0,1.0,1.0,1.0,1").unwrap();
        writeln!(file, "dot,f64,1028,1,0,1.0,1.0,1.0,1").unwrap();
        std::mem::drop(file);

        let table = load_and_flag(&path, LANES).unwrap();
        // 1028 % 8 != 0 but 1028 % 4 == 0.
        assert_eq!(table.number(0, "tail_flag"), Some(1.0));
        assert_eq!(table.number(1, "tail_flag"), Some(0.0));
    }

    #[test]
    fn delta_is_ratio_of_geometric_means() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_simd_csv(dir.path());
        let table = load_and_flag(&csv, LANES).unwrap();
        let summary = build_delta_summary(&table).unwrap();

        assert_eq!(summary.rows.len(), 1);
        let row = &summary.rows[0];
        assert_eq!(row.key, vec!["dot", "f32", "1"]);
        let delta = summary.stat_of(row, "delta_gflops_%").unwrap();
        assert!((delta - (19.0 / 20.0 - 1.0) * 100.0).abs() < 1e-9);
        assert_eq!(summary.stat_of(row, "samples_exact"), Some(2.0));
        assert_eq!(summary.stat_of(row, "samples_tail"), Some(2.0));
    }

    #[test]
    fn outputs_append_overall_and_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_simd_csv(dir.path());
        let table = load_and_flag(&csv, LANES).unwrap();
        let summary = build_delta_summary(&table).unwrap();

        let summary_csv = dir.path().join("data/tail_delta_summary.csv");
        let out_dir = dir.path().join("plots/tail");
        let rendered = write_outputs(summary, &summary_csv, &out_dir).unwrap();

        let overall = rendered.rows.last().unwrap();
        assert_eq!(overall.key, vec!["ALL", "-", "0"]);
        assert_eq!(rendered.stat_of(overall, "samples_exact"), Some(2.0));
        assert!(summary_csv.exists());
        assert!(out_dir.join("tail_delta_summary.md").exists());
        assert!(out_dir.join("tail_delta_gflops.svg").exists());
    }
}
