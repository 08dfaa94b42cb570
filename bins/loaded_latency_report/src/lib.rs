//! Loaded-latency report: buckets injected throughput so repeated runs
//! align, plots the mean ± std latency curve, and locates the knee where
//! queueing delay takes over.

use std::path::Path;

use render::md::{self, Align};
use render::svg::{self, LineSeries, XScale};
use shared::AppResult;
use stats::{aggregate, knee_point, Reducer, Summary};
use tabular::Table;
use tracing::info;

const BUCKET_GBS: f64 = 0.25;

/// Load the raw (bandwidth, latency) samples and bucket the bandwidth.
pub fn load_and_bucket(raw_csv: &Path) -> AppResult<Table> {
    let raw = Table::from_csv_path(raw_csv)?;
    let bandwidth = raw.require(&["bandwidth_gbs"])?.to_string();
    let latency = raw.require(&["latency_ns"])?.to_string();

    let table = raw.select_as(&[
        (bandwidth.as_str(), "bandwidth_gbs"),
        (latency.as_str(), "latency_ns"),
    ])?;
    let mut table = table.drop_missing(&["bandwidth_gbs", "latency_ns"]);

    let buckets: Vec<Option<f64>> = (0..table.len())
        .map(|row| {
            table
                .number(row, "bandwidth_gbs")
                .map(|bw| (bw / BUCKET_GBS).round() * BUCKET_GBS)
        })
        .collect();
    table.add_column("bw_bucket", buckets)?;
    info!(samples = table.len(), "bucketed loaded-latency samples");
    Ok(table)
}

/// Mean ± std ± count of latency per throughput bucket, sorted by bucket.
pub fn build_summary(table: &Table) -> AppResult<Summary> {
    aggregate(
        table,
        &["bw_bucket"],
        &[
            Reducer::count("count", "latency_ns"),
            Reducer::mean("mean", "latency_ns"),
            Reducer::std_dev("std", "latency_ns"),
        ],
    )
}

/// The knee of the mean-latency curve, if the curve supports one.
pub fn find_knee(summary: &Summary) -> Option<(f64, f64)> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for row in &summary.rows {
        let x: f64 = row.key[0].parse().ok()?;
        let y = summary.stat_of(row, "mean")?;
        xs.push(x);
        ys.push(y);
    }
    knee_point(&xs, &ys)
}

/// Render the curve (error bars when at least two buckets exist, a scatter
/// of the raw samples otherwise) and the Markdown section.
pub fn write_outputs(table: &Table, summary: &Summary, out_dir: &Path, out_md: &Path) -> AppResult<()> {
    let fig_path = out_dir.join("throughput_latency.svg");

    if summary.rows.len() >= 2 {
        let points: Vec<(f64, f64)> = summary
            .rows
            .iter()
            .filter_map(|row| Some((row.key[0].parse().ok()?, summary.stat_of(row, "mean")?)))
            .collect();
        let errors: Vec<f64> = summary
            .rows
            .iter()
            .filter(|row| summary.stat_of(row, "mean").is_some() && row.key[0].parse::<f64>().is_ok())
            .map(|row| summary.stat_of(row, "std").unwrap_or(0.0))
            .collect();
        let chart = svg::line_chart(
            "Throughput-Latency (loaded latency, mean ± std)",
            "Throughput (GB/s)",
            "Latency (ns)",
            &[LineSeries {
                name: "latency".to_string(),
                points,
                errors: Some(errors),
            }],
            XScale::Linear,
            &[],
            true,
        );
        render::write_text(&fig_path, &chart)?;
    } else {
        let points: Vec<(f64, f64)> = (0..table.len())
            .filter_map(|row| {
                Some((
                    table.number(row, "bandwidth_gbs")?,
                    table.number(row, "latency_ns")?,
                ))
            })
            .collect();
        let chart = svg::line_chart(
            "Throughput-Latency (scatter)",
            "Throughput (GB/s)",
            "Latency (ns)",
            &[LineSeries {
                name: "latency".to_string(),
                points,
                errors: None,
            }],
            XScale::Linear,
            &[],
            false,
        );
        render::write_text(&fig_path, &chart)?;
    }

    let knee_txt = match find_knee(summary) {
        Some((bw, lat)) => format!("BW≈{bw:.2} GB/s, Lat≈{lat:.1} ns"),
        None => "N/A".to_string(),
    };

    let mut rows = Vec::new();
    for row in &summary.rows {
        rows.push(vec![
            md::fixed(row.key[0].parse().ok(), 2),
            md::fixed(summary.stat_of(row, "mean"), 2),
            md::fixed(Some(summary.stat_of(row, "std").unwrap_or(0.0)), 2),
            md::count(summary.stat_of(row, "count")),
        ]);
    }

    let mut doc = String::new();
    doc.push_str("## Access Intensity Sweep (Loaded Latency)\n\n");
    doc.push_str("### Output Results (bucketed by throughput)\n\n");
    if !summary.is_empty() {
        doc.push_str(&md::table(
            &["Throughput (GB/s)", "Mean Latency (ns)", "Std (ns)", "Count"],
            &[Align::Right, Align::Right, Align::Right, Align::Right],
            &rows,
        ));
        doc.push('\n');
    }
    doc.push_str(&format!("**Knee (approx.)**: {knee_txt}\n\n"));
    doc.push_str("![Throughput-Latency](throughput_latency.svg)\n\n");
    doc.push_str("### Analysis\n\n");
    doc.push_str("- As injected throughput rises, queueing delays grow, so average latency climbs; past the knee, returns diminish.\n");
    doc.push_str("- Error bars denote standard deviation across repeated runs per throughput bucket.\n");
    render::write_text(out_md, &doc)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_samples(dir: &Path, rows: &[(f64, f64)]) -> std::path::PathBuf {
        let path = dir.join("loaded.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "rep,bandwidth_gbs,latency_ns").unwrap();
        for (bw, lat) in rows {
            writeln!(file, "1,{bw},{lat}").unwrap();
        }
        path
    }

    #[test]
    fn buckets_align_repeated_runs() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_samples(dir.path(), &[(10.1, 80.0), (10.12, 90.0), (20.0, 300.0)]);
        let table = load_and_bucket(&csv).unwrap();
        let summary = build_summary(&table).unwrap();

        // 10.1 and 10.12 share the 10.0 GB/s bucket.
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].key[0], "10");
        assert_eq!(summary.stat_of(&summary.rows[0], "count"), Some(2.0));
        assert_eq!(summary.stat_of(&summary.rows[0], "mean"), Some(85.0));
    }

    #[test]
    fn knee_found_on_saturating_curve() {
        let dir = tempfile::tempdir().unwrap();
        let mut rows = Vec::new();
        for (bw, lat) in [
            (1.0, 100.0),
            (2.0, 101.0),
            (3.0, 102.0),
            (4.0, 104.0),
            (5.0, 140.0),
            (6.0, 260.0),
            (7.0, 520.0),
        ] {
            rows.push((bw, lat));
            rows.push((bw, lat + 2.0));
        }
        let csv = write_samples(dir.path(), &rows);
        let table = load_and_bucket(&csv).unwrap();
        let summary = build_summary(&table).unwrap();
        let (bw, _) = find_knee(&summary).expect("knee");
        assert!((3.0..=6.0).contains(&bw), "knee at {bw}");
    }

    #[test]
    fn outputs_render_table_and_knee() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_samples(
            dir.path(),
            &[(1.0, 100.0), (1.05, 102.0), (2.0, 120.0), (3.0, 200.0)],
        );
        let table = load_and_bucket(&csv).unwrap();
        let summary = build_summary(&table).unwrap();

        let out_dir = dir.path().join("figs");
        let out_md = dir.path().join("out/loaded_latency.md");
        write_outputs(&table, &summary, &out_dir, &out_md).unwrap();

        assert!(out_dir.join("throughput_latency.svg").exists());
        let doc = std::fs::read_to_string(&out_md).unwrap();
        assert!(doc.contains("**Knee (approx.)**"));
    }

    #[test]
    fn single_bucket_falls_back_to_scatter() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_samples(dir.path(), &[(1.0, 100.0), (1.02, 105.0)]);
        let table = load_and_bucket(&csv).unwrap();
        let summary = build_summary(&table).unwrap();
        assert_eq!(summary.rows.len(), 1);
        assert!(find_knee(&summary).is_none());

        let out_dir = dir.path().join("figs");
        let out_md = dir.path().join("out/loaded_latency.md");
        write_outputs(&table, &summary, &out_dir, &out_md).unwrap();
        let doc = std::fs::read_to_string(&out_md).unwrap();
        assert!(doc.contains("N/A"));
    }
}
