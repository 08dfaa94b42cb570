//! Working-set-size report: mean ± std access latency per working-set
//! size, plotted on a log2 axis with cache-capacity markers so the
//! locality transitions line up with the hardware.

use std::path::Path;

use render::md::{self, Align};
use render::svg::{self, LineSeries, XScale};
use shared::AppResult;
use stats::{aggregate, Reducer, Summary};
use tabular::Table;
use tracing::info;

/// Cache capacities for the marker lines, in KiB.
#[derive(Debug, Clone, Copy)]
pub struct CacheSizes {
    pub l1d_kib: f64,
    pub l2_kib: f64,
    pub l3_kib: f64,
}

impl Default for CacheSizes {
    fn default() -> Self {
        Self {
            l1d_kib: 32.0,
            l2_kib: 1024.0,
            l3_kib: 16.0 * 1024.0,
        }
    }
}

/// Load the sweep and reduce to mean ± std per working-set size.
pub fn build_summary(raw_csv: &Path) -> AppResult<Summary> {
    let raw = Table::from_csv_path(raw_csv)?;
    let bytes = raw.require(&["bytes"])?.to_string();
    let ns = raw.require(&["ns_per_access"])?.to_string();

    let table = raw
        .select_as(&[(bytes.as_str(), "bytes"), (ns.as_str(), "ns_per_access")])?
        .drop_missing(&["bytes", "ns_per_access"]);
    info!(samples = table.len(), "loaded working-set sweep");

    aggregate(
        &table,
        &["bytes"],
        &[
            Reducer::count("count", "ns_per_access"),
            Reducer::mean("mean", "ns_per_access"),
            Reducer::std_dev("std", "ns_per_access"),
        ],
    )
}

/// Render the latency curve and Markdown section.
pub fn write_outputs(
    summary: &Summary,
    caches: CacheSizes,
    fig_path: &Path,
    out_md: &Path,
) -> AppResult<()> {
    let points: Vec<(f64, f64)> = summary
        .rows
        .iter()
        .filter_map(|row| {
            let bytes: f64 = row.key[0].parse().ok()?;
            Some((bytes / 1024.0, summary.stat_of(row, "mean")?))
        })
        .collect();
    let errors: Vec<f64> = summary
        .rows
        .iter()
        .filter(|row| row.key[0].parse::<f64>().is_ok() && summary.stat_of(row, "mean").is_some())
        .map(|row| summary.stat_of(row, "std").unwrap_or(0.0))
        .collect();

    let markers = [
        (caches.l1d_kib, "L1d".to_string()),
        (caches.l2_kib, "L2".to_string()),
        (caches.l3_kib, "L3".to_string()),
    ];
    let chart = svg::line_chart(
        "Access Time vs Working-Set Size (mean ± std)",
        "Working Set (KiB, log2)",
        "Latency (ns/access)",
        &[LineSeries {
            name: "latency".to_string(),
            points,
            errors: Some(errors),
        }],
        XScale::Log2,
        &markers,
        true,
    );
    render::write_text(fig_path, &chart)?;

    let mut rows = Vec::new();
    for row in &summary.rows {
        let kib = row.key[0].parse::<f64>().ok().map(|b| b / 1024.0);
        rows.push(vec![
            md::count(kib),
            md::count(summary.stat_of(row, "count")),
            md::fixed(summary.stat_of(row, "mean"), 3),
            md::fixed_or(summary.stat_of(row, "std"), 3, ""),
        ]);
    }

    let fig_name = fig_path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "wss_curve.svg".to_string());
    let mut doc = String::new();
    doc.push_str("## Working-Set Size Sweep (Locality Transitions)\n\n");
    doc.push_str("### Results (mean ± std, ns/access)\n\n");
    doc.push_str(&md::table(
        &["KiB", "count", "mean", "std"],
        &[Align::Right, Align::Right, Align::Right, Align::Right],
        &rows,
    ));
    doc.push('\n');
    doc.push_str(&format!("![wss]({fig_name})\n\n"));
    doc.push_str("### Analysis\n\n");
    doc.push_str("- As the working set grows, latency steps up near the L1/L2/L3 capacities.\n");
    doc.push_str("- Error bars show run-to-run variability at each working-set size.\n");
    render::write_text(out_md, &doc)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_sweep(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("wss.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "bytes,rep,ns_per_access").unwrap();
        for rep in 0..3 {
            writeln!(file, "16384,{rep},1.2").unwrap();
            writeln!(file, "1048576,{rep},{}", 4.0 + rep as f64 * 0.2).unwrap();
            writeln!(file, "67108864,{rep},80.0").unwrap();
        }
        writeln!(file, "bogus,9,1.0").unwrap();
        path
    }

    #[test]
    fn summary_sorted_by_size_with_counts() {
        let dir = tempfile::tempdir().unwrap();
        let summary = build_summary(&write_sweep(dir.path())).unwrap();

        assert_eq!(summary.rows.len(), 3);
        assert_eq!(summary.rows[0].key[0], "16384");
        assert_eq!(summary.stat_of(&summary.rows[0], "count"), Some(3.0));
        let mid_mean = summary.stat_of(&summary.rows[1], "mean").unwrap();
        assert!((mid_mean - 4.2).abs() < 1e-9);
        assert!(summary.stat_of(&summary.rows[1], "std").unwrap() > 0.0);
    }

    #[test]
    fn outputs_render_curve_and_markers() {
        let dir = tempfile::tempdir().unwrap();
        let summary = build_summary(&write_sweep(dir.path())).unwrap();
        let fig = dir.path().join("figs/wss_curve.svg");
        let out_md = dir.path().join("out/wss.md");
        write_outputs(&summary, CacheSizes::default(), &fig, &out_md).unwrap();

        let svg = std::fs::read_to_string(&fig).unwrap();
        assert!(svg.contains("L1d"));
        assert!(svg.contains("L3"));
        let doc = std::fs::read_to_string(&out_md).unwrap();
        assert!(doc.contains("| 16 | 3 | 1.200 |"));
        assert!(doc.contains("![wss](wss_curve.svg)"));
    }
}
