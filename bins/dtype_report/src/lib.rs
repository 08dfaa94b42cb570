//! DType comparison report: joins scalar and SIMD runs on their full
//! configuration key, derives per-sample speedups, tags memory regions by
//! problem size, and aggregates geometric means per (dtype, kernel, region).

use std::path::Path;

use render::md::{self, Align};
use render::svg::{self, Series};
use shared::AppResult;
use stats::{aggregate, Reducer, Summary};
use tabular::{inner_join, Predicate, Table};
use tracing::info;

const JOIN_KEYS: [&str; 5] = ["kernel", "dtype", "n", "stride", "misalign"];
const REGIONS: [&str; 4] = ["L1", "L2", "LLC", "DRAM"];
const GEO_COLUMNS: [&str; 5] = [
    "gmean_speedup",
    "gmean_gflops_simd",
    "gmean_gflops_scalar",
    "gmean_cpe_simd",
    "gmean_cpe_scalar",
];

/// Working-set region by element count, matching the harness's sweep plan:
/// L1 ≤ 8K, L2 ≤ 128K, LLC ≤ 4M, DRAM beyond.
pub fn region_by_n(n: f64) -> &'static str {
    if n <= 8192.0 {
        "L1"
    } else if n <= 131_072.0 {
        "L2"
    } else if n <= 4_194_304.0 {
        "LLC"
    } else {
        "DRAM"
    }
}

fn normalise(table: &Table) -> AppResult<Table> {
    let kernel = table.require(&["kernel"])?.to_string();
    let dtype = table.require(&["dtype"])?.to_string();
    let n = table.require(&["n"])?.to_string();
    let stride = table.require(&["stride"])?.to_string();
    let misalign = table.require(&["misalign"])?.to_string();
    let gflops = table.require(tabular::GFLOPS)?.to_string();
    let cpe = table.require(tabular::CPE)?.to_string();
    table.select_as(&[
        (kernel.as_str(), "kernel"),
        (dtype.as_str(), "dtype"),
        (n.as_str(), "n"),
        (stride.as_str(), "stride"),
        (misalign.as_str(), "misalign"),
        (gflops.as_str(), "gflops"),
        (cpe.as_str(), "cpe"),
    ])
}

/// Join scalar and SIMD samples and derive speedup + region columns.
pub fn join_and_derive(scalar_csv: &Path, simd_csv: &Path) -> AppResult<Table> {
    let scalar = normalise(&Table::from_csv_path(scalar_csv)?)?;
    let simd = normalise(&Table::from_csv_path(simd_csv)?)?;

    let mut merged = inner_join(&simd, &scalar, &JOIN_KEYS, "_simd", "_scalar")?;
    info!(pairs = merged.len(), "joined scalar and SIMD samples");

    // Speedup via the GFLOP/s ratio; FLOP counts match per key, so this
    // equals the time speedup.
    let speedups: Vec<Option<f64>> = (0..merged.len())
        .map(|row| {
            match (merged.number(row, "gflops_simd"), merged.number(row, "gflops_scalar")) {
                (Some(simd), Some(scalar)) if scalar != 0.0 => Some(simd / scalar),
                _ => None,
            }
        })
        .collect();
    merged.add_column("speedup", speedups)?;

    let regions: Vec<String> = (0..merged.len())
        .map(|row| {
            merged
                .number(row, "n")
                .map(region_by_n)
                .unwrap_or("DRAM")
                .to_string()
        })
        .collect();
    merged.add_text_column("region", regions)?;
    Ok(merged)
}

fn geo_reducers() -> Vec<Reducer> {
    vec![
        Reducer::geo_mean(GEO_COLUMNS[0], "speedup"),
        Reducer::geo_mean(GEO_COLUMNS[1], "gflops_simd"),
        Reducer::geo_mean(GEO_COLUMNS[2], "gflops_scalar"),
        Reducer::geo_mean(GEO_COLUMNS[3], "cpe_simd"),
        Reducer::geo_mean(GEO_COLUMNS[4], "cpe_scalar"),
        Reducer::count("samples", "speedup"),
    ]
}

/// Per-(dtype, kernel, region) geometric means with the ALL-regions rows
/// appended after the per-region rows.
pub fn build_summary(merged: &Table) -> AppResult<Summary> {
    let mut by_region = aggregate(merged, &["dtype", "kernel", "region"], &geo_reducers())?;
    let mut overall = aggregate(merged, &["dtype", "kernel"], &geo_reducers())?;
    overall.add_key_column("region", "ALL");
    by_region.extend(overall)?;
    Ok(by_region)
}

/// The stride=1-only view of the same aggregation.
pub fn build_stride1_summary(merged: &Table) -> AppResult<Summary> {
    let stride1 = merged.filter(&[Predicate::equals("stride", "1")], false)?;
    aggregate(&stride1, &["dtype", "kernel", "region"], &geo_reducers())
}

/// Combined CSV table: all rows plus the stride=1 view tagged via a note
/// column.
pub fn combined_csv(summary: &Summary, stride1: &Summary) -> AppResult<Summary> {
    let mut all = summary.clone();
    all.add_key_column("note", "");
    let mut s1 = stride1.clone();
    s1.add_key_column("note", "stride=1 only");
    all.extend(s1)?;
    Ok(all)
}

fn stat_lookup(summary: &Summary, dtype: &str, kernel: &str, region: &str, stat: &str) -> Option<f64> {
    summary
        .rows
        .iter()
        .find(|row| {
            summary.key_of(row, "dtype") == dtype
                && summary.key_of(row, "kernel") == kernel
                && summary.key_of(row, "region") == region
        })
        .and_then(|row| summary.stat_of(row, stat))
}

fn regions_present(summary: &Summary) -> Vec<String> {
    REGIONS
        .iter()
        .filter(|r| summary.rows.iter().any(|row| summary.key_of(row, "region") == **r))
        .map(|r| (*r).to_string())
        .collect()
}

/// Render every chart and the Markdown document into `out_dir`.
pub fn write_outputs(summary: &Summary, stride1: &Summary, out_dir: &Path) -> AppResult<()> {
    let dtypes = summary.distinct_key("dtype");
    let kernels = summary.distinct_key("kernel");
    let regions = regions_present(summary);

    // Speedup by region, one chart per dtype.
    for dtype in &dtypes {
        let series: Vec<Series> = regions
            .iter()
            .map(|region| Series {
                name: region.clone(),
                values: kernels
                    .iter()
                    .map(|k| stat_lookup(summary, dtype, k, region, GEO_COLUMNS[0]))
                    .collect(),
                errors: None,
            })
            .collect();
        let chart = svg::grouped_bar_chart(
            &format!("SIMD Speedup vs Scalar - {dtype}"),
            "Kernel",
            "Geometric Mean Speedup",
            &kernels,
            &series,
        );
        render::write_text(&out_dir.join(format!("speedup_{dtype}.svg")), &chart)?;
    }

    // GFLOP/s and CPE by dtype, one chart pair per kernel.
    for kernel in &kernels {
        for (stat, short, y_label, prefix) in [
            (GEO_COLUMNS[1], "GFLOP/s", "GFLOP/s (Geometric Mean)", "gflops_simd"),
            (GEO_COLUMNS[3], "CPE", "CPE (Geometric Mean)", "cpe_simd"),
        ] {
            let series: Vec<Series> = dtypes
                .iter()
                .map(|dtype| Series {
                    name: dtype.clone(),
                    values: regions
                        .iter()
                        .map(|r| stat_lookup(summary, dtype, kernel, r, stat))
                        .collect(),
                    errors: None,
                })
                .collect();
            let chart = svg::grouped_bar_chart(
                &format!("SIMD {short} by dtype - {kernel}"),
                "Region",
                y_label,
                &regions,
                &series,
            );
            render::write_text(&out_dir.join(format!("{prefix}_{kernel}.svg")), &chart)?;
        }
    }

    render::write_text(&out_dir.join("dtype_summary.md"), &render_markdown(summary, stride1, out_dir))?;
    Ok(())
}

fn summary_rows(summary: &Summary) -> Vec<Vec<String>> {
    summary
        .rows
        .iter()
        .map(|row| {
            vec![
                summary.key_of(row, "dtype").to_string(),
                summary.key_of(row, "kernel").to_string(),
                summary.key_of(row, "region").to_string(),
                md::fixed(summary.stat_of(row, GEO_COLUMNS[0]), 3),
                md::fixed(summary.stat_of(row, GEO_COLUMNS[1]), 3),
                md::fixed(summary.stat_of(row, GEO_COLUMNS[2]), 3),
                md::fixed(summary.stat_of(row, GEO_COLUMNS[3]), 3),
                md::fixed(summary.stat_of(row, GEO_COLUMNS[4]), 3),
                md::count(summary.stat_of(row, "samples")),
            ]
        })
        .collect()
}

fn render_markdown(summary: &Summary, stride1: &Summary, out_dir: &Path) -> String {
    const HEADERS: [&str; 9] = [
        "dtype",
        "kernel",
        "region",
        "gmean_speedup",
        "gmean_gflops_simd",
        "gmean_gflops_scalar",
        "gmean_cpe_simd",
        "gmean_cpe_scalar",
        "samples",
    ];
    const ALIGNS: [Align; 9] = [
        Align::Left,
        Align::Left,
        Align::Left,
        Align::Right,
        Align::Right,
        Align::Right,
        Align::Right,
        Align::Right,
        Align::Right,
    ];

    let mut doc = String::new();
    doc.push_str("# DType Comparison Summary\n\n");
    doc.push_str(&format!("> Generated: {}\n\n", md::generated_stamp()));
    doc.push_str("## How to read\n");
    doc.push_str("- **Speedup** = SIMD_GFLOP/s ÷ Scalar_GFLOP/s (for the same kernel, this equals time speedup since FLOPs are identical).\n");
    doc.push_str("- **Region** is derived from `N`: L1 ≤ 8K; L2 ≤ 128K; LLC ≤ 4M; DRAM > 4M.\n");
    doc.push_str("- Metrics are **geometric means** across samples; `samples` is the count per group.\n\n");

    doc.push_str("## 1) All samples (all strides; aligned/misaligned mixed)\n\n");
    doc.push_str(&md::table(&HEADERS, &ALIGNS, &summary_rows(summary)));
    doc.push('\n');

    doc.push_str("## 2) stride=1 only\n\n");
    if stride1.is_empty() {
        doc.push_str("_No stride=1-only rows found in current CSV join._\n");
    } else {
        doc.push_str(&md::table(&HEADERS, &ALIGNS, &summary_rows(stride1)));
    }
    doc.push('\n');

    doc.push_str("## 3) Figures\n\n");
    for dtype in summary.distinct_key("dtype") {
        let file = format!("speedup_{dtype}.svg");
        if out_dir.join(&file).exists() {
            doc.push_str(&format!("### Speedup by Region - `{dtype}`\n![speedup_{dtype}]({file})\n\n"));
        }
    }
    for kernel in summary.distinct_key("kernel") {
        for (label, prefix) in [("SIMD GFLOP/s", "gflops_simd"), ("SIMD CPE", "cpe_simd")] {
            let file = format!("{prefix}_{kernel}.svg");
            if out_dir.join(&file).exists() {
                doc.push_str(&format!("### {label} by dtype - `{kernel}`\n![{prefix}_{kernel}]({file})\n\n"));
            }
        }
    }
    doc
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let scalar = dir.join("scalar.csv");
        let mut file = std::fs::File::create(&scalar).unwrap();
        writeln!(file, "kernel,dtype,n,stride,misalign,gflops_per_s,cycles_per_element").unwrap();
        writeln!(file, "dot,f32,1024,1,0,2.0,4.0").unwrap();
        writeln!(file, "dot,f32,262144,1,0,1.0,8.0").unwrap();
        writeln!(file, "dot,f32,999,9,0,1.0,1.0").unwrap();
        std::mem::drop(file);

        let simd = dir.join("simd.csv");
        let mut file = std::fs::File::create(&simd).unwrap();
        writeln!(file, "kernel,dtype,n,stride,misalign,Gflops,CPE").unwrap();
        writeln!(file, "dot,f32,1024,1,0,8.0,1.0").unwrap();
        writeln!(file, "dot,f32,262144,1,0,2.0,4.0").unwrap();
        writeln!(file, "dot,f32,777,3,0,3.0,1.0").unwrap();
        std::mem::drop(file);
        (scalar, simd)
    }

    #[test]
    fn join_pairs_only_matching_configurations() {
        let dir = tempfile::tempdir().unwrap();
        let (scalar, simd) = write_inputs(dir.path());
        let merged = join_and_derive(&scalar, &simd).unwrap();
        // The 999/9 scalar row and 777/3 SIMD row have no partner.
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.number(0, "speedup"), Some(4.0));
        assert_eq!(merged.text(0, "region"), "L1");
        assert_eq!(merged.text(1, "region"), "LLC");
    }

    #[test]
    fn summary_includes_all_region_rows() {
        let dir = tempfile::tempdir().unwrap();
        let (scalar, simd) = write_inputs(dir.path());
        let merged = join_and_derive(&scalar, &simd).unwrap();
        let summary = build_summary(&merged).unwrap();

        let all_row = summary
            .rows
            .iter()
            .find(|row| summary.key_of(row, "region") == "ALL")
            .expect("ALL region row");
        // geomean(4.0, 2.0) = sqrt(8)
        let speedup = summary.stat_of(all_row, "gmean_speedup").unwrap();
        assert!((speedup - 8f64.sqrt()).abs() < 1e-9);
        assert_eq!(summary.stat_of(all_row, "samples"), Some(2.0));
    }

    #[test]
    fn outputs_render_markdown_and_charts() {
        let dir = tempfile::tempdir().unwrap();
        let (scalar, simd) = write_inputs(dir.path());
        let merged = join_and_derive(&scalar, &simd).unwrap();
        let summary = build_summary(&merged).unwrap();
        let stride1 = build_stride1_summary(&merged).unwrap();

        let out_dir = dir.path().join("plots/dtype");
        write_outputs(&summary, &stride1, &out_dir).unwrap();

        assert!(out_dir.join("speedup_f32.svg").exists());
        assert!(out_dir.join("gflops_simd_dot.svg").exists());
        let doc = std::fs::read_to_string(out_dir.join("dtype_summary.md")).unwrap();
        assert!(doc.contains("## 1) All samples"));
        assert!(doc.contains("| f32 | dot | L1 |"));
        assert!(doc.contains("![speedup_f32](speedup_f32.svg)"));
    }

    #[test]
    fn combined_csv_tags_stride1_rows() {
        let dir = tempfile::tempdir().unwrap();
        let (scalar, simd) = write_inputs(dir.path());
        let merged = join_and_derive(&scalar, &simd).unwrap();
        let summary = build_summary(&merged).unwrap();
        let stride1 = build_stride1_summary(&merged).unwrap();
        let combined = combined_csv(&summary, &stride1).unwrap();

        let tagged = combined
            .rows
            .iter()
            .filter(|row| combined.key_of(row, "note") == "stride=1 only")
            .count();
        assert_eq!(tagged, stride1.rows.len());
    }
}
