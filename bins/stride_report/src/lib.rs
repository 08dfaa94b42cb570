//! Stride sweep report: absolute GFLOP/s and CPE per configuration, the
//! same throughput normalised to the stride=1 sample of each
//! (kernel, dtype, n), and grouped bars for three representative problem
//! sizes per dtype.

use std::collections::HashMap;
use std::path::Path;

use render::md::{self, Align};
use render::svg::{self, LineSeries, Series, XScale};
use shared::AppResult;
use stats::key_cmp;
use tabular::{Predicate, Table};
use tracing::info;

const STRIDES: [u64; 4] = [1, 2, 4, 8];

/// Load the sweep, keep verified aligned samples at the canonical strides.
pub fn load_sweep(simd_csv: &Path) -> AppResult<Table> {
    let raw = Table::from_csv_path(simd_csv)?;
    let filtered = raw.filter(
        &[
            Predicate::equals("verified", "1"),
            Predicate::equals("misalign", "0"),
            Predicate::one_of("stride", &["1", "2", "4", "8"]),
        ],
        false,
    )?;

    let kernel = filtered.require(&["kernel"])?.to_string();
    let dtype = filtered.require(&["dtype"])?.to_string();
    let n = filtered.require(&["n"])?.to_string();
    let stride = filtered.require(&["stride"])?.to_string();
    let gflops = filtered.require(tabular::GFLOPS)?.to_string();
    let cpe = filtered.require(tabular::CPE)?.to_string();

    let table = filtered.select_as(&[
        (kernel.as_str(), "kernel"),
        (dtype.as_str(), "dtype"),
        (n.as_str(), "n"),
        (stride.as_str(), "stride"),
        (gflops.as_str(), "gflops"),
        (cpe.as_str(), "cpe"),
    ])?;
    info!(rows = table.len(), "loaded stride sweep");
    Ok(table)
}

/// Add a `gflops_rel` column normalising each row to the stride=1 sample of
/// the same (kernel, dtype, n); rows without a stride=1 partner stay
/// undefined.
pub fn add_relative(table: &Table) -> AppResult<Table> {
    let mut base: HashMap<(String, String, String), f64> = HashMap::new();
    for row in 0..table.len() {
        if table.number(row, "stride") == Some(1.0) {
            if let Some(gflops) = table.number(row, "gflops").filter(|v| *v != 0.0) {
                base.insert(group_key(table, row), gflops);
            }
        }
    }

    let rel: Vec<Option<f64>> = (0..table.len())
        .map(|row| {
            let gflops = table.number(row, "gflops")?;
            base.get(&group_key(table, row)).map(|b| gflops / b)
        })
        .collect();

    let mut out = table.clone();
    out.add_column("gflops_rel", rel)?;
    Ok(out)
}

fn group_key(table: &Table, row: usize) -> (String, String, String) {
    (
        table.text(row, "kernel").to_string(),
        table.text(row, "dtype").to_string(),
        table.text(row, "n").to_string(),
    )
}

fn sorted_rows(table: &Table, keys: &[&str]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..table.len()).collect();
    indices.sort_by(|&a, &b| {
        let ka: Vec<String> = keys.iter().map(|k| table.text(a, k).to_string()).collect();
        let kb: Vec<String> = keys.iter().map(|k| table.text(b, k).to_string()).collect();
        key_cmp(&ka, &kb)
    });
    indices
}

/// Smallest / median / largest distinct `n` per dtype.
pub fn representative_sizes(table: &Table) -> HashMap<String, Vec<f64>> {
    let mut by_dtype: HashMap<String, Vec<f64>> = HashMap::new();
    for row in 0..table.len() {
        if let Some(n) = table.number(row, "n") {
            let sizes = by_dtype.entry(table.text(row, "dtype").to_string()).or_default();
            if !sizes.contains(&n) {
                sizes.push(n);
            }
        }
    }
    for sizes in by_dtype.values_mut() {
        sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        if sizes.len() > 2 {
            *sizes = vec![sizes[0], sizes[sizes.len() / 2], sizes[sizes.len() - 1]];
        }
    }
    by_dtype
}

/// Rows restricted to the representative sizes, exported for review.
pub fn plotset(table: &Table) -> AppResult<Table> {
    let picks = representative_sizes(table);
    let mut out = Table::new("<plotset>", table.columns().to_vec());
    for row in 0..table.len() {
        let dtype = table.text(row, "dtype").to_string();
        let keep = match (table.number(row, "n"), picks.get(&dtype)) {
            (Some(n), Some(sizes)) => sizes.contains(&n),
            _ => false,
        };
        if keep {
            out.push_row(
                table
                    .columns()
                    .iter()
                    .map(|c| table.text(row, c).to_string())
                    .collect(),
            );
        }
    }
    Ok(out)
}

fn metric_at(table: &Table, kernel: &str, dtype: &str, n: f64, stride: u64, metric: &str) -> Option<f64> {
    (0..table.len()).find_map(|row| {
        if table.text(row, "kernel") == kernel
            && table.text(row, "dtype") == dtype
            && table.number(row, "n") == Some(n)
            && table.number(row, "stride") == Some(stride as f64)
        {
            table.number(row, metric)
        } else {
            None
        }
    })
}

fn distinct_pairs(table: &Table) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for row in 0..table.len() {
        let pair = (
            table.text(row, "kernel").to_string(),
            table.text(row, "dtype").to_string(),
        );
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }
    pairs.sort();
    pairs
}

/// Grouped bars per (kernel, dtype): strides on x, one series per
/// representative size.
pub fn write_grouped_bars(table: &Table, out_dir: &Path) -> AppResult<()> {
    let picks = representative_sizes(table);
    let x_ticks: Vec<String> = STRIDES.iter().map(|s| s.to_string()).collect();

    for (kernel, dtype) in distinct_pairs(table) {
        let Some(sizes) = picks.get(&dtype).filter(|s| !s.is_empty()) else {
            continue;
        };
        for (metric, y_label, suffix) in [
            ("gflops", "GFLOP/s", "gflops_grouped_by_stride"),
            ("cpe", "CPE", "cpe_grouped_by_stride"),
        ] {
            let series: Vec<Series> = sizes
                .iter()
                .map(|&n| Series {
                    name: format!("N={}", n as u64),
                    values: STRIDES
                        .iter()
                        .map(|&s| metric_at(table, &kernel, &dtype, n, s, metric))
                        .collect(),
                    errors: None,
                })
                .collect();
            let chart = svg::grouped_bar_chart(
                &format!("{kernel} {dtype} - {y_label} vs stride (per-N grouped)"),
                "Stride",
                y_label,
                &x_ticks,
                &series,
            );
            render::write_text(&out_dir.join(format!("{kernel}_{dtype}_{suffix}.svg")), &chart)?;
        }
    }
    Ok(())
}

/// Optional per-(kernel, dtype, n) line charts across strides.
pub fn write_line_charts(table: &Table, out_dir: &Path) -> AppResult<()> {
    for (kernel, dtype) in distinct_pairs(table) {
        let mut sizes: Vec<f64> = Vec::new();
        for row in 0..table.len() {
            if table.text(row, "kernel") == kernel && table.text(row, "dtype") == dtype {
                if let Some(n) = table.number(row, "n") {
                    if !sizes.contains(&n) {
                        sizes.push(n);
                    }
                }
            }
        }
        for n in sizes {
            for (metric, y_label, suffix) in [
                ("gflops", "GFLOP/s", "gflops_vs_stride"),
                ("cpe", "CPE", "cpe_vs_stride"),
            ] {
                let points: Vec<(f64, f64)> = STRIDES
                    .iter()
                    .filter_map(|&s| metric_at(table, &kernel, &dtype, n, s, metric).map(|v| (s as f64, v)))
                    .collect();
                if points.is_empty() {
                    continue;
                }
                let chart = svg::line_chart(
                    &format!("{kernel} {dtype} N={}", n as u64),
                    "Stride",
                    y_label,
                    &[LineSeries {
                        name: metric.to_string(),
                        points,
                        errors: None,
                    }],
                    XScale::Linear,
                    &[],
                    true,
                );
                render::write_text(
                    &out_dir.join(format!("{kernel}_{dtype}_N{}_{suffix}.svg", n as u64)),
                    &chart,
                )?;
            }
        }
    }
    Ok(())
}

/// Markdown summary of the absolute and relative views.
pub fn render_markdown(with_rel: &Table) -> String {
    let mut rows = Vec::new();
    for row in sorted_rows(with_rel, &["kernel", "dtype", "n", "stride"]) {
        rows.push(vec![
            with_rel.text(row, "kernel").to_string(),
            with_rel.text(row, "dtype").to_string(),
            md::count(with_rel.number(row, "n")),
            md::count(with_rel.number(row, "stride")),
            md::fixed_or(with_rel.number(row, "gflops"), 3, "nan"),
            md::fixed_or(with_rel.number(row, "cpe"), 3, "nan"),
            md::fixed_or(with_rel.number(row, "gflops_rel"), 3, "nan"),
        ]);
    }

    let mut doc = String::new();
    doc.push_str("### Stride Scan Summary\n\n");
    doc.push_str(&md::table(
        &["kernel", "dtype", "N", "stride", "GFLOP/s", "CPE", "GFLOP/s rel(s=1)"],
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
    doc
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_sweep(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("simd.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "kernel,dtype,n,stride,misalign,gflops,cpe,verified").unwrap();
        for (n, stride, gflops) in [
            (1024, 1, 8.0),
            (1024, 2, 6.0),
            (1024, 4, 4.0),
            (65536, 1, 5.0),
            (65536, 2, 4.0),
            (8388608, 1, 2.0),
            (8388608, 8, 1.0),
        ] {
            writeln!(file, "saxpy,f32,{n},{stride},0,{gflops},1.0,1").unwrap();
        }
        // stride outside the sweep set and a misaligned row are dropped
        writeln!(file, "saxpy,f32,1024,16,0,9.0,1.0,1").unwrap();
        writeln!(file, "saxpy,f32,1024,1,1,9.0,1.0,1").unwrap();
        path
    }

    #[test]
    fn sweep_filters_to_canonical_strides() {
        let dir = tempfile::tempdir().unwrap();
        let table = load_sweep(&write_sweep(dir.path())).unwrap();
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn relative_normalises_to_stride_one() {
        let dir = tempfile::tempdir().unwrap();
        let table = load_sweep(&write_sweep(dir.path())).unwrap();
        let rel = add_relative(&table).unwrap();
        // 1024/stride=2 → 6/8
        assert_eq!(rel.number(1, "gflops_rel"), Some(0.75));
        // stride=1 rows normalise to 1.0
        assert_eq!(rel.number(0, "gflops_rel"), Some(1.0));
    }

    #[test]
    fn representative_sizes_pick_min_median_max() {
        let dir = tempfile::tempdir().unwrap();
        let table = load_sweep(&write_sweep(dir.path())).unwrap();
        let picks = representative_sizes(&table);
        assert_eq!(picks["f32"], vec![1024.0, 65536.0, 8388608.0]);
    }

    #[test]
    fn markdown_renders_missing_rel_as_nan() {
        let mut table = Table::new(
            "<memory>",
            ["kernel", "dtype", "n", "stride", "gflops", "cpe"]
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
        );
        // No stride=1 partner, so the relative column is undefined.
        table.push_row(
            ["dot", "f32", "1024", "2", "4.0", "1.0"]
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
        );
        let rel = add_relative(&table).unwrap();
        let doc = render_markdown(&rel);
        assert!(doc.contains("| nan |"));
    }

    #[test]
    fn charts_are_written_per_kernel_dtype() {
        let dir = tempfile::tempdir().unwrap();
        let table = load_sweep(&write_sweep(dir.path())).unwrap();
        let out_dir = dir.path().join("plots/stride");
        write_grouped_bars(&table, &out_dir).unwrap();
        assert!(out_dir.join("saxpy_f32_gflops_grouped_by_stride.svg").exists());
        assert!(out_dir.join("saxpy_f32_cpe_grouped_by_stride.svg").exists());
    }
}
