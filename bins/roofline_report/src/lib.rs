//! Roofline report: arithmetic intensity per (kernel, dtype), bandwidth and
//! peak estimation from the samples when no override is given, geometric
//! means per region, and Memory-/Compute-bound classification against
//! `y = min(P_peak, B_mem · AI)`.

use std::path::Path;

use render::md::{self, Align};
use render::svg::{self, RooflinePoint};
use shared::AppResult;
use stats::{aggregate, quantile, Reducer, Summary};
use tabular::{Predicate, Table};
use tracing::info;

const FALLBACK_BANDWIDTH: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct RooflineParams {
    pub b_mem: Option<f64>,
    pub peak_gflops: Option<f64>,
    pub stencil_flops: f64,
    pub pick: String,
    pub regionize: bool,
}

impl Default for RooflineParams {
    fn default() -> Self {
        Self {
            b_mem: None,
            peak_gflops: None,
            stencil_flops: 3.0,
            pick: "stride=1".to_string(),
            regionize: false,
        }
    }
}

/// Parse a `key=value;key=value` filter expression into predicates.
pub fn parse_pick(expr: &str) -> Vec<Predicate> {
    expr.split(';')
        .filter_map(|token| {
            let token = token.trim();
            let (key, value) = token.split_once('=')?;
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some(Predicate::equals(key, value))
            }
        })
        .collect()
}

/// FLOPs/byte for a kernel/dtype pair; the stencil FLOP count is
/// configurable because its definition is contested.
pub fn arithmetic_intensity(kernel: &str, dtype: &str, stencil_flops: f64) -> Option<f64> {
    let kernel = kernel.to_lowercase();
    let flops_per_el = match kernel.as_str() {
        "saxpy" | "dot" => 2.0,
        "mul" => 1.0,
        "stencil" => stencil_flops,
        _ => 2.0,
    };
    let bytes_per_el = match (dtype.to_lowercase().as_str(), kernel.as_str()) {
        ("f32", "saxpy") | ("f32", "mul") => 12.0,
        ("f32", "dot") | ("f32", "stencil") => 8.0,
        ("f64", "saxpy") | ("f64", "mul") => 24.0,
        ("f64", "dot") | ("f64", "stencil") => 16.0,
        _ => 12.0,
    };
    if bytes_per_el <= 0.0 {
        return None;
    }
    Some(flops_per_el / bytes_per_el)
}

/// Load and filter the samples, then derive region and AI columns.
pub fn prepare(simd_csv: &Path, params: &RooflineParams) -> AppResult<Table> {
    let raw = Table::from_csv_path(simd_csv)?;
    let filtered = raw.filter(&parse_pick(&params.pick), false)?;

    let kernel = filtered.require(&["kernel"])?.to_string();
    let dtype = filtered.require(&["dtype"])?.to_string();
    let n = filtered.require(&["n"])?.to_string();
    let gflops = filtered.require(tabular::GFLOPS)?.to_string();

    let mut mapping = vec![
        (kernel.clone(), "kernel".to_string()),
        (dtype.clone(), "dtype".to_string()),
        (n.clone(), "n".to_string()),
        (gflops.clone(), "gflops".to_string()),
    ];
    if let Some(gibps) = filtered.resolve(tabular::GIBPS) {
        mapping.push((gibps.to_string(), "gibps".to_string()));
    }
    let borrowed: Vec<(&str, &str)> = mapping.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    let mut table = filtered.select_as(&borrowed)?;

    let regions: Vec<String> = (0..table.len())
        .map(|row| {
            if params.regionize {
                table
                    .number(row, "n")
                    .map(region_by_n)
                    .unwrap_or("DRAM")
                    .to_string()
            } else {
                "ALL".to_string()
            }
        })
        .collect();
    table.add_text_column("region", regions)?;

    let ai: Vec<Option<f64>> = (0..table.len())
        .map(|row| {
            arithmetic_intensity(
                table.text(row, "kernel"),
                table.text(row, "dtype"),
                params.stencil_flops,
            )
        })
        .collect();
    table.add_column("ai", ai)?;
    info!(rows = table.len(), regionize = params.regionize, "prepared roofline samples");
    Ok(table)
}

fn region_by_n(n: f64) -> &'static str {
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

/// Memory bandwidth: explicit override, else the 95th percentile of the
/// measured GiB/s column, else the median of gflops/AI over large-N
/// samples, else a conservative constant.
pub fn estimate_bandwidth(table: &Table, override_gibps: Option<f64>) -> f64 {
    if let Some(b) = override_gibps {
        return b;
    }
    let gibps: Vec<f64> = (0..table.len()).filter_map(|row| table.number(row, "gibps")).collect();
    if let Some(q) = quantile(&gibps, 0.95) {
        return q;
    }
    let implied: Vec<f64> = (0..table.len())
        .filter_map(|row| {
            let ai = table.number(row, "ai").filter(|v| *v > 0.0)?;
            let n = table.number(row, "n")?;
            if n < 8_000_000.0 {
                return None;
            }
            table.number(row, "gflops").map(|g| g / ai)
        })
        .collect();
    quantile(&implied, 0.5).unwrap_or(FALLBACK_BANDWIDTH)
}

/// Peak GFLOP/s: explicit override, else the 98th percentile of the
/// cache-resident samples with 15% headroom.
pub fn estimate_peak(table: &Table, override_gflops: Option<f64>) -> f64 {
    if let Some(p) = override_gflops {
        return p;
    }
    let small: Vec<f64> = (0..table.len())
        .filter_map(|row| {
            let region = table.text(row, "region");
            let resident = if region == "ALL" {
                table.number(row, "n").is_some_and(|n| n <= 8192.0)
            } else {
                region == "L1" || region == "L2"
            };
            if resident {
                table.number(row, "gflops")
            } else {
                None
            }
        })
        .collect();
    if let Some(q) = quantile(&small, 0.98) {
        return q * 1.15;
    }
    let all: Vec<f64> = (0..table.len()).filter_map(|row| table.number(row, "gflops")).collect();
    quantile(&all, 0.98).map(|q| q * 1.15).unwrap_or(0.0)
}

/// Geometric means per (kernel, dtype, region).
pub fn build_points(table: &Table) -> AppResult<Summary> {
    aggregate(
        table,
        &["kernel", "dtype", "region"],
        &[
            Reducer::geo_mean("gmean_gflops", "gflops"),
            Reducer::geo_mean("gmean_ai", "ai"),
            Reducer::count("samples", "gflops"),
        ],
    )
}

fn roofline_points(summary: &Summary, kernel: Option<&str>) -> Vec<RooflinePoint> {
    summary
        .rows
        .iter()
        .filter(|row| kernel.map_or(true, |k| summary.key_of(row, "kernel") == k))
        .filter_map(|row| {
            Some(RooflinePoint {
                label: format!(
                    "{}-{}-{}",
                    summary.key_of(row, "kernel"),
                    summary.key_of(row, "dtype"),
                    summary.key_of(row, "region")
                ),
                ai: summary.stat_of(row, "gmean_ai")?,
                gflops: summary.stat_of(row, "gmean_gflops")?,
            })
        })
        .collect()
}

/// Predicted cap for a group's AI; undefined without a usable AI.
pub fn predicted_cap(ai: Option<f64>, b_mem: f64, p_peak: f64) -> Option<f64> {
    let ai = ai.filter(|v| v.is_finite() && *v > 0.0)?;
    Some(p_peak.min(b_mem * ai))
}

/// Write the roofline charts and the Markdown report.
pub fn write_outputs(
    summary: &Summary,
    params: &RooflineParams,
    b_mem: f64,
    p_peak: f64,
    out_dir: &Path,
    report_md: &Path,
) -> AppResult<()> {
    let overview = svg::roofline_chart(
        "Roofline Overview (SIMD, gmean)",
        b_mem,
        p_peak,
        &roofline_points(summary, None),
    );
    render::write_text(&out_dir.join("roofline_overview.svg"), &overview)?;

    let kernels = summary.distinct_key("kernel");
    for kernel in &kernels {
        let chart = svg::roofline_chart(
            &format!("Roofline - {kernel}"),
            b_mem,
            p_peak,
            &roofline_points(summary, Some(kernel)),
        );
        render::write_text(&out_dir.join(format!("roofline_{kernel}.svg")), &chart)?;
    }

    let fig_prefix = figure_prefix(out_dir, report_md);
    let mut doc = String::new();
    doc.push_str("# Roofline Analysis Report\n\n");
    doc.push_str(&format!("- Generated: {}\n", md::generated_stamp()));
    doc.push_str(&format!("- Peak performance (P_peak): {p_peak:.2} GFLOP/s\n"));
    doc.push_str(&format!("- Memory bandwidth (B_mem): {b_mem:.2} GiB/s\n"));
    doc.push_str(&format!(
        "- Filter condition: `{}`, region tagging: `{}`\n\n",
        if params.pick.is_empty() { "(none)" } else { &params.pick },
        if params.regionize { "on" } else { "off" }
    ));

    doc.push_str("## 1) Overview Roofline Plot\n");
    doc.push_str(&format!("![roofline_overview]({fig_prefix}/roofline_overview.svg)\n\n"));

    doc.push_str("## 2) Per-Kernel Roofline Plots\n");
    for kernel in &kernels {
        doc.push_str(&format!("### {kernel}\n![roofline_{kernel}]({fig_prefix}/roofline_{kernel}.svg)\n\n"));
    }

    doc.push_str("## 3) Measured vs Theoretical Cap and Bottleneck Classification\n\n");
    let mut rows = Vec::new();
    for row in &summary.rows {
        let ai = summary.stat_of(row, "gmean_ai");
        let gflops = summary.stat_of(row, "gmean_gflops");
        let cap = predicted_cap(ai, b_mem, p_peak);
        let util = match (gflops, cap) {
            (Some(g), Some(c)) if c != 0.0 => Some(100.0 * g / c),
            _ => None,
        };
        let bottleneck = match ai {
            Some(ai) if ai * b_mem < p_peak * 0.98 => "Memory-bound",
            Some(_) => "Compute-bound",
            None => "",
        };
        rows.push(vec![
            summary.key_of(row, "kernel").to_string(),
            summary.key_of(row, "dtype").to_string(),
            summary.key_of(row, "region").to_string(),
            md::fixed(ai, 3),
            md::fixed(gflops, 3),
            md::fixed(cap, 3),
            md::fixed(util, 3),
            bottleneck.to_string(),
            md::count(summary.stat_of(row, "samples")),
        ]);
    }
    doc.push_str(&md::table(
        &["kernel", "dtype", "region", "gmean_ai", "gmean_gflops", "pred_cap", "util_%", "bottleneck", "samples"],
        &[
            Align::Left,
            Align::Left,
            Align::Left,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Left,
            Align::Right,
        ],
        &rows,
    ));
    doc.push('\n');
    doc.push_str("Key points:\n\n");
    doc.push_str("- Points near `y = B*AI` are memory-bound; improve data reuse and stride.\n");
    doc.push_str("- Points near `y = P_peak` are compute-bound; raise SIMD issue rate or parallelism.\n");
    doc.push_str("- `util_%` is utilisation of the predicted cap; DRAM-region points typically sit below 50%.\n");

    render::write_text(report_md, &doc)?;
    Ok(())
}

/// Image paths in the report are relative to the report file.
fn figure_prefix(out_dir: &Path, report_md: &Path) -> String {
    if out_dir.is_absolute() {
        return out_dir.display().to_string();
    }
    let depth = report_md.components().count().saturating_sub(1);
    let mut prefix = String::new();
    for _ in 0..depth {
        prefix.push_str("../");
    }
    format!("{prefix}{}", out_dir.display())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn pick_expression_parses_equality_tokens() {
        let predicates = parse_pick("stride=1;misalign=0");
        assert_eq!(predicates.len(), 2);
        assert_eq!(predicates[0].column(), "stride");
        assert!(parse_pick("").is_empty());
        assert!(parse_pick("nonsense").is_empty());
    }

    #[test]
    fn arithmetic_intensity_matches_kernel_tables() {
        assert_eq!(arithmetic_intensity("saxpy", "f32", 3.0), Some(2.0 / 12.0));
        assert_eq!(arithmetic_intensity("dot", "f64", 3.0), Some(2.0 / 16.0));
        assert_eq!(arithmetic_intensity("stencil", "f32", 4.0), Some(4.0 / 8.0));
        // Unknown kernels fall back to 2 FLOPs over 12 bytes.
        assert_eq!(arithmetic_intensity("gemm", "f16", 3.0), Some(2.0 / 12.0));
    }

    fn write_samples(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("simd.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "kernel,dtype,n,stride,misalign,gflops,GiBps").unwrap();
        writeln!(file, "dot,f32,1024,1,0,40.0,100.0").unwrap();
        writeln!(file, "dot,f32,8388608,1,0,8.0,32.0").unwrap();
        writeln!(file, "dot,f32,8388608,4,0,2.0,8.0").unwrap();
        path
    }

    #[test]
    fn prepare_filters_and_tags_regions() {
        let dir = tempfile::tempdir().unwrap();
        let params = RooflineParams {
            regionize: true,
            ..RooflineParams::default()
        };
        let table = prepare(&write_samples(dir.path()), &params).unwrap();
        // stride=1 filter drops the stride-4 row
        assert_eq!(table.len(), 2);
        assert_eq!(table.text(0, "region"), "L1");
        assert_eq!(table.text(1, "region"), "DRAM");
        assert_eq!(table.number(0, "ai"), Some(0.25));
    }

    #[test]
    fn bandwidth_prefers_override_then_measured_quantile() {
        let dir = tempfile::tempdir().unwrap();
        let table = prepare(&write_samples(dir.path()), &RooflineParams::default()).unwrap();
        assert_eq!(estimate_bandwidth(&table, Some(42.0)), 42.0);
        let estimated = estimate_bandwidth(&table, None);
        // 95th percentile of [100, 32]
        assert!(estimated > 32.0 && estimated <= 100.0);
    }

    #[test]
    fn outputs_render_overview_and_classification() {
        let dir = tempfile::tempdir().unwrap();
        let params = RooflineParams {
            regionize: true,
            ..RooflineParams::default()
        };
        let table = prepare(&write_samples(dir.path()), &params).unwrap();
        let summary = build_points(&table).unwrap();
        let b_mem = estimate_bandwidth(&table, None);
        let p_peak = estimate_peak(&table, Some(50.0));

        let out_dir = dir.path().join("plots/roofline");
        let report = dir.path().join("reports/roofline.md");
        write_outputs(&summary, &params, b_mem, p_peak, &out_dir, &report).unwrap();

        assert!(out_dir.join("roofline_overview.svg").exists());
        assert!(out_dir.join("roofline_dot.svg").exists());
        let doc = std::fs::read_to_string(&report).unwrap();
        assert!(doc.contains("Bottleneck Classification"));
        assert!(doc.contains("Memory-bound") || doc.contains("Compute-bound"));
    }
}
