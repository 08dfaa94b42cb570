use std::collections::HashMap;

use shared::{AppError, AppResult};
use tracing::debug;

use crate::summary::Summary;

/// One matched baseline/treatment pair: the shared key, the percentage
/// relative change per tracked metric, both sides' raw aggregates, and both
/// sides' sample counts.
#[derive(Debug, Clone)]
pub struct PairedDelta {
    pub key: Vec<String>,
    pub deltas: Vec<Option<f64>>,
    pub baseline: Vec<Option<f64>>,
    pub treatment: Vec<Option<f64>>,
    pub baseline_samples: Option<f64>,
    pub treatment_samples: Option<f64>,
}

/// Inner-join two per-group aggregates on their shared key and compute
/// `(treatment / baseline − 1) × 100` per metric.
///
/// A missing or zero baseline aggregate makes that metric's delta
/// undefined rather than a division by zero. Keys present on only one side
/// are dropped (inner-join semantics); the drop counts are logged.
pub fn aggregate_delta(
    baseline: &Summary,
    treatment: &Summary,
    metrics: &[&str],
    samples_column: Option<&str>,
) -> AppResult<Vec<PairedDelta>> {
    if baseline.key_columns != treatment.key_columns {
        return Err(AppError::Message(format!(
            "delta sides disagree on keys: {:?} vs {:?}",
            baseline.key_columns, treatment.key_columns
        )));
    }
    for metric in metrics {
        for side in [baseline, treatment] {
            if side.stat_index(metric).is_none() {
                return Err(AppError::Message(format!(
                    "delta metric '{metric}' missing from aggregate"
                )));
            }
        }
    }

    let treatment_index: HashMap<&[String], usize> = treatment
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| (row.key.as_slice(), idx))
        .collect();

    let mut pairs = Vec::new();
    let mut matched = 0usize;
    for row in &baseline.rows {
        let Some(&tidx) = treatment_index.get(row.key.as_slice()) else {
            continue;
        };
        matched += 1;
        let trow = &treatment.rows[tidx];

        let mut deltas = Vec::with_capacity(metrics.len());
        let mut base_values = Vec::with_capacity(metrics.len());
        let mut treat_values = Vec::with_capacity(metrics.len());
        for metric in metrics {
            let b = baseline.stat_of(row, metric);
            let t = treatment.stat_of(trow, metric);
            deltas.push(relative_change_pct(b, t));
            base_values.push(b);
            treat_values.push(t);
        }

        pairs.push(PairedDelta {
            key: row.key.clone(),
            deltas,
            baseline: base_values,
            treatment: treat_values,
            baseline_samples: samples_column.and_then(|c| baseline.stat_of(row, c)),
            treatment_samples: samples_column.and_then(|c| treatment.stat_of(trow, c)),
        });
    }

    let baseline_only = baseline.rows.len() - matched;
    let treatment_only = treatment.rows.len() - matched;
    if baseline_only > 0 || treatment_only > 0 {
        debug!(matched, baseline_only, treatment_only, "delta join dropped unmatched groups");
    }

    Ok(pairs)
}

/// `(treatment / baseline − 1) × 100`, undefined when the baseline is
/// missing or zero.
pub fn relative_change_pct(baseline: Option<f64>, treatment: Option<f64>) -> Option<f64> {
    match (baseline, treatment) {
        (Some(b), Some(t)) if b != 0.0 => Some((t / b - 1.0) * 100.0),
        _ => None,
    }
}
