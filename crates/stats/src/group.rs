use std::cmp::Ordering;
use std::collections::HashMap;

use shared::AppResult;
use tabular::Table;

use crate::reduce::{geo_mean, geo_mean_delta, mean, std_dev};
use crate::summary::{Summary, SummaryRow};

/// Reduction applied to one metric within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Mean,
    StdDev,
    Count,
    GeoMean,
    /// Geometric mean of relative changes, `exp(mean(ln(1 + x))) − 1`.
    GeoMeanDelta,
}

/// Maps an output column to a source metric and its reduction.
#[derive(Debug, Clone)]
pub struct Reducer {
    pub output: String,
    pub metric: String,
    pub reduction: Reduction,
}

impl Reducer {
    fn new(output: &str, metric: &str, reduction: Reduction) -> Self {
        Self {
            output: output.to_string(),
            metric: metric.to_string(),
            reduction,
        }
    }

    pub fn mean(output: &str, metric: &str) -> Self {
        Self::new(output, metric, Reduction::Mean)
    }

    pub fn std_dev(output: &str, metric: &str) -> Self {
        Self::new(output, metric, Reduction::StdDev)
    }

    pub fn count(output: &str, metric: &str) -> Self {
        Self::new(output, metric, Reduction::Count)
    }

    pub fn geo_mean(output: &str, metric: &str) -> Self {
        Self::new(output, metric, Reduction::GeoMean)
    }

    pub fn geo_mean_delta(output: &str, metric: &str) -> Self {
        Self::new(output, metric, Reduction::GeoMeanDelta)
    }
}

/// Partition `table` by equality over the `group_keys` tuple and reduce each
/// partition. Output rows are sorted ascending by the key tuple (numeric
/// components compare numerically) so report output is reproducible.
pub fn aggregate(table: &Table, group_keys: &[&str], reducers: &[Reducer]) -> AppResult<Summary> {
    let mut key_cols = Vec::with_capacity(group_keys.len());
    for &key in group_keys {
        key_cols.push(table.require(&[key])?.to_string());
    }
    let mut metric_cols = Vec::with_capacity(reducers.len());
    for reducer in reducers {
        metric_cols.push(table.require(&[reducer.metric.as_str()])?.to_string());
    }

    let mut order: Vec<Vec<String>> = Vec::new();
    let mut groups: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for row in 0..table.len() {
        let key: Vec<String> = key_cols.iter().map(|k| table.text(row, k).to_string()).collect();
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key.clone());
                Vec::new()
            })
            .push(row);
    }
    order.sort_by(|a, b| key_cmp(a, b));

    let mut summary = Summary::new(
        group_keys.iter().map(|k| (*k).to_string()).collect(),
        reducers.iter().map(|r| r.output.clone()).collect(),
    );
    for key in order {
        let rows = &groups[&key];
        let stats = reducers
            .iter()
            .zip(&metric_cols)
            .map(|(reducer, metric)| {
                let samples: Vec<f64> = rows.iter().filter_map(|&r| table.number(r, metric)).collect();
                match reducer.reduction {
                    Reduction::Mean => mean(&samples),
                    Reduction::StdDev => std_dev(&samples),
                    Reduction::Count => Some(samples.len() as f64),
                    Reduction::GeoMean => geo_mean(&samples),
                    Reduction::GeoMeanDelta => geo_mean_delta(&samples),
                }
            })
            .collect();
        summary.rows.push(SummaryRow { key, stats });
    }
    Ok(summary)
}

/// Compare key tuples component-wise, numerically where both sides parse.
pub fn key_cmp(a: &[String], b: &[String]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = match (x.parse::<f64>(), y.parse::<f64>()) {
            (Ok(p), Ok(q)) => p.partial_cmp(&q).unwrap_or(Ordering::Equal),
            _ => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}
