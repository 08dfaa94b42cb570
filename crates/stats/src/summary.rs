use serde::Serialize;
use shared::{AppError, AppResult};
use tabular::Table;

use crate::reduce::mean;

/// One output row per group key: the key tuple plus one optional value per
/// statistic column. `None` is an undefined statistic and stays undefined
/// all the way into rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub key: Vec<String>,
    pub stats: Vec<Option<f64>>,
}

/// An aggregated table: named key columns and named statistic columns.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub key_columns: Vec<String>,
    pub stat_columns: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl Summary {
    pub fn new(key_columns: Vec<String>, stat_columns: Vec<String>) -> Self {
        Self {
            key_columns,
            stat_columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn key_index(&self, column: &str) -> Option<usize> {
        self.key_columns.iter().position(|c| c == column)
    }

    pub fn stat_index(&self, column: &str) -> Option<usize> {
        self.stat_columns.iter().position(|c| c == column)
    }

    /// Key cell of a row by column name; empty for unknown columns.
    pub fn key_of<'a>(&self, row: &'a SummaryRow, column: &str) -> &'a str {
        match self.key_index(column) {
            Some(idx) => row.key[idx].as_str(),
            None => "",
        }
    }

    /// Statistic of a row by column name.
    pub fn stat_of(&self, row: &SummaryRow, column: &str) -> Option<f64> {
        self.stat_index(column).and_then(|idx| row.stats[idx])
    }

    /// Multiply every value of a statistic column in place (used to turn
    /// fractional deltas into percentages).
    pub fn scale_stat(&mut self, column: &str, factor: f64) {
        if let Some(idx) = self.stat_index(column) {
            for row in &mut self.rows {
                if let Some(v) = row.stats[idx].as_mut() {
                    *v *= factor;
                }
            }
        }
    }

    /// Distinct values of a key column, in row order.
    pub fn distinct_key(&self, column: &str) -> Vec<String> {
        let mut seen = Vec::new();
        if let Some(idx) = self.key_index(column) {
            for row in &self.rows {
                if !seen.contains(&row.key[idx]) {
                    seen.push(row.key[idx].clone());
                }
            }
        }
        seen
    }

    /// Append a constant key column to every row (e.g. a `region = ALL`
    /// marker on an over-all-regions aggregate).
    pub fn add_key_column(&mut self, name: impl Into<String>, value: &str) {
        self.key_columns.push(name.into());
        for row in &mut self.rows {
            row.key.push(value.to_string());
        }
    }

    /// Concatenate another summary with identical columns.
    pub fn extend(&mut self, other: Summary) -> AppResult<()> {
        if self.key_columns != other.key_columns || self.stat_columns != other.stat_columns {
            return Err(AppError::Message(
                "cannot concatenate summaries with different columns".to_string(),
            ));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Rebuild a summary from a previously written summary CSV.
    pub fn from_table(table: &Table, key_columns: &[&str], stat_columns: &[&str]) -> AppResult<Self> {
        let mut keys = Vec::with_capacity(key_columns.len());
        for &key in key_columns {
            keys.push(table.require(&[key])?.to_string());
        }
        let mut stats = Vec::with_capacity(stat_columns.len());
        for &stat in stat_columns {
            stats.push(table.require(&[stat])?.to_string());
        }

        let mut summary = Summary::new(
            key_columns.iter().map(|k| (*k).to_string()).collect(),
            stat_columns.iter().map(|s| (*s).to_string()).collect(),
        );
        for row in 0..table.len() {
            summary.rows.push(SummaryRow {
                key: keys.iter().map(|k| table.text(row, k).to_string()).collect(),
                stats: stats.iter().map(|s| table.number(row, s)).collect(),
            });
        }
        Ok(summary)
    }

    /// Lower the summary back into a text table (for CSV output).
    pub fn to_table(&self) -> Table {
        let mut columns = self.key_columns.clone();
        columns.extend(self.stat_columns.clone());
        let mut table = Table::new("<summary>", columns);
        for row in &self.rows {
            let mut cells = row.key.clone();
            for stat in &row.stats {
                cells.push(match stat {
                    Some(v) => format!("{v}"),
                    None => String::new(),
                });
            }
            table.push_row(cells);
        }
        table
    }
}

/// Append the synthetic overall row: sentinel key values, the unweighted
/// arithmetic mean of every statistic column, and the SUM of the columns
/// named in `sum_columns` (sample counts). Call exactly once per finished
/// table; the row is a terminal artifact and must never be re-aggregated.
pub fn append_overall(summary: &mut Summary, sentinel: &[&str], sum_columns: &[&str]) -> AppResult<()> {
    if sentinel.len() != summary.key_columns.len() {
        return Err(AppError::Message(format!(
            "overall row sentinel has {} values for {} key columns",
            sentinel.len(),
            summary.key_columns.len()
        )));
    }

    let mut stats = Vec::with_capacity(summary.stat_columns.len());
    for (idx, column) in summary.stat_columns.iter().enumerate() {
        let values: Vec<f64> = summary.rows.iter().filter_map(|r| r.stats[idx]).collect();
        if sum_columns.contains(&column.as_str()) {
            stats.push(Some(values.iter().sum()));
        } else {
            stats.push(mean(&values));
        }
    }

    summary.rows.push(SummaryRow {
        key: sentinel.iter().map(|s| (*s).to_string()).collect(),
        stats,
    });
    Ok(())
}
