use std::collections::HashMap;

use shared::AppResult;
use tracing::debug;

use crate::table::Table;

/// Inner join on exact tuple equality of `keys`.
///
/// Rows whose key tuple is absent from the other side are dropped; drop
/// counts are logged for diagnosability. Non-key columns present on both
/// sides are renamed with the side-specific suffixes before joining.
pub fn inner_join(
    left: &Table,
    right: &Table,
    keys: &[&str],
    left_suffix: &str,
    right_suffix: &str,
) -> AppResult<Table> {
    let mut left_keys = Vec::with_capacity(keys.len());
    let mut right_keys = Vec::with_capacity(keys.len());
    for &key in keys {
        left_keys.push(left.require(&[key])?.to_string());
        right_keys.push(right.require(&[key])?.to_string());
    }

    let left_value_cols: Vec<String> = left
        .columns()
        .iter()
        .filter(|c| !left_keys.contains(c))
        .cloned()
        .collect();
    let right_value_cols: Vec<String> = right
        .columns()
        .iter()
        .filter(|c| !right_keys.contains(c))
        .cloned()
        .collect();

    let collides = |name: &str| {
        left_value_cols.iter().any(|c| c.eq_ignore_ascii_case(name))
            && right_value_cols.iter().any(|c| c.eq_ignore_ascii_case(name))
    };

    let mut out_columns: Vec<String> = keys.iter().map(|k| (*k).to_string()).collect();
    for col in &left_value_cols {
        out_columns.push(if collides(col) {
            format!("{col}{left_suffix}")
        } else {
            col.clone()
        });
    }
    for col in &right_value_cols {
        out_columns.push(if collides(col) {
            format!("{col}{right_suffix}")
        } else {
            col.clone()
        });
    }

    // Index the right side by key tuple; a key can map to several rows, in
    // which case the join emits every pairing.
    let mut right_index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for row in 0..right.len() {
        let key = key_tuple(right, row, &right_keys);
        right_index.entry(key).or_default().push(row);
    }

    let source = format!("join({}, {})", left.source(), right.source());
    let mut out = Table::new(source, out_columns);
    let mut matched_right: HashMap<Vec<String>, bool> = HashMap::new();
    let mut left_dropped = 0usize;

    for lrow in 0..left.len() {
        let key = key_tuple(left, lrow, &left_keys);
        match right_index.get(&key) {
            Some(rrows) => {
                matched_right.insert(key.clone(), true);
                for &rrow in rrows {
                    let mut row = key.clone();
                    for col in &left_value_cols {
                        row.push(left.text(lrow, col).to_string());
                    }
                    for col in &right_value_cols {
                        row.push(right.text(rrow, col).to_string());
                    }
                    out.push_row(row);
                }
            }
            None => left_dropped += 1,
        }
    }

    let right_dropped = right_index
        .keys()
        .filter(|k| !matched_right.contains_key(*k))
        .count();
    if left_dropped > 0 || right_dropped > 0 {
        debug!(
            left_dropped,
            right_dropped_keys = right_dropped,
            "inner join dropped unmatched rows"
        );
    }

    Ok(out)
}

fn key_tuple(table: &Table, row: usize, keys: &[String]) -> Vec<String> {
    keys.iter()
        .map(|k| normalise_key(table.text(row, k)))
        .collect()
}

/// Canonicalise key cells so `1`, `1.0` and ` 1 ` join with each other.
fn normalise_key(cell: &str) -> String {
    let cell = cell.trim();
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => crate::table::format_number(v),
        _ => cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(source: &str, columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(source, columns.iter().map(|c| (*c).to_string()).collect());
        for row in rows {
            t.push_row(row.iter().map(|c| (*c).to_string()).collect());
        }
        t
    }

    #[test]
    fn inner_semantics_keep_shared_keys_only() {
        let left = table("l", &["k", "v"], &[&["A", "1"], &["B", "2"]]);
        let right = table("r", &["k", "w"], &[&["B", "20"], &["C", "30"]]);
        let joined = inner_join(&left, &right, &["k"], "_l", "_r").unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.text(0, "k"), "B");
        assert_eq!(joined.number(0, "v"), Some(2.0));
        assert_eq!(joined.number(0, "w"), Some(20.0));
    }

    #[test]
    fn colliding_columns_get_suffixes() {
        let left = table("l", &["k", "gflops"], &[&["A", "4.0"]]);
        let right = table("r", &["k", "gflops"], &[&["A", "8.0"]]);
        let joined = inner_join(&left, &right, &["k"], "_al", "_mi").unwrap();
        assert_eq!(joined.number(0, "gflops_al"), Some(4.0));
        assert_eq!(joined.number(0, "gflops_mi"), Some(8.0));
    }

    #[test]
    fn numeric_keys_join_across_formatting() {
        let left = table("l", &["n", "v"], &[&["1024", "1"]]);
        let right = table("r", &["n", "w"], &[&["1024.0", "2"]]);
        let joined = inner_join(&left, &right, &["n"], "_l", "_r").unwrap();
        assert_eq!(joined.len(), 1);
    }

    #[test]
    fn empty_side_yields_empty_join() {
        let left = table("l", &["k", "v"], &[]);
        let right = table("r", &["k", "w"], &[&["A", "1"]]);
        let joined = inner_join(&left, &right, &["k"], "_l", "_r").unwrap();
        assert!(joined.is_empty());
    }

    #[test]
    fn duplicate_right_keys_fan_out() {
        let left = table("l", &["k", "v"], &[&["A", "1"]]);
        let right = table("r", &["k", "w"], &[&["A", "10"], &["A", "11"]]);
        let joined = inner_join(&left, &right, &["k"], "_l", "_r").unwrap();
        assert_eq!(joined.len(), 2);
    }
}
