use shared::{AppError, AppResult};

use crate::table::Table;

/// A row predicate: equality on a single value, or membership in a set.
///
/// Values compare as text first, falling back to numeric equality so that
/// `0`, `0.0` and ` 0 ` all match a `misalign=0` filter.
#[derive(Debug, Clone)]
pub struct Predicate {
    column: String,
    allowed: Vec<String>,
}

impl Predicate {
    pub fn equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            allowed: vec![value.into()],
        }
    }

    pub fn one_of(column: impl Into<String>, values: &[&str]) -> Self {
        Self {
            column: column.into(),
            allowed: values.iter().map(|v| (*v).to_string()).collect(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    fn matches(&self, cell: &str) -> bool {
        self.allowed.iter().any(|wanted| cell_matches(cell, wanted))
    }
}

fn cell_matches(cell: &str, wanted: &str) -> bool {
    let cell = cell.trim();
    let wanted = wanted.trim();
    if cell == wanted {
        return true;
    }
    match (cell.parse::<f64>(), wanted.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl Table {
    /// Keep rows satisfying every predicate.
    ///
    /// Predicates naming unknown columns are ignored in tolerant mode (the
    /// behaviour of the original harness scripts); with `strict` set they
    /// become a `MissingColumn` error instead.
    pub fn filter(&self, predicates: &[Predicate], strict: bool) -> AppResult<Table> {
        let mut active = Vec::new();
        for predicate in predicates {
            match self.resolve(&[predicate.column()]) {
                Some(name) => active.push((name.to_string(), predicate)),
                None if strict => {
                    return Err(AppError::MissingColumn {
                        column: predicate.column().to_string(),
                        file: self.source().to_string(),
                    })
                }
                None => {}
            }
        }

        let mut out = self.clone_empty();
        for row in 0..self.len() {
            let keep = active
                .iter()
                .all(|(name, predicate)| predicate.matches(self.text(row, name)));
            if keep {
                out.push_row(self.clone_row(row));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(
            "<memory>",
            vec!["kernel".into(), "stride".into(), "misalign".into()],
        );
        table.push_row(vec!["dot".into(), "1".into(), "0".into()]);
        table.push_row(vec!["dot".into(), "2".into(), "1".into()]);
        table.push_row(vec!["mul".into(), "4".into(), "0.0".into()]);
        table.push_row(vec!["mul".into(), "16".into(), "0".into()]);
        table
    }

    #[test]
    fn equality_matches_numerically() {
        let out = sample()
            .filter(&[Predicate::equals("misalign", "0")], false)
            .unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn membership_filter() {
        let out = sample()
            .filter(&[Predicate::one_of("stride", &["1", "2", "4", "8"])], false)
            .unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn unknown_column_is_tolerated_by_default() {
        let out = sample()
            .filter(&[Predicate::equals("verified", "1")], false)
            .unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn unknown_column_errors_when_strict() {
        let err = sample()
            .filter(&[Predicate::equals("verified", "1")], true)
            .unwrap_err();
        assert!(matches!(err, AppError::MissingColumn { .. }));
    }

    #[test]
    fn filtering_is_idempotent() {
        let predicates = [Predicate::equals("kernel", "dot")];
        let once = sample().filter(&predicates, false).unwrap();
        let twice = once.filter(&predicates, false).unwrap();
        assert_eq!(once.len(), twice.len());
        for row in 0..once.len() {
            assert_eq!(once.text(row, "stride"), twice.text(row, "stride"));
        }
    }
}
