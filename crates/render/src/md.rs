//! Markdown building blocks: pipe tables, fixed-precision and
//! explicitly-signed numeric cells, and the generation stamp.

use chrono::{SecondsFormat, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Render a pipe table: header row, separator row, one row per record.
pub fn table(headers: &[&str], aligns: &[Align], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&headers.join(" | "));
    out.push_str(" |\n|");
    for (idx, _) in headers.iter().enumerate() {
        match aligns.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => out.push_str("---|"),
            Align::Right => out.push_str("---:|"),
        }
    }
    out.push('\n');
    for row in rows {
        out.push_str("| ");
        out.push_str(&row.join(" | "));
        out.push_str(" |\n");
    }
    out
}

/// Fixed-precision cell; an undefined statistic renders as an empty cell.
pub fn fixed(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => String::new(),
    }
}

/// Fixed-precision cell with a custom placeholder for undefined values
/// (some reports render `nan` rather than an empty cell).
pub fn fixed_or(value: Option<f64>, precision: usize, placeholder: &str) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => placeholder.to_string(),
    }
}

/// Percentage-delta cell with an explicit sign; empty when undefined.
pub fn signed(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:+.precision$}"),
        None => String::new(),
    }
}

/// Integer sample-count cell.
pub fn count(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}", v.round() as i64),
        None => String::new(),
    }
}

/// RFC 3339 generation stamp for report headers.
pub fn generated_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_renders_header_separator_and_rows() {
        let rendered = table(
            &["kernel", "delta"],
            &[Align::Left, Align::Right],
            &[vec!["dot".to_string(), "+1.50".to_string()]],
        );
        assert_eq!(rendered, "| kernel | delta |\n|---|---:|\n| dot | +1.50 |\n");
    }

    #[test]
    fn signed_cells_carry_an_explicit_sign() {
        assert_eq!(signed(Some(10.0), 2), "+10.00");
        assert_eq!(signed(Some(-3.14159), 2), "-3.14");
        assert_eq!(signed(None, 2), "");
    }

    #[test]
    fn undefined_cells_render_empty_or_placeholder() {
        assert_eq!(fixed(None, 3), "");
        assert_eq!(fixed_or(None, 3, "nan"), "nan");
        assert_eq!(fixed(Some(2.0), 3), "2.000");
    }

    #[test]
    fn counts_round_to_integers() {
        assert_eq!(count(Some(10.0)), "10");
        assert_eq!(count(None), "");
    }
}
