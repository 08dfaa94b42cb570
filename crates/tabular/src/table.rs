use std::fs;
use std::path::Path;

use shared::{AppError, AppResult};

/// A table of named columns with every cell kept as text.
#[derive(Debug, Clone)]
pub struct Table {
    source: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(source: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            source: source.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Read a UTF-8 delimited file with a header row.
    ///
    /// Short records are padded with empty cells so every row has one cell
    /// per column; the extra cells coerce to missing values downstream.
    pub fn from_csv_path(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::MissingInput(path.to_path_buf()));
        }
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|err| AppError::Message(format!("failed to open {path:?}: {err}")))?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(|err| AppError::Message(format!("failed to read header of {path:?}: {err}")))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut table = Table::new(path.display().to_string(), columns);
        for record in reader.records() {
            let record = record
                .map_err(|err| AppError::Message(format!("failed to parse {path:?}: {err}")))?;
            let mut row: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
            row.resize(table.columns.len(), String::new());
            table.rows.push(row);
        }
        Ok(table)
    }

    pub fn write_csv(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| AppError::Message(format!("failed to create directory for {path:?}: {err}")))?;
        }
        let mut writer = csv::Writer::from_path(path)
            .map_err(|err| AppError::Message(format!("failed to create {path:?}: {err}")))?;
        writer
            .write_record(&self.columns)
            .map_err(|err| AppError::Message(format!("failed to write header to {path:?}: {err}")))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|err| AppError::Message(format!("failed to write row to {path:?}: {err}")))?;
        }
        writer
            .flush()
            .map_err(|err| AppError::Message(format!("failed to flush {path:?}: {err}")))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Index of a column by name: exact match first, then case-insensitive.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        if let Some(idx) = self.columns.iter().position(|c| c == name) {
            return Some(idx);
        }
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Resolve a canonical field against an ordered candidate list.
    ///
    /// Each candidate is tried exactly, then case-insensitively; the first
    /// hit wins. Returns the actual header name, which stays valid across
    /// filtering.
    pub fn resolve(&self, candidates: &[&str]) -> Option<&str> {
        for candidate in candidates {
            if let Some(idx) = self.column_index(candidate) {
                return Some(&self.columns[idx]);
            }
        }
        None
    }

    /// Like [`Table::resolve`] but failure is a `MissingColumn` error naming
    /// the canonical field and the source file.
    pub fn require(&self, candidates: &[&str]) -> AppResult<&str> {
        self.resolve(candidates).ok_or_else(|| AppError::MissingColumn {
            column: candidates.first().copied().unwrap_or_default().to_string(),
            file: self.source.clone(),
        })
    }

    pub fn text(&self, row: usize, column: &str) -> &str {
        match self.column_index(column) {
            Some(idx) => self.rows[row][idx].as_str(),
            None => "",
        }
    }

    /// Numeric view of a cell; unparseable or empty cells are missing.
    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        let cell = self.text(row, column).trim();
        if cell.is_empty() {
            return None;
        }
        cell.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Append a computed column. Values must match the current row count;
    /// missing values are passed as `None` and stored as empty cells.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> AppResult<()> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(AppError::Message(format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(match value {
                Some(v) => format_number(v),
                None => String::new(),
            });
        }
        Ok(())
    }

    /// Append a text-valued column.
    pub fn add_text_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<String>,
    ) -> AppResult<()> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(AppError::Message(format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Project onto a subset of columns, renaming each to a canonical name.
    pub fn select_as(&self, mapping: &[(&str, &str)]) -> AppResult<Table> {
        let mut indices = Vec::with_capacity(mapping.len());
        let mut names = Vec::with_capacity(mapping.len());
        for (actual, canonical) in mapping {
            let idx = self.column_index(actual).ok_or_else(|| AppError::MissingColumn {
                column: (*actual).to_string(),
                file: self.source.clone(),
            })?;
            indices.push(idx);
            names.push((*canonical).to_string());
        }
        let mut out = Table::new(self.source.clone(), names);
        for row in &self.rows {
            out.rows.push(indices.iter().map(|&i| row[i].clone()).collect());
        }
        Ok(out)
    }

    /// Drop rows where any of the named columns fails numeric coercion.
    pub fn drop_missing(&self, columns: &[&str]) -> Table {
        let mut out = Table::new(self.source.clone(), self.columns.clone());
        for row in 0..self.rows.len() {
            if columns.iter().all(|c| self.number(row, c).is_some()) {
                out.rows.push(self.rows[row].clone());
            }
        }
        out
    }

    pub(crate) fn clone_empty(&self) -> Table {
        Table::new(self.source.clone(), self.columns.clone())
    }

    pub(crate) fn clone_row(&self, row: usize) -> Vec<String> {
        self.rows[row].clone()
    }
}

/// Format a numeric cell so that parsing it back yields the same value.
pub(crate) fn format_number(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write csv");
        file
    }

    #[test]
    fn load_resolves_synonyms_case_insensitively() {
        let file = write_temp_csv("kernel,dtype,Gflops,CPE\nsaxpy,f32,12.5,0.8\n");
        let table = Table::from_csv_path(file.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve(crate::GFLOPS), Some("Gflops"));
        assert_eq!(table.resolve(crate::CPE), Some("CPE"));
        assert_eq!(table.number(0, "gflops"), Some(12.5));
    }

    #[test]
    fn require_reports_missing_column() {
        let file = write_temp_csv("kernel,dtype\nsaxpy,f32\n");
        let table = Table::from_csv_path(file.path()).unwrap();
        let err = table.require(crate::GFLOPS).unwrap_err();
        assert!(err.to_string().contains("gflops"));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = Table::from_csv_path(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, AppError::MissingInput(_)));
    }

    #[test]
    fn unparseable_cells_become_missing() {
        let file = write_temp_csv("n,gflops\n1024,not-a-number\n2048,3.5\n4096,\n");
        let table = Table::from_csv_path(file.path()).unwrap();
        assert_eq!(table.number(0, "gflops"), None);
        assert_eq!(table.number(1, "gflops"), Some(3.5));
        assert_eq!(table.number(2, "gflops"), None);
    }

    #[test]
    fn add_column_round_trips_values() {
        let file = write_temp_csv("n\n1\n2\n");
        let mut table = Table::from_csv_path(file.path()).unwrap();
        table
            .add_column("ratio", vec![Some(0.1666666666666666), None])
            .unwrap();
        assert_eq!(table.number(0, "ratio"), Some(0.1666666666666666));
        assert_eq!(table.number(1, "ratio"), None);
    }

    #[test]
    fn select_as_renames_and_projects() {
        let file = write_temp_csv("Kernel,Gflops,junk\ndot,2.0,x\n");
        let table = Table::from_csv_path(file.path()).unwrap();
        let out = table
            .select_as(&[("Kernel", "kernel"), ("Gflops", "gflops")])
            .unwrap();
        assert_eq!(out.columns(), ["kernel", "gflops"]);
        assert_eq!(out.text(0, "kernel"), "dot");
    }

    #[test]
    fn drop_missing_removes_bad_rows() {
        let file = write_temp_csv("a,b\n1,2\nx,3\n4,\n");
        let table = Table::from_csv_path(file.path()).unwrap();
        let out = table.drop_missing(&["a", "b"]);
        assert_eq!(out.len(), 1);
        assert_eq!(out.number(0, "a"), Some(1.0));
    }
}
