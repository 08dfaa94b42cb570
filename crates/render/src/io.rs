use std::fs;
use std::path::Path;

use serde::Serialize;
use shared::{AppError, AppResult};
use stats::Summary;
use tabular::Table;

/// Write text output, creating parent directories as needed.
pub fn write_text(path: &Path, contents: &str) -> AppResult<()> {
    ensure_parent(path)?;
    fs::write(path, contents)
        .map_err(|err| AppError::Message(format!("failed to write {path:?}: {err}")))
}

/// Serialise a report structure as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Message(format!("failed to serialise report: {err}")))?;
    write_text(path, &json)
}

/// Write a summary as a delimited table: header row, then one row per
/// group; undefined statistics become empty fields.
pub fn write_summary_csv(path: &Path, summary: &Summary) -> AppResult<()> {
    summary.to_table().write_csv(path)
}

pub fn write_table_csv(path: &Path, table: &Table) -> AppResult<()> {
    table.write_csv(path)
}

fn ensure_parent(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                AppError::Message(format!("failed to create directory for {path:?}: {err}"))
            })?;
        }
    }
    Ok(())
}
