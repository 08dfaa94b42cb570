use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Message(String),
    #[error("missing input file: {0}")]
    MissingInput(PathBuf),
    #[error("column '{column}' not found in {file}")]
    MissingColumn { column: String, file: String },
}

pub type AppResult<T> = Result<T, AppError>;
