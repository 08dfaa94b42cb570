mod error;

use std::sync::OnceLock;

use tracing_subscriber::{fmt, EnvFilter};

pub use crate::error::{AppError, AppResult};

static TRACING_GUARD: OnceLock<()> = OnceLock::new();

/// Initialise the global tracing subscriber with sensible defaults.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    TRACING_GUARD.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt().with_env_filter(filter).try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_display() {
        let err = AppError::MissingColumn {
            column: "gflops".to_string(),
            file: "data/simd.csv".to_string(),
        };
        assert_eq!(err.to_string(), "column 'gflops' not found in data/simd.csv");
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
