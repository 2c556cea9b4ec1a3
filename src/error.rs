use std::path::PathBuf;

/// Errors produced while loading data, building charts and writing exports.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Data file '{}' not found", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Field '{field}' not found")]
    FieldNotFound { field: String },

    #[error("Failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid field shorthand '{0}' (expected 'Field', 'Field:O', 'Field:N' or 'Field:Q')")]
    InvalidShorthand(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Variable '${0}' not defined")]
    UndefinedVariable(String),

    #[error("Unsupported export format for '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to render chart: {0}")]
    Render(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChartError {
    pub(crate) fn field_not_found(field: impl Into<String>) -> Self {
        ChartError::FieldNotFound {
            field: field.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ChartError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ChartError> = std::result::Result<T, E>;
