use thiserror::Error;

/// A row the date normalizer could not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based position in the input batch.
    pub row: usize,
    pub value: String,
}

impl std::fmt::Display for RejectedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {} ({:?})", self.row, self.value)
    }
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error(
        "no date format could parse every row (tried {}); rejected {}",
        attempted.join(", "),
        rows.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    Parse {
        attempted: Vec<String>,
        rows: Vec<RejectedRow>,
    },

    #[error("record source {source_name} is unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to render workbook: {0}")]
    Render(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<rust_xlsxwriter::XlsxError> for AnalyzerError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AnalyzerError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
