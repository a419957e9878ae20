//! Error taxonomy and the warning-carrying success wrapper
//!
//! Input rejection (oversized CSV, missing header, too few columns) and
//! row-level invalidity surface as [`ValidationError`]. Calculation
//! degeneracies never appear here: a zero denominator produces a zero-valued
//! KPI with diagnostic components, not an error.

use thiserror::Error;

/// Errors raised by ingestion, validation, and export
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Input exceeds the ingest size cap
    #[error("CSV file exceeds maximum size: {size} bytes (limit {limit})")]
    CsvTooLarge { size: usize, limit: usize },

    /// Input is empty or whitespace-only
    #[error("CSV input is empty")]
    EmptyInput,

    /// No header row could be read
    #[error("CSV input has no header row")]
    MissingHeader,

    /// Header has fewer columns than the loan schema requires
    #[error("CSV header has {found} columns, at least {required} required")]
    TooFewColumns { found: usize, required: usize },

    /// A required column is absent from the header
    #[error("CSV header is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    /// A data row failed schema validation (strict mode aborts on this)
    #[error("row {line}: {reason}")]
    Row { line: usize, reason: String },

    /// A single field could not be parsed into its expected type
    #[error("row {line}: cannot parse field '{field}' from value '{raw}'")]
    Field {
        line: usize,
        field: &'static str,
        raw: String,
    },

    /// Underlying CSV tokenizer error (malformed quoting, IO)
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failure during export
    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    /// File-level IO when loading a portfolio from disk
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ValidationError>;

/// A successful outcome that may still carry warnings
///
/// Warnings accumulate across pipeline stages (dropped rows, empty views,
/// missing optional data) without failing the run.
#[derive(Debug, Clone)]
pub struct Validated<T> {
    /// The validated value
    pub data: T,

    /// Human-readable, non-fatal diagnostics
    pub warnings: Vec<String>,
}

impl<T> Validated<T> {
    /// Wrap a value with no warnings
    pub fn new(data: T) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    /// Wrap a value with accumulated warnings
    pub fn with_warnings(data: T, warnings: Vec<String>) -> Self {
        Self { data, warnings }
    }

    /// Map the inner value, keeping warnings
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Validated<U> {
        Validated {
            data: f(self.data),
            warnings: self.warnings,
        }
    }
}
