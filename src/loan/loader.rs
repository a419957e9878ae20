//! CSV ingestion for portfolio uploads
//!
//! Two-stage contract: [`validate_csv_input`] gates the raw text (size cap,
//! header presence, minimum column count) and tokenizes it with a quote-aware
//! reader; [`parse_loan_csv`] maps each record by position against the header
//! and hands it to the row validator. Input-gate violations always abort the
//! whole ingest; row-level failures follow the configured [`ParseMode`].
//!
//! ## Column contract (case-insensitive, order-independent)
//!
//! | Column               | Type / example | Notes                          |
//! |----------------------|----------------|--------------------------------|
//! | `loan_amount`        | `10000`        | > 0                            |
//! | `appraised_value`    | `20000`        | > 0                            |
//! | `borrower_income`    | `5000`         | >= 0                           |
//! | `monthly_debt`       | `1000`         | >= 0                           |
//! | `loan_status`        | `current`      | non-empty                      |
//! | `interest_rate`      | `5.5`          | [0, 100]                       |
//! | `principal_balance`  | `9500`         | >= 0                           |
//! | `dpd_status`         | `0-7`          | optional delinquency bucket    |
//! | `payments_scheduled` | `500`          | optional, collection rate      |
//! | `payments_received`  | `450`          | optional, collection rate      |
//!
//! Unrecognized extra columns are ignored.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};

use super::validate::{validate_loan_row, ParseMode, RawRow, REQUIRED_COLUMNS};
use super::LoanRow;
use crate::error::{Result, Validated, ValidationError};

/// Maximum accepted input size (50 MB)
pub const MAX_CSV_BYTES: usize = 50 * 1024 * 1024;

/// Minimum number of header columns
pub const MIN_COLUMNS: usize = 7;

/// Ingest configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Row-failure policy; strict aborts the ingest on the first invalid row
    pub mode: ParseMode,
}

/// Tokenized CSV input that passed the input gates
#[derive(Debug, Clone)]
pub struct CsvInput {
    /// Lowercased, trimmed header names in file order
    pub header: Vec<String>,
    /// Data records with their 1-based source line numbers
    pub records: Vec<(usize, Vec<String>)>,
}

impl CsvInput {
    /// Number of header columns
    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

/// Gate and tokenize raw CSV text
///
/// Rejects inputs over [`MAX_CSV_BYTES`], empty inputs, missing headers, and
/// headers with fewer than [`MIN_COLUMNS`] columns or without every required
/// loan column. Tokenization is quote-aware: embedded commas, quotes, and
/// newlines inside quoted fields are handled per RFC 4180.
pub fn validate_csv_input(content: &str) -> Result<Validated<CsvInput>> {
    if content.len() > MAX_CSV_BYTES {
        return Err(ValidationError::CsvTooLarge {
            size: content.len(),
            limit: MAX_CSV_BYTES,
        });
    }
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(|_| ValidationError::MissingHeader)?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    if header.is_empty() || header.iter().all(|h| h.is_empty()) {
        return Err(ValidationError::MissingHeader);
    }
    if header.len() < MIN_COLUMNS {
        return Err(ValidationError::TooFewColumns {
            found: header.len(),
            required: MIN_COLUMNS,
        });
    }
    for column in REQUIRED_COLUMNS {
        if !header.iter().any(|h| h == column) {
            return Err(ValidationError::MissingColumn { column });
        }
    }

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        records.push((line, record.iter().map(|f| f.to_string()).collect()));
    }

    let mut warnings = Vec::new();
    if records.is_empty() {
        warnings.push("CSV contains a header but no data rows".to_string());
    }
    debug!(
        "validated CSV input: {} columns, {} data rows",
        header.len(),
        records.len()
    );

    Ok(Validated::with_warnings(CsvInput { header, records }, warnings))
}

/// Parse gated CSV input into validated loan rows
///
/// Strict mode propagates the first invalid row as an error carrying its
/// line number. Lenient mode drops invalid rows, records one warning per
/// dropped row, and keeps going.
pub fn parse_loan_csv(input: &CsvInput, opts: &IngestOptions) -> Result<Validated<Vec<LoanRow>>> {
    let mut rows = Vec::with_capacity(input.records.len());
    let mut warnings = Vec::new();

    for (line, fields) in &input.records {
        let mut mapped: HashMap<String, String> = HashMap::new();
        for (idx, value) in fields.iter().enumerate() {
            if let Some(name) = input.header.get(idx) {
                mapped.insert(name.clone(), value.clone());
            }
        }
        let raw = RawRow::new(*line, mapped);

        match validate_loan_row(&raw, opts.mode) {
            Ok(validated) => {
                warnings.extend(validated.warnings);
                rows.push(validated.data);
            }
            Err(err) => match opts.mode {
                ParseMode::Strict => return Err(err),
                ParseMode::Lenient => {
                    warn!("dropping invalid row: {err}");
                    warnings.push(format!("dropped invalid row: {err}"));
                }
            },
        }
    }

    Ok(Validated::with_warnings(rows, warnings))
}

/// Run both ingest stages over in-memory CSV text
pub fn ingest_csv(content: &str, opts: &IngestOptions) -> Result<Validated<Vec<LoanRow>>> {
    let input = validate_csv_input(content)?;
    let mut parsed = parse_loan_csv(&input.data, opts)?;
    let mut warnings = input.warnings;
    warnings.append(&mut parsed.warnings);
    Ok(Validated::with_warnings(parsed.data, warnings))
}

/// Load a portfolio from a CSV file on disk
pub fn load_portfolio<P: AsRef<Path>>(path: P, opts: &IngestOptions) -> Result<Validated<Vec<LoanRow>>> {
    let content = std::fs::read_to_string(path)?;
    ingest_csv(&content, opts)
}

/// Load a portfolio from any reader (e.g., string buffer, upload stream)
pub fn load_portfolio_from_reader<R: Read>(
    mut reader: R,
    opts: &IngestOptions,
) -> Result<Validated<Vec<LoanRow>>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    ingest_csv(&content, opts)
}
