//! Row-level schema validation for loan records
//!
//! Converts one raw CSV row (header-positioned string fields) into a typed
//! [`LoanRow`]. Numeric parsing is strict: a malformed token is a validation
//! failure, never silently mangled into a number. [`ParseMode::Lenient`]
//! instead coerces unparseable numerics to 0.0 with a recorded warning; hard
//! range invariants reject the row in both modes.

use std::collections::HashMap;

use super::{DpdBucket, LoanRow};
use crate::error::{Result, Validated, ValidationError};

/// Required columns, in canonical order
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "loan_amount",
    "appraised_value",
    "borrower_income",
    "monthly_debt",
    "loan_status",
    "interest_rate",
    "principal_balance",
];

/// Optional columns recognized when present
pub const OPTIONAL_COLUMNS: [&str; 3] = ["dpd_status", "payments_scheduled", "payments_received"];

/// How numeric-parse failures are handled, uniformly across all fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Any unparseable numeric rejects the row (default)
    #[default]
    Strict,
    /// Unparseable numerics coerce to 0.0 with a warning
    Lenient,
}

/// One data row mapped by position against the header
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based line number in the source file (header is line 1)
    pub line: usize,
    fields: HashMap<String, String>,
}

impl RawRow {
    /// Build a raw row from canonical column names and their values
    pub fn new(line: usize, fields: HashMap<String, String>) -> Self {
        Self { line, fields }
    }

    /// Look up a field by canonical column name; empty strings read as absent
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Parse a required numeric field per the active mode
fn required_number(
    raw: &RawRow,
    field: &'static str,
    mode: ParseMode,
    warnings: &mut Vec<String>,
) -> Result<f64> {
    let token = raw.get(field).ok_or(ValidationError::Row {
        line: raw.line,
        reason: format!("missing required field '{field}'"),
    })?;

    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => match mode {
            ParseMode::Strict => Err(ValidationError::Field {
                line: raw.line,
                field,
                raw: token.to_string(),
            }),
            ParseMode::Lenient => {
                warnings.push(format!(
                    "row {}: unparseable '{field}' value '{token}' coerced to 0",
                    raw.line
                ));
                Ok(0.0)
            }
        },
    }
}

/// Parse an optional numeric field per the active mode
fn optional_number(
    raw: &RawRow,
    field: &'static str,
    mode: ParseMode,
    warnings: &mut Vec<String>,
) -> Result<Option<f64>> {
    let Some(token) = raw.get(field) else {
        return Ok(None);
    };

    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => match mode {
            ParseMode::Strict => Err(ValidationError::Field {
                line: raw.line,
                field,
                raw: token.to_string(),
            }),
            ParseMode::Lenient => {
                warnings.push(format!(
                    "row {}: unparseable '{field}' value '{token}' coerced to 0",
                    raw.line
                ));
                Ok(Some(0.0))
            }
        },
    }
}

/// Validate a single raw row into a typed [`LoanRow`]
///
/// Rejects on: missing required fields, non-finite numerics (strict mode),
/// `loan_amount <= 0`, `appraised_value <= 0`, negative income/debt/balance,
/// `interest_rate` outside [0, 100], empty `loan_status`. A missing
/// `dpd_status` is accepted with a warning; the row is excluded from
/// roll-rate views downstream.
pub fn validate_loan_row(raw: &RawRow, mode: ParseMode) -> Result<Validated<LoanRow>> {
    let mut warnings = Vec::new();

    let loan_amount = required_number(raw, "loan_amount", mode, &mut warnings)?;
    let appraised_value = required_number(raw, "appraised_value", mode, &mut warnings)?;
    let borrower_income = required_number(raw, "borrower_income", mode, &mut warnings)?;
    let monthly_debt = required_number(raw, "monthly_debt", mode, &mut warnings)?;
    let interest_rate = required_number(raw, "interest_rate", mode, &mut warnings)?;
    let principal_balance = required_number(raw, "principal_balance", mode, &mut warnings)?;

    let reject = |reason: String| -> ValidationError {
        ValidationError::Row {
            line: raw.line,
            reason,
        }
    };

    if loan_amount <= 0.0 {
        return Err(reject(format!("loan_amount must be positive, got {loan_amount}")));
    }
    if appraised_value <= 0.0 {
        return Err(reject(format!(
            "appraised_value must be positive, got {appraised_value}"
        )));
    }
    if borrower_income < 0.0 {
        return Err(reject(format!(
            "borrower_income must be non-negative, got {borrower_income}"
        )));
    }
    if monthly_debt < 0.0 {
        return Err(reject(format!(
            "monthly_debt must be non-negative, got {monthly_debt}"
        )));
    }
    if principal_balance < 0.0 {
        return Err(reject(format!(
            "principal_balance must be non-negative, got {principal_balance}"
        )));
    }
    if !(0.0..=100.0).contains(&interest_rate) {
        return Err(reject(format!(
            "interest_rate must be within [0, 100], got {interest_rate}"
        )));
    }

    let loan_status = raw
        .get("loan_status")
        .ok_or_else(|| reject("loan_status must be a non-empty string".to_string()))?
        .to_string();

    let dpd_status = match raw.get("dpd_status") {
        None => {
            warnings.push(format!(
                "row {}: missing dpd_status, excluded from roll-rate",
                raw.line
            ));
            None
        }
        Some(label) => match DpdBucket::from_label(label) {
            Some(bucket) => Some(bucket),
            None => match mode {
                ParseMode::Strict => {
                    return Err(reject(format!("unknown dpd_status bucket '{label}'")));
                }
                ParseMode::Lenient => {
                    warnings.push(format!(
                        "row {}: unknown dpd_status '{label}', excluded from roll-rate",
                        raw.line
                    ));
                    None
                }
            },
        },
    };

    let payments_scheduled = optional_number(raw, "payments_scheduled", mode, &mut warnings)?;
    let payments_received = optional_number(raw, "payments_received", mode, &mut warnings)?;

    Ok(Validated::with_warnings(
        LoanRow {
            loan_amount,
            appraised_value,
            borrower_income,
            monthly_debt,
            loan_status,
            interest_rate,
            principal_balance,
            dpd_status,
            payments_scheduled,
            payments_received,
        },
        warnings,
    ))
}
