//! Loan record structures matching the portfolio upload format

use serde::{Deserialize, Serialize};

/// Delinquency bucket by days past due
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DpdBucket {
    /// [0, 7) days past due
    Current,
    /// [7, 30) days past due
    Late7,
    /// [30, 60) days past due
    Late30,
    /// [60, 90) days past due
    Late60,
    /// 90+ days past due
    Late90Plus,
}

impl DpdBucket {
    /// All buckets in canonical delinquency order
    pub const ALL: [DpdBucket; 5] = [
        DpdBucket::Current,
        DpdBucket::Late7,
        DpdBucket::Late30,
        DpdBucket::Late60,
        DpdBucket::Late90Plus,
    ];

    /// Parse the bucket label used in upload files
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "0-7" => Some(DpdBucket::Current),
            "7-30" => Some(DpdBucket::Late7),
            "30-60" => Some(DpdBucket::Late30),
            "60-90" => Some(DpdBucket::Late60),
            "90+" => Some(DpdBucket::Late90Plus),
            _ => None,
        }
    }

    /// Get the string representation matching the upload format
    pub fn as_str(&self) -> &'static str {
        match self {
            DpdBucket::Current => "0-7",
            DpdBucket::Late7 => "7-30",
            DpdBucket::Late30 => "30-60",
            DpdBucket::Late60 => "60-90",
            DpdBucket::Late90Plus => "90+",
        }
    }

    /// Whether this bucket is at least 30 days past due
    pub fn is_past_due_30(&self) -> bool {
        matches!(
            self,
            DpdBucket::Late30 | DpdBucket::Late60 | DpdBucket::Late90Plus
        )
    }

    /// Whether this bucket is at least 90 days past due
    pub fn is_past_due_90(&self) -> bool {
        matches!(self, DpdBucket::Late90Plus)
    }
}

/// A single loan record from a portfolio upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRow {
    /// Original loan amount (must be positive)
    pub loan_amount: f64,

    /// Appraised collateral value (must be positive)
    pub appraised_value: f64,

    /// Borrower annual income (non-negative)
    pub borrower_income: f64,

    /// Borrower monthly debt service (non-negative)
    pub monthly_debt: f64,

    /// Servicing status label, e.g. "current", "default"
    pub loan_status: String,

    /// Annual interest rate in percent, within [0, 100]
    pub interest_rate: f64,

    /// Outstanding principal balance (non-negative)
    pub principal_balance: f64,

    /// Delinquency bucket; absent rows are excluded from roll-rate views
    #[serde(default)]
    pub dpd_status: Option<DpdBucket>,

    /// Payments scheduled over the reporting period (collection rate input)
    #[serde(default)]
    pub payments_scheduled: Option<f64>,

    /// Payments received over the reporting period (collection rate input)
    #[serde(default)]
    pub payments_received: Option<f64>,
}

impl LoanRow {
    /// Loan-to-value ratio; 0 when appraised value is zero
    pub fn ltv(&self) -> f64 {
        if self.appraised_value <= 0.0 {
            0.0
        } else {
            self.loan_amount / self.appraised_value
        }
    }

    /// Debt-to-income ratio on monthly figures; 0 when income is zero
    pub fn dti(&self) -> f64 {
        let monthly_income = self.borrower_income / 12.0;
        if monthly_income <= 0.0 {
            0.0
        } else {
            self.monthly_debt / monthly_income
        }
    }

    /// Whether the row carries both payment fields for collection-rate math
    pub fn has_payment_data(&self) -> bool {
        self.payments_scheduled.is_some() && self.payments_received.is_some()
    }
}

/// Aggregate totals over a set of loan rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub row_count: usize,
    pub total_loan_amount: f64,
    pub total_principal_balance: f64,
    pub overdue_30_balance: f64,
    pub overdue_90_balance: f64,
    pub average_interest_rate: f64,
}

impl PortfolioSummary {
    /// Compute totals in one pass over the rows
    pub fn from_rows(rows: &[LoanRow]) -> Self {
        let mut total_loan_amount = 0.0;
        let mut total_principal_balance = 0.0;
        let mut overdue_30_balance = 0.0;
        let mut overdue_90_balance = 0.0;
        let mut rate_sum = 0.0;

        for row in rows {
            total_loan_amount += row.loan_amount;
            total_principal_balance += row.principal_balance;
            rate_sum += row.interest_rate;

            if let Some(bucket) = row.dpd_status {
                if bucket.is_past_due_30() {
                    overdue_30_balance += row.principal_balance;
                }
                if bucket.is_past_due_90() {
                    overdue_90_balance += row.principal_balance;
                }
            }
        }

        let average_interest_rate = if rows.is_empty() {
            0.0
        } else {
            rate_sum / rows.len() as f64
        };

        Self {
            row_count: rows.len(),
            total_loan_amount,
            total_principal_balance,
            overdue_30_balance,
            overdue_90_balance,
            average_interest_rate,
        }
    }
}
