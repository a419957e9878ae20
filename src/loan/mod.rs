//! Loan record structures, row validation, and CSV ingestion

mod data;
pub mod loader;
pub mod validate;

pub use data::{DpdBucket, LoanRow, PortfolioSummary};
pub use loader::{ingest_csv, load_portfolio, load_portfolio_from_reader, IngestOptions};
pub use validate::{validate_loan_row, ParseMode, RawRow};
