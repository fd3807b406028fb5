//! Tally Reports
//!
//! Read-side companion to `tally-core`: balance sheet, income
//! statement, account register and transaction detail views computed
//! from the converged ledger snapshot. Reports are pure queries; they
//! never write and never look at clocks.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod engine;
pub mod error;
pub mod types;

// Re-exports
pub use engine::ReportEngine;
pub use error::{Error, Result};
pub use types::{
    AccountPostings, AccountRegister, BalanceSheet, EntryDetail, IncomeStatement,
    IncomeStatementDetails, PostingLine, ReconciliationStatus, RegisterRow, ReportLine,
    TransactionDetail, SPLIT_MARKER,
};
