//! Report DTOs
//!
//! Pure read-model values built by the reporting engine. Amounts
//! serialize in the external dollar form (e.g. `($1,234.56)`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_core::{AccountType, Cents, TxnId};

/// Offset-account marker for entries whose transaction touches more
/// than one other account
pub const SPLIT_MARKER: &str = "-- Split --";

/// One account line on a balance sheet or income statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    /// Account display name
    pub account: String,
    /// Normalized amount (sign follows the section's normal side)
    pub amount: Cents,
}

/// Balance sheet as of a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// Report cut-off date (inclusive)
    pub as_of: NaiveDate,
    /// Asset lines, account name ascending
    pub assets: Vec<ReportLine>,
    /// Liability lines, account name ascending
    pub liabilities: Vec<ReportLine>,
    /// Synthetic equity lines (a single "Net Worth" entry)
    pub equity: Vec<ReportLine>,
    /// Sum of asset lines
    pub total_assets: Cents,
    /// Sum of liability lines
    pub total_liabilities: Cents,
    /// Sum of equity lines; equals `total_assets - total_liabilities`
    pub total_equity: Cents,
}

/// Income statement over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    /// Range start (inclusive)
    pub start: NaiveDate,
    /// Range end (inclusive)
    pub end: NaiveDate,
    /// Income lines, account name ascending
    pub income: Vec<ReportLine>,
    /// Expense lines, account name ascending
    pub expenses: Vec<ReportLine>,
    /// Sum of income lines
    pub total_income: Cents,
    /// Sum of expense lines
    pub total_expenses: Cents,
    /// `total_income - total_expenses`
    pub net_income: Cents,
}

/// One raw posting nested under an account in the detailed income
/// statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingLine {
    /// Transaction date
    pub date: NaiveDate,
    /// Transaction vendor, if any
    pub vendor: Option<String>,
    /// Transaction description, if any
    pub description: Option<String>,
    /// Signed amount on the account's normal side
    pub amount: Cents,
}

/// Per-account posting group in the detailed income statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPostings {
    /// Account display name
    pub account: String,
    /// Account classification
    pub kind: AccountType,
    /// Normalized account total
    pub amount: Cents,
    /// Postings in transaction-date order
    pub postings: Vec<PostingLine>,
}

/// Income statement with raw postings grouped per account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatementDetails {
    /// Range start (inclusive)
    pub start: NaiveDate,
    /// Range end (inclusive)
    pub end: NaiveDate,
    /// Account groups, account name ascending
    pub accounts: Vec<AccountPostings>,
    /// Sum of income account totals
    pub total_income: Cents,
    /// Sum of expense account totals
    pub total_expenses: Cents,
    /// `total_income - total_expenses`
    pub net_income: Cents,
}

/// One row of an account register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRow {
    /// Owning transaction
    pub txn_id: TxnId,
    /// Transaction date
    pub date: NaiveDate,
    /// Transaction code, if any
    pub code: Option<String>,
    /// Transaction vendor, if any
    pub vendor: Option<String>,
    /// Transaction description, if any
    pub description: Option<String>,
    /// Entry comment, if any
    pub comment: Option<String>,
    /// Debit amount (zero for credit entries)
    pub debit: Cents,
    /// Credit amount (zero for debit entries)
    pub credit: Cents,
    /// Historical running balance at this row, accumulated in
    /// chronological order even though rows are returned newest-first
    pub balance: Cents,
    /// The other account on the transaction, [`SPLIT_MARKER`] when
    /// there are several, empty when there are none
    pub offset_account: String,
}

/// Register for one account, rows most-recent-first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRegister {
    /// Account display name
    pub account: String,
    /// Account classification (decides the balance's normal side)
    pub kind: AccountType,
    /// Register rows, reverse-chronological
    pub rows: Vec<RegisterRow>,
}

/// Reconciliation state derived from statement linkage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationStatus {
    /// Linked to a reconciled statement
    Reconciled,
    /// Linked to a statement that is not yet reconciled
    Pending,
}

/// One entry in a transaction detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDetail {
    /// Posting account name
    pub account: String,
    /// Debit amount (zero for credit entries)
    pub debit: Cents,
    /// Credit amount (zero for debit entries)
    pub credit: Cents,
    /// Entry comment, if any
    pub comment: Option<String>,
    /// Derived reconciliation status, absent without statement linkage
    pub status: Option<ReconciliationStatus>,
}

/// Single transaction with its ordered entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
    /// Transaction id
    pub id: TxnId,
    /// Transaction date
    pub date: NaiveDate,
    /// Transaction code, if any
    pub code: Option<String>,
    /// Transaction vendor, if any
    pub vendor: Option<String>,
    /// Transaction description, if any
    pub description: Option<String>,
    /// Entries in original order
    pub entries: Vec<EntryDetail>,
}
