//! Entity schema and invariants
//!
//! Every mutable field is an [`Lww`] register: a value paired with the
//! hybrid logical clock of the write that produced it. Merging a write
//! into a register succeeds iff the incoming clock is strictly newer,
//! which makes replay convergent regardless of delivery order.

use crate::clock::HybridLogicalClock;
use crate::error::{Error, Result};
use crate::ids::{AcctId, StmtId, TxnId, VndrId};
use crate::money::Cents;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Maximum length for names and descriptions
pub const MAX_TEXT_LEN: usize = 200;

/// Maximum length for account numbers
pub const MAX_ACCT_NUMBER_LEN: usize = 50;

/// Last-writer-wins register: a value and the clock that set it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lww<T> {
    value: T,
    clock: HybridLogicalClock,
}

impl<T> Lww<T> {
    /// Register holding `value` as of `clock`
    pub fn new(value: T, clock: HybridLogicalClock) -> Self {
        Self { value, clock }
    }

    /// Current value
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Clock of the write that produced the current value
    pub fn clock(&self) -> HybridLogicalClock {
        self.clock
    }

    /// Apply a write iff its clock is strictly newer than the stored
    /// clock. Returns whether the write was accepted; a stale write is
    /// a silent no-op.
    pub fn merge(&mut self, value: T, clock: HybridLogicalClock) -> bool {
        if clock > self.clock {
            self.value = value;
            self.clock = clock;
            true
        } else {
            false
        }
    }
}

/// Account classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Things owned (bank accounts, cash)
    Asset,
    /// Things owed (credit cards, loans)
    Liability,
    /// Net worth
    Equity,
    /// Money coming in
    Income,
    /// Money going out
    Expense,
}

impl AccountType {
    /// Balance increases with debits (ASSET, EXPENSE); otherwise the
    /// account is credit-normal
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }

    /// Stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "ASSET",
            AccountType::Liability => "LIABILITY",
            AccountType::Equity => "EQUITY",
            AccountType::Income => "INCOME",
            AccountType::Expense => "EXPENSE",
        }
    }

    /// Parse the stored string form
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ASSET" => Ok(AccountType::Asset),
            "LIABILITY" => Ok(AccountType::Liability),
            "EQUITY" => Ok(AccountType::Equity),
            "INCOME" => Ok(AccountType::Income),
            "EXPENSE" => Ok(AccountType::Expense),
            other => Err(Error::Validation(format!("unknown account type {:?}", other))),
        }
    }
}

/// Ledger account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier
    pub id: AcctId,
    /// Display name (unique among non-deleted accounts)
    pub name: Lww<String>,
    /// Institution account number
    pub number: Lww<Option<String>>,
    /// Classification
    pub kind: Lww<AccountType>,
    /// Free-form description
    pub description: Lww<Option<String>>,
    /// Soft-delete tombstone
    pub deleted: Lww<bool>,
}

impl Account {
    /// Construct a freshly created account with all field clocks set to
    /// the creating directive's clock
    pub fn create(
        id: AcctId,
        name: String,
        number: Option<String>,
        kind: AccountType,
        description: Option<String>,
        clock: HybridLogicalClock,
    ) -> Self {
        Self {
            id,
            name: Lww::new(name, clock),
            number: Lww::new(number, clock),
            kind: Lww::new(kind, clock),
            description: Lww::new(description, clock),
            deleted: Lww::new(false, clock),
        }
    }

    /// True if tombstoned
    pub fn is_deleted(&self) -> bool {
        *self.deleted.get()
    }
}

/// Vendor / payee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    /// Stable identifier
    pub id: VndrId,
    /// Display name (unique among non-deleted vendors)
    pub name: Lww<String>,
    /// Free-form description
    pub description: Lww<Option<String>>,
    /// Default posting account, referenced by account name
    pub default_account: Lww<Option<String>>,
    /// Active flag for pick-lists
    pub active: Lww<bool>,
    /// Soft-delete tombstone
    pub deleted: Lww<bool>,
}

impl Vendor {
    /// Construct a freshly created vendor
    pub fn create(
        id: VndrId,
        name: String,
        description: Option<String>,
        default_account: Option<String>,
        active: bool,
        clock: HybridLogicalClock,
    ) -> Self {
        Self {
            id,
            name: Lww::new(name, clock),
            description: Lww::new(description, clock),
            default_account: Lww::new(default_account, clock),
            active: Lww::new(active, clock),
            deleted: Lww::new(false, clock),
        }
    }

    /// True if tombstoned
    pub fn is_deleted(&self) -> bool {
        *self.deleted.get()
    }
}

/// One side of a double-entry posting
///
/// Exactly one of `debit`/`credit` is non-zero. Entries are ordered by
/// their position in the owning transaction's entry list and that order
/// is preserved for display and offset-account computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Posting account, referenced by account name
    pub account: String,
    /// Debit amount in cents (zero if this is a credit entry)
    #[serde(default)]
    pub debit: Cents,
    /// Credit amount in cents (zero if this is a debit entry)
    #[serde(default)]
    pub credit: Cents,
    /// Optional per-entry comment
    #[serde(default)]
    pub comment: Option<String>,
}

/// Double-entry transaction
///
/// Header fields merge per-field; the entry set is a value-type
/// collection replaced wholesale under a single clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable identifier
    pub id: TxnId,
    /// Transaction date (ISO calendar date, year >= 2000)
    pub date: Lww<NaiveDate>,
    /// Optional check number / code
    pub code: Lww<Option<String>>,
    /// Vendor, referenced by vendor name
    pub vendor: Lww<Option<String>>,
    /// Free-form description
    pub description: Lww<Option<String>>,
    /// Ordered entry set
    pub entries: Lww<Vec<Entry>>,
    /// Soft-delete tombstone
    pub deleted: Lww<bool>,
}

impl Transaction {
    /// Construct a freshly created transaction with its full entry set
    pub fn create(
        id: TxnId,
        date: NaiveDate,
        code: Option<String>,
        vendor: Option<String>,
        description: Option<String>,
        entries: Vec<Entry>,
        clock: HybridLogicalClock,
    ) -> Self {
        Self {
            id,
            date: Lww::new(date, clock),
            code: Lww::new(code, clock),
            vendor: Lww::new(vendor, clock),
            description: Lww::new(description, clock),
            entries: Lww::new(entries, clock),
            deleted: Lww::new(false, clock),
        }
    }

    /// True if tombstoned
    pub fn is_deleted(&self) -> bool {
        *self.deleted.get()
    }
}

/// Bank/credit statement used for reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Stable identifier
    pub id: StmtId,
    /// Statement account, referenced by account name
    pub account: Lww<String>,
    /// Period start
    pub begin_date: Lww<NaiveDate>,
    /// Period end
    pub end_date: Lww<NaiveDate>,
    /// Balance at period start
    pub beginning_balance: Lww<Cents>,
    /// Balance at period end
    pub ending_balance: Lww<Cents>,
    /// True once reconciliation is finished
    pub reconciled: Lww<bool>,
    /// Transactions covered by this statement
    pub transactions: Lww<Vec<TxnId>>,
    /// Soft-delete tombstone
    pub deleted: Lww<bool>,
}

impl Statement {
    /// Construct a freshly created statement
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: StmtId,
        account: String,
        begin_date: NaiveDate,
        end_date: NaiveDate,
        beginning_balance: Cents,
        ending_balance: Cents,
        reconciled: bool,
        transactions: Vec<TxnId>,
        clock: HybridLogicalClock,
    ) -> Self {
        Self {
            id,
            account: Lww::new(account, clock),
            begin_date: Lww::new(begin_date, clock),
            end_date: Lww::new(end_date, clock),
            beginning_balance: Lww::new(beginning_balance, clock),
            ending_balance: Lww::new(ending_balance, clock),
            reconciled: Lww::new(reconciled, clock),
            transactions: Lww::new(transactions, clock),
            deleted: Lww::new(false, clock),
        }
    }

    /// True if tombstoned
    pub fn is_deleted(&self) -> bool {
        *self.deleted.get()
    }
}

// Field validation rules. Directive validation funnels through these so
// the projection engine never sees an invariant-violating payload.

/// Names: non-empty, single line, bounded length
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("name must not be empty".to_string()));
    }
    validate_single_line("name", name)?;
    if name.chars().count() > MAX_TEXT_LEN {
        return Err(Error::Validation(format!(
            "name exceeds {} characters",
            MAX_TEXT_LEN
        )));
    }
    Ok(())
}

/// Descriptions and comments: single line, bounded length
pub fn validate_description(text: &str) -> Result<()> {
    validate_single_line("description", text)?;
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(Error::Validation(format!(
            "description exceeds {} characters",
            MAX_TEXT_LEN
        )));
    }
    Ok(())
}

/// Account numbers: alphanumeric, hyphen, or dollar sign, bounded length
pub fn validate_account_number(number: &str) -> Result<()> {
    if number.chars().count() > MAX_ACCT_NUMBER_LEN {
        return Err(Error::Validation(format!(
            "account number exceeds {} characters",
            MAX_ACCT_NUMBER_LEN
        )));
    }
    if !number
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '$')
    {
        return Err(Error::Validation(format!(
            "account number {:?} contains invalid characters",
            number
        )));
    }
    Ok(())
}

/// Transaction dates must fall in year 2000 or later
pub fn validate_date(date: NaiveDate) -> Result<()> {
    if date.year() < 2000 {
        return Err(Error::Validation(format!(
            "transaction date {} predates year 2000",
            date
        )));
    }
    Ok(())
}

/// Entry-set invariants: at least two entries, each one-sided with a
/// positive amount, and total debits equal total credits
pub fn validate_entries(entries: &[Entry]) -> Result<()> {
    if entries.len() < 2 {
        return Err(Error::Validation(
            "transaction requires at least two entries".to_string(),
        ));
    }

    let mut debits = Cents::ZERO;
    let mut credits = Cents::ZERO;
    for (i, entry) in entries.iter().enumerate() {
        if entry.account.trim().is_empty() {
            return Err(Error::Validation(format!(
                "entry {} has no account reference",
                i
            )));
        }
        if entry.debit.amount() < 0 || entry.credit.amount() < 0 {
            return Err(Error::Validation(format!(
                "entry {} has a negative amount",
                i
            )));
        }
        if entry.debit.is_zero() == entry.credit.is_zero() {
            return Err(Error::Validation(format!(
                "entry {} must have exactly one of debit/credit non-zero",
                i
            )));
        }
        if let Some(comment) = &entry.comment {
            validate_description(comment)?;
        }
        debits = debits
            .checked_add(entry.debit)
            .ok_or_else(|| Error::Validation("debit total overflow".to_string()))?;
        credits = credits
            .checked_add(entry.credit)
            .ok_or_else(|| Error::Validation("credit total overflow".to_string()))?;
    }

    if debits != credits {
        return Err(Error::Validation(format!(
            "transaction does not balance: debits {} != credits {}",
            debits, credits
        )));
    }
    Ok(())
}

fn validate_single_line(what: &str, text: &str) -> Result<()> {
    if text.contains('\n') || text.contains('\r') {
        return Err(Error::Validation(format!("{} must be a single line", what)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::NodeId;

    fn clock_at(counter: u16) -> HybridLogicalClock {
        HybridLogicalClock::from_parts(1000, counter, NodeId::parse("AAA").unwrap())
    }

    fn entry(account: &str, debit: i64, credit: i64) -> Entry {
        Entry {
            account: account.to_string(),
            debit: Cents(debit),
            credit: Cents(credit),
            comment: None,
        }
    }

    #[test]
    fn test_lww_accepts_newer_write() {
        let mut field = Lww::new("old".to_string(), clock_at(1));
        assert!(field.merge("new".to_string(), clock_at(2)));
        assert_eq!(field.get(), "new");
        assert_eq!(field.clock(), clock_at(2));
    }

    #[test]
    fn test_lww_discards_stale_and_equal_writes() {
        let mut field = Lww::new("kept".to_string(), clock_at(5));
        assert!(!field.merge("stale".to_string(), clock_at(4)));
        assert!(!field.merge("equal".to_string(), clock_at(5)));
        assert_eq!(field.get(), "kept");
        assert_eq!(field.clock(), clock_at(5));
    }

    #[test]
    fn test_account_type_normal_side() {
        assert!(AccountType::Asset.is_debit_normal());
        assert!(AccountType::Expense.is_debit_normal());
        assert!(!AccountType::Liability.is_debit_normal());
        assert!(!AccountType::Equity.is_debit_normal());
        assert!(!AccountType::Income.is_debit_normal());
    }

    #[test]
    fn test_validate_name_rules() {
        assert!(validate_name("Checking").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("  ").is_err());
        assert!(validate_name("two\nlines").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
        assert!(validate_name(&"x".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_account_number_rules() {
        assert!(validate_account_number("12-34$AB").is_ok());
        assert!(validate_account_number("has space").is_err());
        assert!(validate_account_number(&"9".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_date_floor() {
        assert!(validate_date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()).is_ok());
        assert!(validate_date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()).is_err());
    }

    #[test]
    fn test_entries_must_balance() {
        let ok = vec![entry("Checking", 10_000, 0), entry("Salary", 0, 10_000)];
        assert!(validate_entries(&ok).is_ok());

        let unbalanced = vec![entry("Checking", 10_000, 0), entry("Salary", 0, 9_999)];
        assert!(validate_entries(&unbalanced).is_err());
    }

    #[test]
    fn test_entries_need_two_and_one_side() {
        assert!(validate_entries(&[entry("Checking", 100, 0)]).is_err());

        let both_sides = vec![entry("Checking", 100, 100), entry("Salary", 0, 0)];
        assert!(validate_entries(&both_sides).is_err());

        let zero_entry = vec![entry("Checking", 0, 0), entry("Salary", 0, 0)];
        assert!(validate_entries(&zero_entry).is_err());
    }

    #[test]
    fn test_split_entries_balance() {
        let split = vec![
            entry("Checking", 0, 15_000),
            entry("Groceries", 9_000, 0),
            entry("Household", 6_000, 0),
        ];
        assert!(validate_entries(&split).is_ok());
    }
}
