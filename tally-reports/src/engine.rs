//! Read-only report queries over the ledger snapshot
//!
//! Reports never consult clocks; they see only the converged values.
//! Tombstoned accounts and transactions are invisible everywhere, and
//! every aggregate is normalized to its section's normal side so that
//! healthy balances print positive.

use chrono::NaiveDate;
use rusqlite::params;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tally_core::{storage, AccountType, AcctId, Cents, Store, TxnId};

use crate::error::{Error, Result};
use crate::types::{
    AccountPostings, AccountRegister, BalanceSheet, EntryDetail, IncomeStatement,
    IncomeStatementDetails, PostingLine, ReconciliationStatus, RegisterRow, ReportLine,
    TransactionDetail, SPLIT_MARKER,
};

/// Reporting facade over a shared snapshot store
#[derive(Debug, Clone)]
pub struct ReportEngine {
    store: Arc<Store>,
}

impl ReportEngine {
    /// Create an engine over an existing snapshot
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Balance sheet as of `as_of` (inclusive). Assets and liabilities
    /// come from posted entries; equity is the single derived line
    /// `Net Worth = assets - liabilities`, which makes the accounting
    /// identity hold by construction.
    pub fn balance_sheet(&self, as_of: NaiveDate) -> Result<BalanceSheet> {
        let balances = self.store.transaction(|tx| {
            net_debits_by_account(
                tx,
                AccountType::Asset,
                AccountType::Liability,
                None,
                as_of,
            )
        })?;

        let mut assets = Vec::new();
        let mut liabilities = Vec::new();
        let mut total_assets = Cents::ZERO;
        let mut total_liabilities = Cents::ZERO;
        for (account, (kind, net_debit)) in balances {
            match kind {
                AccountType::Asset => {
                    total_assets = checked_total(total_assets.checked_add(net_debit))?;
                    assets.push(ReportLine {
                        account,
                        amount: net_debit,
                    });
                }
                AccountType::Liability => {
                    let amount = checked_total(Cents::ZERO.checked_sub(net_debit))?;
                    total_liabilities = checked_total(total_liabilities.checked_add(amount))?;
                    liabilities.push(ReportLine { account, amount });
                }
                _ => {}
            }
        }

        let net_worth = checked_total(total_assets.checked_sub(total_liabilities))?;
        tracing::debug!(
            as_of = %as_of,
            lines = assets.len() + liabilities.len(),
            "Balance sheet computed"
        );
        let equity = vec![ReportLine {
            account: "Net Worth".to_string(),
            amount: net_worth,
        }];

        Ok(BalanceSheet {
            as_of,
            assets,
            liabilities,
            equity,
            total_assets,
            total_liabilities,
            total_equity: net_worth,
        })
    }

    /// Income statement over `start..=end`
    pub fn income_statement(&self, start: NaiveDate, end: NaiveDate) -> Result<IncomeStatement> {
        check_range(start, end)?;
        let balances = self.store.transaction(|tx| {
            net_debits_by_account(
                tx,
                AccountType::Income,
                AccountType::Expense,
                Some(start),
                end,
            )
        })?;

        let mut income = Vec::new();
        let mut expenses = Vec::new();
        let mut total_income = Cents::ZERO;
        let mut total_expenses = Cents::ZERO;
        for (account, (kind, net_debit)) in balances {
            match kind {
                AccountType::Income => {
                    let amount = checked_total(Cents::ZERO.checked_sub(net_debit))?;
                    total_income = checked_total(total_income.checked_add(amount))?;
                    income.push(ReportLine { account, amount });
                }
                AccountType::Expense => {
                    total_expenses = checked_total(total_expenses.checked_add(net_debit))?;
                    expenses.push(ReportLine {
                        account,
                        amount: net_debit,
                    });
                }
                _ => {}
            }
        }

        let net_income = checked_total(total_income.checked_sub(total_expenses))?;
        Ok(IncomeStatement {
            start,
            end,
            income,
            expenses,
            total_income,
            total_expenses,
            net_income,
        })
    }

    /// Income statement with the raw postings behind each account line
    pub fn income_statement_details(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<IncomeStatementDetails> {
        check_range(start, end)?;
        let accounts = self
            .store
            .transaction(|tx| income_postings(tx, start, end))?;

        let mut total_income = Cents::ZERO;
        let mut total_expenses = Cents::ZERO;
        for group in &accounts {
            match group.kind {
                AccountType::Income => {
                    total_income = checked_total(total_income.checked_add(group.amount))?;
                }
                AccountType::Expense => {
                    total_expenses = checked_total(total_expenses.checked_add(group.amount))?;
                }
                _ => {}
            }
        }

        let net_income = checked_total(total_income.checked_sub(total_expenses))?;
        Ok(IncomeStatementDetails {
            start,
            end,
            accounts,
            total_income,
            total_expenses,
            net_income,
        })
    }

    /// Register for one account: every posting against it, newest
    /// first, with running balances accumulated in chronological
    /// order. `None` if the account is unknown or tombstoned.
    pub fn register(&self, id: &AcctId) -> Result<Option<AccountRegister>> {
        let register = self.store.transaction(|tx| {
            let Some(account) = storage::get_account(tx, id)? else {
                return Ok(None);
            };
            if account.is_deleted() {
                return Ok(None);
            }
            let name = account.name.get().clone();
            let kind = *account.kind.get();
            let rows = register_rows(tx, &name, kind)?;
            tracing::debug!(account = %name, rows = rows.len(), "Register computed");
            Ok(Some(AccountRegister {
                account: name,
                kind,
                rows,
            }))
        })?;
        Ok(register)
    }

    /// One transaction with its ordered entries and per-entry
    /// reconciliation status. `None` if unknown or tombstoned.
    pub fn transaction_detail(&self, id: &TxnId) -> Result<Option<TransactionDetail>> {
        let detail = self.store.transaction(|tx| {
            let Some(txn) = storage::get_transaction(tx, id)? else {
                return Ok(None);
            };
            if txn.is_deleted() {
                return Ok(None);
            }

            let mut entries = Vec::with_capacity(txn.entries.get().len());
            for entry in txn.entries.get() {
                entries.push(EntryDetail {
                    account: entry.account.clone(),
                    debit: entry.debit,
                    credit: entry.credit,
                    comment: entry.comment.clone(),
                    status: entry_status(tx, id, &entry.account)?,
                });
            }

            Ok(Some(TransactionDetail {
                id: txn.id,
                date: *txn.date.get(),
                code: txn.code.get().clone(),
                vendor: txn.vendor.get().clone(),
                description: txn.description.get().clone(),
                entries,
            }))
        })?;
        Ok(detail)
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(Error::InvalidRange(format!(
            "start {} is after end {}",
            start, end
        )));
    }
    Ok(())
}

/// Individually valid postings can still overflow a running total;
/// that is reported as a validation failure, never wrapped
fn checked_total(total: Option<Cents>) -> tally_core::Result<Cents> {
    total.ok_or_else(|| {
        tally_core::Error::Validation(
            "aggregate amount exceeds the representable cent range".to_string(),
        )
    })
}

fn parse_row_date(s: &str) -> tally_core::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| tally_core::Error::Validation(format!("bad stored date {:?}", s)))
}

/// Net debit (debits minus credits) per account for two account kinds,
/// over transactions dated within the window. BTreeMap keeps lines in
/// account-name order.
fn net_debits_by_account(
    tx: &rusqlite::Transaction<'_>,
    kind_a: AccountType,
    kind_b: AccountType,
    start: Option<NaiveDate>,
    end: NaiveDate,
) -> tally_core::Result<BTreeMap<String, (AccountType, Cents)>> {
    let mut stmt = tx.prepare(
        "SELECT a.name, a.kind, e.debit_cents, e.credit_cents
         FROM entries e
         JOIN txns t ON t.id = e.txn_id
         JOIN accounts a ON a.name = e.account
         WHERE t.is_deleted = 0 AND a.is_deleted = 0
           AND a.kind IN (?1, ?2)
           AND t.date <= ?3
           AND (?4 IS NULL OR t.date >= ?4)",
    )?;
    let rows = stmt.query_map(
        params![
            kind_a.as_str(),
            kind_b.as_str(),
            end.to_string(),
            start.map(|d| d.to_string()),
        ],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        },
    )?;

    let mut balances: BTreeMap<String, (AccountType, Cents)> = BTreeMap::new();
    for row in rows {
        let (name, kind, debit, credit) = row?;
        let kind = AccountType::parse(&kind)?;
        let slot = balances.entry(name).or_insert((kind, Cents::ZERO));
        slot.1 = checked_total(slot.1.checked_add(Cents(debit) - Cents(credit)))?;
    }
    Ok(balances)
}

/// Income and expense postings grouped per account, accounts in name
/// order, postings in transaction-date order within each account
fn income_postings(
    tx: &rusqlite::Transaction<'_>,
    start: NaiveDate,
    end: NaiveDate,
) -> tally_core::Result<Vec<AccountPostings>> {
    let mut stmt = tx.prepare(
        "SELECT a.name, a.kind, t.date, t.vendor, t.description,
                e.debit_cents, e.credit_cents
         FROM entries e
         JOIN txns t ON t.id = e.txn_id
         JOIN accounts a ON a.name = e.account
         WHERE t.is_deleted = 0 AND a.is_deleted = 0
           AND a.kind IN (?1, ?2)
           AND t.date >= ?3 AND t.date <= ?4
         ORDER BY a.name ASC, t.date ASC, t.id ASC, e.entry_seq ASC",
    )?;
    let rows = stmt.query_map(
        params![
            AccountType::Income.as_str(),
            AccountType::Expense.as_str(),
            start.to_string(),
            end.to_string(),
        ],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        },
    )?;

    let mut accounts: Vec<AccountPostings> = Vec::new();
    for row in rows {
        let (name, kind, date, vendor, description, debit, credit) = row?;
        let kind = AccountType::parse(&kind)?;
        let amount = if kind.is_debit_normal() {
            Cents(debit) - Cents(credit)
        } else {
            Cents(credit) - Cents(debit)
        };
        let posting = PostingLine {
            date: parse_row_date(&date)?,
            vendor,
            description,
            amount,
        };

        match accounts.last_mut() {
            Some(group) if group.account == name => {
                group.amount = checked_total(group.amount.checked_add(amount))?;
                group.postings.push(posting);
            }
            _ => accounts.push(AccountPostings {
                account: name,
                kind,
                amount,
                postings: vec![posting],
            }),
        }
    }
    Ok(accounts)
}

/// Postings against one account, accumulated in chronological order.
/// Same-date rows tie-break on (transaction id, entry position): a
/// physical insertion-order tie-break would vary with directive
/// delivery order, and converged snapshots must render identically.
fn register_rows(
    tx: &rusqlite::Transaction<'_>,
    account_name: &str,
    kind: AccountType,
) -> tally_core::Result<Vec<RegisterRow>> {
    let mut stmt = tx.prepare(
        "SELECT e.txn_id, t.date, t.code, t.vendor, t.description,
                e.comment, e.debit_cents, e.credit_cents
         FROM entries e
         JOIN txns t ON t.id = e.txn_id
         WHERE e.account = ?1 AND t.is_deleted = 0
         ORDER BY t.date ASC, t.id ASC, e.entry_seq ASC",
    )?;
    let raw = stmt.query_map(params![account_name], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, i64>(6)?,
            row.get::<_, i64>(7)?,
        ))
    })?;

    let mut offsets: HashMap<String, String> = HashMap::new();
    let mut rows = Vec::new();
    let mut balance = Cents::ZERO;
    for row in raw {
        let (txn_id, date, code, vendor, description, comment, debit, credit) = row?;
        let debit = Cents(debit);
        let credit = Cents(credit);
        let delta = if kind.is_debit_normal() {
            debit - credit
        } else {
            credit - debit
        };
        balance = checked_total(balance.checked_add(delta))?;

        let offset_account = match offsets.get(&txn_id) {
            Some(label) => label.clone(),
            None => {
                let label = offset_label(tx, &txn_id, account_name)?;
                offsets.insert(txn_id.clone(), label.clone());
                label
            }
        };

        rows.push(RegisterRow {
            txn_id: TxnId::parse(&txn_id)?,
            date: parse_row_date(&date)?,
            code,
            vendor,
            description,
            comment,
            debit,
            credit,
            balance,
            offset_account,
        });
    }

    // Newest first, balances stay historical
    rows.reverse();
    Ok(rows)
}

/// The other side of a transaction from this account's point of view
fn offset_label(
    tx: &rusqlite::Transaction<'_>,
    txn_id: &str,
    account_name: &str,
) -> tally_core::Result<String> {
    let mut stmt = tx.prepare(
        "SELECT DISTINCT account FROM entries
         WHERE txn_id = ?1 AND account <> ?2 ORDER BY account ASC",
    )?;
    let rows = stmt.query_map(params![txn_id, account_name], |row| {
        row.get::<_, String>(0)
    })?;
    let mut others = Vec::new();
    for row in rows {
        others.push(row?);
    }
    Ok(match others.len() {
        0 => String::new(),
        1 => others.remove(0),
        _ => SPLIT_MARKER.to_string(),
    })
}

/// Reconciliation status of one entry, derived from statements on the
/// entry's account that link the owning transaction
fn entry_status(
    tx: &rusqlite::Transaction<'_>,
    txn_id: &TxnId,
    account_name: &str,
) -> tally_core::Result<Option<ReconciliationStatus>> {
    let reconciled: Option<i64> = tx.query_row(
        "SELECT MAX(s.is_reconciled)
         FROM statements s
         JOIN statement_txns st ON st.stmt_id = s.id
         WHERE st.txn_id = ?1 AND s.account = ?2 AND s.is_deleted = 0",
        params![txn_id.as_str(), account_name],
        |row| row.get(0),
    )?;
    Ok(reconciled.map(|flag| {
        if flag > 0 {
            ReconciliationStatus::Reconciled
        } else {
            ReconciliationStatus::Pending
        }
    }))
}
