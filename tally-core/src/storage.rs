//! Relational snapshot storage over SQLite
//!
//! The snapshot is a disposable materialized cache of the directive
//! log. Every mutable entity field is stored as two columns: the value
//! and the 16-character clock of the write that set it, so the
//! projection engine can gate writes per field.
//!
//! The [`Store`] owns one connection behind a mutex: one transaction at
//! a time per logical operation, and no reads outside a transaction.

use crate::clock::HybridLogicalClock;
use crate::error::{Error, Result};
use crate::ids::{AcctId, StmtId, TxnId, VndrId};
use crate::money::Cents;
use crate::types::{Account, AccountType, Entry, Lww, Statement, Transaction, Vendor};
use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id                TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    name_clock        TEXT NOT NULL,
    number            TEXT,
    number_clock      TEXT NOT NULL,
    kind              TEXT NOT NULL,
    kind_clock        TEXT NOT NULL,
    description       TEXT,
    description_clock TEXT NOT NULL,
    is_deleted        INTEGER NOT NULL,
    is_deleted_clock  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_accounts_name ON accounts (name);

CREATE TABLE IF NOT EXISTS vendors (
    id                    TEXT PRIMARY KEY,
    name                  TEXT NOT NULL,
    name_clock            TEXT NOT NULL,
    description           TEXT,
    description_clock     TEXT NOT NULL,
    default_account       TEXT,
    default_account_clock TEXT NOT NULL,
    is_active             INTEGER NOT NULL,
    is_active_clock       TEXT NOT NULL,
    is_deleted            INTEGER NOT NULL,
    is_deleted_clock      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS txns (
    id                TEXT PRIMARY KEY,
    date              TEXT NOT NULL,
    date_clock        TEXT NOT NULL,
    code              TEXT,
    code_clock        TEXT NOT NULL,
    vendor            TEXT,
    vendor_clock      TEXT NOT NULL,
    description       TEXT,
    description_clock TEXT NOT NULL,
    entries_clock     TEXT NOT NULL,
    is_deleted        INTEGER NOT NULL,
    is_deleted_clock  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_txns_date ON txns (date);
CREATE INDEX IF NOT EXISTS idx_txns_vendor ON txns (vendor);

CREATE TABLE IF NOT EXISTS entries (
    txn_id      TEXT NOT NULL,
    entry_seq   INTEGER NOT NULL,
    account     TEXT NOT NULL,
    debit_cents INTEGER NOT NULL,
    credit_cents INTEGER NOT NULL,
    comment     TEXT,
    PRIMARY KEY (txn_id, entry_seq)
);
CREATE INDEX IF NOT EXISTS idx_entries_account ON entries (account);

CREATE TABLE IF NOT EXISTS statements (
    id                  TEXT PRIMARY KEY,
    account             TEXT NOT NULL,
    account_clock       TEXT NOT NULL,
    begin_date          TEXT NOT NULL,
    begin_date_clock    TEXT NOT NULL,
    end_date            TEXT NOT NULL,
    end_date_clock      TEXT NOT NULL,
    begin_balance_cents INTEGER NOT NULL,
    begin_balance_clock TEXT NOT NULL,
    end_balance_cents   INTEGER NOT NULL,
    end_balance_clock   TEXT NOT NULL,
    is_reconciled       INTEGER NOT NULL,
    is_reconciled_clock TEXT NOT NULL,
    txns_clock          TEXT NOT NULL,
    is_deleted          INTEGER NOT NULL,
    is_deleted_clock    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS statement_txns (
    stmt_id TEXT NOT NULL,
    txn_id  TEXT NOT NULL,
    PRIMARY KEY (stmt_id, txn_id)
);
CREATE INDEX IF NOT EXISTS idx_statement_txns_txn ON statement_txns (txn_id);
";

/// Storage wrapper owning the snapshot connection
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open or create the snapshot database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init(conn, Some(path.as_ref()))
    }

    /// Open a fresh in-memory snapshot (tests, replay scratch space)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<&Path>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        tracing::info!(path = ?path, "Snapshot store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside one atomic transaction. Commits on `Ok`, rolls
    /// back on `Err` — a failed directive leaves no partial state.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

// Column helpers

fn clock_col(row: &Row<'_>, col: &str) -> Result<HybridLogicalClock> {
    let s: String = row.get(col)?;
    s.parse()
}

fn date_col(row: &Row<'_>, col: &str) -> Result<NaiveDate> {
    let s: String = row.get(col)?;
    parse_stored_date(&s)
}

fn parse_stored_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("bad stored date {:?}", s)))
}

fn lww<T>(value: T, clock: HybridLogicalClock) -> Lww<T> {
    Lww::new(value, clock)
}

// Account rows

fn account_from_row(row: &Row<'_>) -> Result<Account> {
    let id: String = row.get("id")?;
    let kind: String = row.get("kind")?;
    Ok(Account {
        id: AcctId::parse(&id)?,
        name: lww(row.get("name")?, clock_col(row, "name_clock")?),
        number: lww(row.get("number")?, clock_col(row, "number_clock")?),
        kind: lww(AccountType::parse(&kind)?, clock_col(row, "kind_clock")?),
        description: lww(
            row.get("description")?,
            clock_col(row, "description_clock")?,
        ),
        deleted: lww(row.get("is_deleted")?, clock_col(row, "is_deleted_clock")?),
    })
}

/// Fetch an account by id (tombstoned rows included)
pub fn get_account(tx: &rusqlite::Transaction<'_>, id: &AcctId) -> Result<Option<Account>> {
    tx.query_row(
        "SELECT * FROM accounts WHERE id = ?1",
        params![id.as_str()],
        |row| Ok(account_from_row(row)),
    )
    .optional()?
    .transpose()
}

/// Fetch a non-deleted account by display name
pub fn get_account_by_name(tx: &rusqlite::Transaction<'_>, name: &str) -> Result<Option<Account>> {
    tx.query_row(
        "SELECT * FROM accounts WHERE name = ?1 AND is_deleted = 0",
        params![name],
        |row| Ok(account_from_row(row)),
    )
    .optional()?
    .transpose()
}

/// All accounts ordered by name (tombstoned rows included)
pub fn all_accounts(tx: &rusqlite::Transaction<'_>) -> Result<Vec<Account>> {
    let mut stmt = tx.prepare("SELECT * FROM accounts ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| Ok(account_from_row(row)))?;
    let mut accounts = Vec::new();
    for row in rows {
        accounts.push(row??);
    }
    Ok(accounts)
}

/// Insert or replace an account row
pub fn put_account(tx: &rusqlite::Transaction<'_>, account: &Account) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO accounts (
            id, name, name_clock, number, number_clock, kind, kind_clock,
            description, description_clock, is_deleted, is_deleted_clock
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            account.id.as_str(),
            account.name.get(),
            account.name.clock().to_string(),
            account.number.get(),
            account.number.clock().to_string(),
            account.kind.get().as_str(),
            account.kind.clock().to_string(),
            account.description.get(),
            account.description.clock().to_string(),
            account.is_deleted(),
            account.deleted.clock().to_string(),
        ],
    )?;
    Ok(())
}

/// True if any account row (tombstoned or not) has this id
pub fn account_exists(tx: &rusqlite::Transaction<'_>, id: &AcctId) -> Result<bool> {
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM accounts WHERE id = ?1",
        params![id.as_str()],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

/// Non-deleted accounts other than `except` carrying this name
pub fn account_name_taken(
    tx: &rusqlite::Transaction<'_>,
    name: &str,
    except: Option<&AcctId>,
) -> Result<bool> {
    let except = except.map(|id| id.as_str().to_string()).unwrap_or_default();
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM accounts WHERE name = ?1 AND id <> ?2 AND is_deleted = 0",
        params![name, except],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

// Vendor rows

fn vendor_from_row(row: &Row<'_>) -> Result<Vendor> {
    let id: String = row.get("id")?;
    Ok(Vendor {
        id: VndrId::parse(&id)?,
        name: lww(row.get("name")?, clock_col(row, "name_clock")?),
        description: lww(
            row.get("description")?,
            clock_col(row, "description_clock")?,
        ),
        default_account: lww(
            row.get("default_account")?,
            clock_col(row, "default_account_clock")?,
        ),
        active: lww(row.get("is_active")?, clock_col(row, "is_active_clock")?),
        deleted: lww(row.get("is_deleted")?, clock_col(row, "is_deleted_clock")?),
    })
}

/// Fetch a vendor by id (tombstoned rows included)
pub fn get_vendor(tx: &rusqlite::Transaction<'_>, id: &VndrId) -> Result<Option<Vendor>> {
    tx.query_row(
        "SELECT * FROM vendors WHERE id = ?1",
        params![id.as_str()],
        |row| Ok(vendor_from_row(row)),
    )
    .optional()?
    .transpose()
}

/// All vendors ordered by name (tombstoned rows included)
pub fn all_vendors(tx: &rusqlite::Transaction<'_>) -> Result<Vec<Vendor>> {
    let mut stmt = tx.prepare("SELECT * FROM vendors ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| Ok(vendor_from_row(row)))?;
    let mut vendors = Vec::new();
    for row in rows {
        vendors.push(row??);
    }
    Ok(vendors)
}

/// Insert or replace a vendor row
pub fn put_vendor(tx: &rusqlite::Transaction<'_>, vendor: &Vendor) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO vendors (
            id, name, name_clock, description, description_clock,
            default_account, default_account_clock,
            is_active, is_active_clock, is_deleted, is_deleted_clock
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            vendor.id.as_str(),
            vendor.name.get(),
            vendor.name.clock().to_string(),
            vendor.description.get(),
            vendor.description.clock().to_string(),
            vendor.default_account.get(),
            vendor.default_account.clock().to_string(),
            *vendor.active.get(),
            vendor.active.clock().to_string(),
            vendor.is_deleted(),
            vendor.deleted.clock().to_string(),
        ],
    )?;
    Ok(())
}

/// True if any vendor row (tombstoned or not) has this id
pub fn vendor_exists(tx: &rusqlite::Transaction<'_>, id: &VndrId) -> Result<bool> {
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM vendors WHERE id = ?1",
        params![id.as_str()],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

/// Non-deleted vendors other than `except` carrying this name
pub fn vendor_name_taken(
    tx: &rusqlite::Transaction<'_>,
    name: &str,
    except: Option<&VndrId>,
) -> Result<bool> {
    let except = except.map(|id| id.as_str().to_string()).unwrap_or_default();
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM vendors WHERE name = ?1 AND id <> ?2 AND is_deleted = 0",
        params![name, except],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

// Transaction rows

fn txn_header_from_row(row: &Row<'_>, entries: Lww<Vec<Entry>>) -> Result<Transaction> {
    let id: String = row.get("id")?;
    Ok(Transaction {
        id: TxnId::parse(&id)?,
        date: lww(date_col(row, "date")?, clock_col(row, "date_clock")?),
        code: lww(row.get("code")?, clock_col(row, "code_clock")?),
        vendor: lww(row.get("vendor")?, clock_col(row, "vendor_clock")?),
        description: lww(
            row.get("description")?,
            clock_col(row, "description_clock")?,
        ),
        entries,
        deleted: lww(row.get("is_deleted")?, clock_col(row, "is_deleted_clock")?),
    })
}

/// Ordered entry set for one transaction
pub fn get_entries(tx: &rusqlite::Transaction<'_>, id: &TxnId) -> Result<Vec<Entry>> {
    let mut stmt = tx.prepare(
        "SELECT account, debit_cents, credit_cents, comment
         FROM entries WHERE txn_id = ?1 ORDER BY entry_seq ASC",
    )?;
    let rows = stmt.query_map(params![id.as_str()], |row| {
        Ok(Entry {
            account: row.get(0)?,
            debit: Cents(row.get(1)?),
            credit: Cents(row.get(2)?),
            comment: row.get(3)?,
        })
    })?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

/// Fetch a transaction with its ordered entries (tombstoned rows included)
pub fn get_transaction(tx: &rusqlite::Transaction<'_>, id: &TxnId) -> Result<Option<Transaction>> {
    let header = tx
        .query_row(
            "SELECT * FROM txns WHERE id = ?1",
            params![id.as_str()],
            |row| {
                let entries_clock: String = row.get("entries_clock")?;
                // Defer entry loading; capture everything else here
                let placeholder = Lww::new(
                    Vec::new(),
                    HybridLogicalClock::from_parts(0, 0, crate::clock::NodeId::ZERO),
                );
                Ok((txn_header_from_row(row, placeholder), entries_clock))
            },
        )
        .optional()?;

    let Some((header, entries_clock)) = header else {
        return Ok(None);
    };
    let mut txn = header?;
    let entries = get_entries(tx, id)?;
    txn.entries = Lww::new(entries, entries_clock.parse()?);
    Ok(Some(txn))
}

/// All transactions ordered by date (tombstoned rows included)
pub fn all_transactions(tx: &rusqlite::Transaction<'_>) -> Result<Vec<Transaction>> {
    let ids: Vec<String> = {
        let mut stmt = tx.prepare("SELECT id FROM txns ORDER BY date ASC, id ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<_, _>>()?
    };
    let mut txns = Vec::new();
    for id in ids {
        let id = TxnId::parse(&id)?;
        if let Some(txn) = get_transaction(tx, &id)? {
            txns.push(txn);
        }
    }
    Ok(txns)
}

/// Insert or replace a transaction header and its entry rows
pub fn put_transaction(tx: &rusqlite::Transaction<'_>, txn: &Transaction) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO txns (
            id, date, date_clock, code, code_clock, vendor, vendor_clock,
            description, description_clock, entries_clock,
            is_deleted, is_deleted_clock
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            txn.id.as_str(),
            txn.date.get().to_string(),
            txn.date.clock().to_string(),
            txn.code.get(),
            txn.code.clock().to_string(),
            txn.vendor.get(),
            txn.vendor.clock().to_string(),
            txn.description.get(),
            txn.description.clock().to_string(),
            txn.entries.clock().to_string(),
            txn.is_deleted(),
            txn.deleted.clock().to_string(),
        ],
    )?;
    replace_entries(tx, &txn.id, txn.entries.get())
}

/// Replace the entry rows for one transaction, preserving entry order
pub fn replace_entries(
    tx: &rusqlite::Transaction<'_>,
    id: &TxnId,
    entries: &[Entry],
) -> Result<()> {
    tx.execute("DELETE FROM entries WHERE txn_id = ?1", params![id.as_str()])?;
    let mut stmt = tx.prepare(
        "INSERT INTO entries (txn_id, entry_seq, account, debit_cents, credit_cents, comment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (seq, entry) in entries.iter().enumerate() {
        stmt.execute(params![
            id.as_str(),
            seq as i64,
            entry.account,
            entry.debit.amount(),
            entry.credit.amount(),
            entry.comment,
        ])?;
    }
    Ok(())
}

/// True if any transaction row (tombstoned or not) has this id
pub fn transaction_exists(tx: &rusqlite::Transaction<'_>, id: &TxnId) -> Result<bool> {
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM txns WHERE id = ?1",
        params![id.as_str()],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

// Statement rows

fn statement_from_row(row: &Row<'_>, transactions: Lww<Vec<TxnId>>) -> Result<Statement> {
    let id: String = row.get("id")?;
    Ok(Statement {
        id: StmtId::parse(&id)?,
        account: lww(row.get("account")?, clock_col(row, "account_clock")?),
        begin_date: lww(date_col(row, "begin_date")?, clock_col(row, "begin_date_clock")?),
        end_date: lww(date_col(row, "end_date")?, clock_col(row, "end_date_clock")?),
        beginning_balance: lww(
            Cents(row.get("begin_balance_cents")?),
            clock_col(row, "begin_balance_clock")?,
        ),
        ending_balance: lww(
            Cents(row.get("end_balance_cents")?),
            clock_col(row, "end_balance_clock")?,
        ),
        reconciled: lww(
            row.get("is_reconciled")?,
            clock_col(row, "is_reconciled_clock")?,
        ),
        transactions,
        deleted: lww(row.get("is_deleted")?, clock_col(row, "is_deleted_clock")?),
    })
}

/// Linked transaction ids for one statement
pub fn get_statement_txns(tx: &rusqlite::Transaction<'_>, id: &StmtId) -> Result<Vec<TxnId>> {
    let mut stmt = tx.prepare(
        "SELECT txn_id FROM statement_txns WHERE stmt_id = ?1 ORDER BY txn_id ASC",
    )?;
    let rows = stmt.query_map(params![id.as_str()], |row| row.get::<_, String>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(TxnId::parse(&row?)?);
    }
    Ok(ids)
}

/// Fetch a statement by id (tombstoned rows included)
pub fn get_statement(tx: &rusqlite::Transaction<'_>, id: &StmtId) -> Result<Option<Statement>> {
    let header = tx
        .query_row(
            "SELECT * FROM statements WHERE id = ?1",
            params![id.as_str()],
            |row| {
                let txns_clock: String = row.get("txns_clock")?;
                let placeholder = Lww::new(
                    Vec::new(),
                    HybridLogicalClock::from_parts(0, 0, crate::clock::NodeId::ZERO),
                );
                Ok((statement_from_row(row, placeholder), txns_clock))
            },
        )
        .optional()?;

    let Some((header, txns_clock)) = header else {
        return Ok(None);
    };
    let mut statement = header?;
    let linked = get_statement_txns(tx, id)?;
    statement.transactions = Lww::new(linked, txns_clock.parse()?);
    Ok(Some(statement))
}

/// All statements ordered by period start (tombstoned rows included)
pub fn all_statements(tx: &rusqlite::Transaction<'_>) -> Result<Vec<Statement>> {
    let ids: Vec<String> = {
        let mut stmt = tx.prepare("SELECT id FROM statements ORDER BY begin_date ASC, id ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<_, _>>()?
    };
    let mut statements = Vec::new();
    for id in ids {
        let id = StmtId::parse(&id)?;
        if let Some(statement) = get_statement(tx, &id)? {
            statements.push(statement);
        }
    }
    Ok(statements)
}

/// Insert or replace a statement row and its transaction links
pub fn put_statement(tx: &rusqlite::Transaction<'_>, statement: &Statement) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO statements (
            id, account, account_clock, begin_date, begin_date_clock,
            end_date, end_date_clock, begin_balance_cents, begin_balance_clock,
            end_balance_cents, end_balance_clock, is_reconciled, is_reconciled_clock,
            txns_clock, is_deleted, is_deleted_clock
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            statement.id.as_str(),
            statement.account.get(),
            statement.account.clock().to_string(),
            statement.begin_date.get().to_string(),
            statement.begin_date.clock().to_string(),
            statement.end_date.get().to_string(),
            statement.end_date.clock().to_string(),
            statement.beginning_balance.get().amount(),
            statement.beginning_balance.clock().to_string(),
            statement.ending_balance.get().amount(),
            statement.ending_balance.clock().to_string(),
            *statement.reconciled.get(),
            statement.reconciled.clock().to_string(),
            statement.transactions.clock().to_string(),
            statement.is_deleted(),
            statement.deleted.clock().to_string(),
        ],
    )?;
    replace_statement_txns(tx, &statement.id, statement.transactions.get())
}

/// Replace the transaction links for one statement
pub fn replace_statement_txns(
    tx: &rusqlite::Transaction<'_>,
    id: &StmtId,
    txns: &[TxnId],
) -> Result<()> {
    tx.execute(
        "DELETE FROM statement_txns WHERE stmt_id = ?1",
        params![id.as_str()],
    )?;
    let mut stmt =
        tx.prepare("INSERT OR IGNORE INTO statement_txns (stmt_id, txn_id) VALUES (?1, ?2)")?;
    for txn_id in txns {
        stmt.execute(params![id.as_str(), txn_id.as_str()])?;
    }
    Ok(())
}

/// True if any statement row (tombstoned or not) has this id
pub fn statement_exists(tx: &rusqlite::Transaction<'_>, id: &StmtId) -> Result<bool> {
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM statements WHERE id = ?1",
        params![id.as_str()],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

// Referential-integrity reads for destructive directives

/// Posted entries referencing an account name (tombstoned transactions
/// still count; history is never orphaned)
pub fn count_entries_for_account(tx: &rusqlite::Transaction<'_>, name: &str) -> Result<i64> {
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM entries WHERE account = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// Non-deleted vendors using an account name as their default account
pub fn count_vendor_defaults(tx: &rusqlite::Transaction<'_>, name: &str) -> Result<i64> {
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM vendors WHERE default_account = ?1 AND is_deleted = 0",
        params![name],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// Non-deleted transactions referencing a vendor name
pub fn count_txns_for_vendor(tx: &rusqlite::Transaction<'_>, name: &str) -> Result<i64> {
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM txns WHERE vendor = ?1 AND is_deleted = 0",
        params![name],
        |row| row.get(0),
    )?;
    Ok(n)
}
