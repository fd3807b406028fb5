//! Projection engine
//!
//! Replays directives against the relational snapshot. Each directive
//! runs in its own atomic transaction; every mutable field is gated by
//! its shadow clock (strict greater-than), so applying the same set of
//! directives in any order converges to the same snapshot.
//!
//! Outcome taxonomy per directive:
//! - payload validation failure: error, nothing applied
//! - create of an existing id: conflict error
//! - update of a missing id: not-found error
//! - stale field write: silent no-op for that field
//! - delete of an in-use entity: in-use error
//! - re-delete with an older-or-equal clock: silent no-op

use crate::clock::HybridLogicalClock;
use crate::directive::{
    patch_text, AccountPatch, Directive, NewAccount, NewStatement, NewTransaction, NewVendor,
    StatementPatch, TransactionPatch, VendorPatch,
};
use crate::error::{Error, Result};
use crate::ids::{AcctId, StmtId, TxnId, VndrId};
use crate::storage::{self, Store};
use crate::types::{Account, Statement, Transaction, Vendor};
use std::sync::Arc;

/// Replay outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Directives applied (including ones that were stale no-ops)
    pub applied: usize,
}

/// Applies directives to the snapshot it exclusively owns
#[derive(Debug, Clone)]
pub struct Projector {
    store: Arc<Store>,
}

impl Projector {
    /// Projector over a snapshot store
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// The underlying snapshot store
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Validate and apply one directive in one atomic transaction
    pub fn apply(&self, directive: &Directive) -> Result<()> {
        self.apply_and_read(directive, |_| Ok(()))
    }

    /// Validate and apply one directive, then run a follow-up read in
    /// the same atomic transaction. An error from the read rolls the
    /// mutation back as well.
    pub fn apply_and_read<T>(
        &self,
        directive: &Directive,
        read: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        directive.validate()?;
        let value = self.store.transaction(|tx| {
            apply_in_tx(tx, directive)?;
            read(tx)
        })?;
        tracing::debug!(
            action = directive.action(),
            clock = %directive.clock(),
            "Directive applied"
        );
        Ok(value)
    }

    /// Replay a directive journal in order, fail-fast: the first
    /// invalid directive aborts the replay. Each directive commits on
    /// its own, so an abort leaves no partial directive visible.
    pub fn replay<'a>(
        &self,
        directives: impl IntoIterator<Item = &'a Directive>,
    ) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        for directive in directives {
            self.apply(directive)?;
            summary.applied += 1;
        }
        tracing::info!(applied = summary.applied, "Journal replay complete");
        Ok(summary)
    }
}

fn apply_in_tx(tx: &rusqlite::Transaction<'_>, directive: &Directive) -> Result<()> {
    let clock = directive.clock();
    match directive {
        Directive::CreateAccount { account, .. } => create_account(tx, account, clock),
        Directive::UpdateAccount { id, patch, .. } => update_account(tx, id, patch, clock),
        Directive::DeleteAccount { id, .. } => delete_account(tx, id, clock),
        Directive::CreateVendor { vendor, .. } => create_vendor(tx, vendor, clock),
        Directive::UpdateVendor { id, patch, .. } => update_vendor(tx, id, patch, clock),
        Directive::DeleteVendor { id, .. } => delete_vendor(tx, id, clock),
        Directive::CreateTransaction { transaction, .. } => {
            create_transaction(tx, transaction, clock)
        }
        Directive::UpdateTransaction { id, patch, .. } => {
            update_transaction(tx, id, patch, clock)
        }
        Directive::DeleteTransaction { id, .. } => delete_transaction(tx, id, clock),
        Directive::CreateStatement { statement, .. } => create_statement(tx, statement, clock),
        Directive::UpdateStatement { id, patch, .. } => update_statement(tx, id, patch, clock),
        Directive::DeleteStatement { id, .. } => delete_statement(tx, id, clock),
    }
}

// Accounts

fn create_account(
    tx: &rusqlite::Transaction<'_>,
    new: &NewAccount,
    clock: HybridLogicalClock,
) -> Result<()> {
    if storage::account_exists(tx, &new.id)? {
        return Err(Error::Conflict(format!("account {} already exists", new.id)));
    }
    if storage::account_name_taken(tx, &new.name, None)? {
        return Err(Error::Validation(format!(
            "account name {:?} is already in use",
            new.name
        )));
    }
    let account = Account::create(
        new.id.clone(),
        new.name.clone(),
        new.number.clone(),
        new.kind,
        new.description.clone(),
        clock,
    );
    storage::put_account(tx, &account)
}

fn update_account(
    tx: &rusqlite::Transaction<'_>,
    id: &AcctId,
    patch: &AccountPatch,
    clock: HybridLogicalClock,
) -> Result<()> {
    let mut account = storage::get_account(tx, id)?
        .ok_or_else(|| Error::NotFound(format!("account {}", id)))?;

    if let Some(name) = &patch.name {
        // Uniqueness only matters if the write will actually land
        if clock > account.name.clock() && storage::account_name_taken(tx, name, Some(id))? {
            return Err(Error::Validation(format!(
                "account name {:?} is already in use",
                name
            )));
        }
        account.name.merge(name.clone(), clock);
    }
    if let Some(number) = patch_text(&patch.number) {
        account.number.merge(number, clock);
    }
    if let Some(kind) = patch.kind {
        account.kind.merge(kind, clock);
    }
    if let Some(description) = patch_text(&patch.description) {
        account.description.merge(description, clock);
    }

    storage::put_account(tx, &account)
}

fn delete_account(
    tx: &rusqlite::Transaction<'_>,
    id: &AcctId,
    clock: HybridLogicalClock,
) -> Result<()> {
    let mut account = storage::get_account(tx, id)?
        .ok_or_else(|| Error::NotFound(format!("account {}", id)))?;

    if account.is_deleted() {
        // Re-issue allowed only with a strictly newer clock
        if account.deleted.merge(true, clock) {
            storage::put_account(tx, &account)?;
        }
        return Ok(());
    }

    let name = account.name.get().clone();
    if storage::count_entries_for_account(tx, &name)? > 0 {
        return Err(Error::InUse(format!(
            "account {:?} has posted entries",
            name
        )));
    }
    if storage::count_vendor_defaults(tx, &name)? > 0 {
        return Err(Error::InUse(format!(
            "account {:?} is a vendor default account",
            name
        )));
    }

    if account.deleted.merge(true, clock) {
        storage::put_account(tx, &account)?;
    }
    Ok(())
}

// Vendors

fn create_vendor(
    tx: &rusqlite::Transaction<'_>,
    new: &NewVendor,
    clock: HybridLogicalClock,
) -> Result<()> {
    if storage::vendor_exists(tx, &new.id)? {
        return Err(Error::Conflict(format!("vendor {} already exists", new.id)));
    }
    if storage::vendor_name_taken(tx, &new.name, None)? {
        return Err(Error::Validation(format!(
            "vendor name {:?} is already in use",
            new.name
        )));
    }
    let vendor = Vendor::create(
        new.id.clone(),
        new.name.clone(),
        new.description.clone(),
        new.default_account.clone(),
        new.active,
        clock,
    );
    storage::put_vendor(tx, &vendor)
}

fn update_vendor(
    tx: &rusqlite::Transaction<'_>,
    id: &VndrId,
    patch: &VendorPatch,
    clock: HybridLogicalClock,
) -> Result<()> {
    let mut vendor = storage::get_vendor(tx, id)?
        .ok_or_else(|| Error::NotFound(format!("vendor {}", id)))?;

    if let Some(name) = &patch.name {
        if clock > vendor.name.clock() && storage::vendor_name_taken(tx, name, Some(id))? {
            return Err(Error::Validation(format!(
                "vendor name {:?} is already in use",
                name
            )));
        }
        vendor.name.merge(name.clone(), clock);
    }
    if let Some(description) = patch_text(&patch.description) {
        vendor.description.merge(description, clock);
    }
    if let Some(default_account) = patch_text(&patch.default_account) {
        vendor.default_account.merge(default_account, clock);
    }
    if let Some(active) = patch.active {
        vendor.active.merge(active, clock);
    }

    storage::put_vendor(tx, &vendor)
}

fn delete_vendor(
    tx: &rusqlite::Transaction<'_>,
    id: &VndrId,
    clock: HybridLogicalClock,
) -> Result<()> {
    let mut vendor = storage::get_vendor(tx, id)?
        .ok_or_else(|| Error::NotFound(format!("vendor {}", id)))?;

    if vendor.is_deleted() {
        if vendor.deleted.merge(true, clock) {
            storage::put_vendor(tx, &vendor)?;
        }
        return Ok(());
    }

    let name = vendor.name.get().clone();
    if storage::count_txns_for_vendor(tx, &name)? > 0 {
        return Err(Error::InUse(format!(
            "vendor {:?} is referenced by transactions",
            name
        )));
    }

    if vendor.deleted.merge(true, clock) {
        storage::put_vendor(tx, &vendor)?;
    }
    Ok(())
}

// Transactions

fn create_transaction(
    tx: &rusqlite::Transaction<'_>,
    new: &NewTransaction,
    clock: HybridLogicalClock,
) -> Result<()> {
    if storage::transaction_exists(tx, &new.id)? {
        return Err(Error::Conflict(format!(
            "transaction {} already exists",
            new.id
        )));
    }
    let txn = Transaction::create(
        new.id.clone(),
        new.date,
        new.code.clone(),
        new.vendor.clone(),
        new.description.clone(),
        new.entries.clone(),
        clock,
    );
    storage::put_transaction(tx, &txn)
}

fn update_transaction(
    tx: &rusqlite::Transaction<'_>,
    id: &TxnId,
    patch: &TransactionPatch,
    clock: HybridLogicalClock,
) -> Result<()> {
    let mut txn = storage::get_transaction(tx, id)?
        .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;

    if let Some(date) = patch.date {
        txn.date.merge(date, clock);
    }
    if let Some(code) = patch_text(&patch.code) {
        txn.code.merge(code, clock);
    }
    if let Some(vendor) = patch_text(&patch.vendor) {
        txn.vendor.merge(vendor, clock);
    }
    if let Some(description) = patch_text(&patch.description) {
        txn.description.merge(description, clock);
    }
    if let Some(entries) = &patch.entries {
        // Whole-set replacement under one clock
        txn.entries.merge(entries.clone(), clock);
    }

    if txn.vendor.get().is_none() && txn.description.get().is_none() {
        return Err(Error::Validation(
            "transaction requires a vendor or a description".to_string(),
        ));
    }

    storage::put_transaction(tx, &txn)
}

fn delete_transaction(
    tx: &rusqlite::Transaction<'_>,
    id: &TxnId,
    clock: HybridLogicalClock,
) -> Result<()> {
    let mut txn = storage::get_transaction(tx, id)?
        .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;

    if txn.deleted.merge(true, clock) {
        storage::put_transaction(tx, &txn)?;
    }
    Ok(())
}

// Statements

fn create_statement(
    tx: &rusqlite::Transaction<'_>,
    new: &NewStatement,
    clock: HybridLogicalClock,
) -> Result<()> {
    if storage::statement_exists(tx, &new.id)? {
        return Err(Error::Conflict(format!(
            "statement {} already exists",
            new.id
        )));
    }
    let statement = Statement::create(
        new.id.clone(),
        new.account.clone(),
        new.begin_date,
        new.end_date,
        new.beginning_balance,
        new.ending_balance,
        new.reconciled,
        new.transactions.clone(),
        clock,
    );
    storage::put_statement(tx, &statement)
}

fn update_statement(
    tx: &rusqlite::Transaction<'_>,
    id: &StmtId,
    patch: &StatementPatch,
    clock: HybridLogicalClock,
) -> Result<()> {
    let mut statement = storage::get_statement(tx, id)?
        .ok_or_else(|| Error::NotFound(format!("statement {}", id)))?;

    if let Some(account) = &patch.account {
        statement.account.merge(account.clone(), clock);
    }
    if let Some(begin_date) = patch.begin_date {
        statement.begin_date.merge(begin_date, clock);
    }
    if let Some(end_date) = patch.end_date {
        statement.end_date.merge(end_date, clock);
    }
    if let Some(beginning_balance) = patch.beginning_balance {
        statement.beginning_balance.merge(beginning_balance, clock);
    }
    if let Some(ending_balance) = patch.ending_balance {
        statement.ending_balance.merge(ending_balance, clock);
    }
    if let Some(reconciled) = patch.reconciled {
        statement.reconciled.merge(reconciled, clock);
    }
    if let Some(transactions) = &patch.transactions {
        statement.transactions.merge(transactions.clone(), clock);
    }

    if statement.begin_date.get() > statement.end_date.get() {
        return Err(Error::Validation(format!(
            "statement period is inverted: {} > {}",
            statement.begin_date.get(),
            statement.end_date.get()
        )));
    }

    storage::put_statement(tx, &statement)
}

fn delete_statement(
    tx: &rusqlite::Transaction<'_>,
    id: &StmtId,
    clock: HybridLogicalClock,
) -> Result<()> {
    let mut statement = storage::get_statement(tx, id)?
        .ok_or_else(|| Error::NotFound(format!("statement {}", id)))?;

    if statement.deleted.merge(true, clock) {
        storage::put_statement(tx, &statement)?;
    }
    Ok(())
}
