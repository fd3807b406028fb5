//! Repository facade
//!
//! Wraps the projection engine and snapshot queries behind per-entity
//! interfaces. Every operation runs inside one atomic transaction
//! against the storage boundary. Callers may supply the directive's
//! causal clock (a remote writer's value) or let the facade advance its
//! own writer clock.

use crate::clock::{HybridLogicalClock, NodeId};
use crate::directive::{
    AccountPatch, Directive, NewAccount, NewStatement, NewTransaction, NewVendor, StatementPatch,
    TransactionPatch, VendorPatch,
};
use crate::error::{Error, Result};
use crate::ids::{AcctId, StmtId, TxnId, VndrId};
use crate::projection::Projector;
use crate::storage::{self, Store};
use crate::types::{Account, Statement, Transaction, Vendor};
use parking_lot::Mutex;
use std::sync::Arc;

/// Sink for accepted directives (the append-only log)
pub trait Journal: Send + Sync {
    /// Record a directive that the projection engine accepted
    fn append(&self, directive: &Directive) -> Result<()>;
}

/// In-memory journal, used by tests and replay scratch work
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<Directive>>,
}

impl MemoryJournal {
    /// Empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded directives, in append order
    pub fn directives(&self) -> Vec<Directive> {
        self.entries.lock().clone()
    }
}

impl Journal for MemoryJournal {
    fn append(&self, directive: &Directive) -> Result<()> {
        self.entries.lock().push(directive.clone());
        Ok(())
    }
}

/// Account operations
pub trait AccountStore {
    /// Create an account and return its initial state
    fn create_account(
        &self,
        new: NewAccount,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Account>;
    /// Find a non-deleted account by id
    fn find_account(&self, id: &AcctId) -> Result<Option<Account>>;
    /// All non-deleted accounts, ordered by name
    fn find_all_accounts(&self) -> Result<Vec<Account>>;
    /// Patch an account and return the post-merge state
    fn update_account(
        &self,
        id: &AcctId,
        patch: AccountPatch,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Account>;
    /// Tombstone an account that nothing references
    fn delete_account(&self, id: &AcctId, clock: Option<HybridLogicalClock>) -> Result<()>;
}

/// Vendor operations
pub trait VendorStore {
    /// Create a vendor and return its initial state
    fn create_vendor(&self, new: NewVendor, clock: Option<HybridLogicalClock>) -> Result<Vendor>;
    /// Find a non-deleted vendor by id
    fn find_vendor(&self, id: &VndrId) -> Result<Option<Vendor>>;
    /// All non-deleted vendors, ordered by name
    fn find_all_vendors(&self) -> Result<Vec<Vendor>>;
    /// Patch a vendor and return the post-merge state
    fn update_vendor(
        &self,
        id: &VndrId,
        patch: VendorPatch,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Vendor>;
    /// Tombstone a vendor that no transaction references
    fn delete_vendor(&self, id: &VndrId, clock: Option<HybridLogicalClock>) -> Result<()>;
}

/// Transaction operations
pub trait TransactionStore {
    /// Create a transaction and return its initial state
    fn create_transaction(
        &self,
        new: NewTransaction,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Transaction>;
    /// Find a non-deleted transaction by id
    fn find_transaction(&self, id: &TxnId) -> Result<Option<Transaction>>;
    /// All non-deleted transactions, ordered by date
    fn find_all_transactions(&self) -> Result<Vec<Transaction>>;
    /// Patch a transaction and return the post-merge state
    fn update_transaction(
        &self,
        id: &TxnId,
        patch: TransactionPatch,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Transaction>;
    /// Tombstone a transaction
    fn delete_transaction(&self, id: &TxnId, clock: Option<HybridLogicalClock>) -> Result<()>;
}

/// Statement operations
pub trait StatementStore {
    /// Create a statement and return its initial state
    fn create_statement(
        &self,
        new: NewStatement,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Statement>;
    /// Find a non-deleted statement by id
    fn find_statement(&self, id: &StmtId) -> Result<Option<Statement>>;
    /// All non-deleted statements, ordered by period start
    fn find_all_statements(&self) -> Result<Vec<Statement>>;
    /// Patch a statement and return the post-merge state
    fn update_statement(
        &self,
        id: &StmtId,
        patch: StatementPatch,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Statement>;
    /// Tombstone a statement
    fn delete_statement(&self, id: &StmtId, clock: Option<HybridLogicalClock>) -> Result<()>;
}

/// Snapshot-backed repository: one writer clock, one projector, an
/// optional journal recording every accepted directive
pub struct Repository {
    projector: Projector,
    clock: Mutex<HybridLogicalClock>,
    journal: Option<Arc<dyn Journal>>,
}

impl Repository {
    /// Repository writing as `node`
    pub fn new(store: Arc<Store>, node: NodeId) -> Self {
        Self {
            projector: Projector::new(store),
            clock: Mutex::new(HybridLogicalClock::init(node)),
            journal: None,
        }
    }

    /// Record accepted directives into `journal` as well
    pub fn with_journal(mut self, journal: Arc<dyn Journal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// The projection engine this repository drives
    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    fn store(&self) -> &Arc<Store> {
        self.projector.store()
    }

    /// Resolve the directive clock: a caller-supplied value is used
    /// as-is and folded into the local writer clock, so later local
    /// events are causally after it; otherwise advance the local clock.
    fn effective_clock(&self, supplied: Option<HybridLogicalClock>) -> HybridLogicalClock {
        let mut local = self.clock.lock();
        match supplied {
            Some(remote) => {
                *local = local.merge(&remote);
                remote
            }
            None => {
                *local = local.advance();
                *local
            }
        }
    }

    /// Apply a directive and read the resulting state in one storage
    /// transaction, then journal the accepted directive
    fn record<T>(
        &self,
        directive: Directive,
        read: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let value = self.projector.apply_and_read(&directive, read)?;
        if let Some(journal) = &self.journal {
            journal.append(&directive)?;
        }
        Ok(value)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("clock", &*self.clock.lock())
            .finish_non_exhaustive()
    }
}

impl AccountStore for Repository {
    fn create_account(
        &self,
        new: NewAccount,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Account> {
        let id = new.id.clone();
        let clock = self.effective_clock(clock);
        self.record(
            Directive::CreateAccount {
                account: new,
                clock,
            },
            |tx| {
                storage::get_account(tx, &id)?
                    .ok_or_else(|| Error::NotFound(format!("account {}", id)))
            },
        )
    }

    fn find_account(&self, id: &AcctId) -> Result<Option<Account>> {
        self.store().transaction(|tx| {
            Ok(storage::get_account(tx, id)?.filter(|account| !account.is_deleted()))
        })
    }

    fn find_all_accounts(&self) -> Result<Vec<Account>> {
        self.store().transaction(|tx| {
            Ok(storage::all_accounts(tx)?
                .into_iter()
                .filter(|account| !account.is_deleted())
                .collect())
        })
    }

    fn update_account(
        &self,
        id: &AcctId,
        patch: AccountPatch,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Account> {
        let clock = self.effective_clock(clock);
        self.record(
            Directive::UpdateAccount {
                id: id.clone(),
                patch,
                clock,
            },
            // Reflects the post-merge state; a stale patch leaves it unchanged
            |tx| {
                storage::get_account(tx, id)?
                    .filter(|account| !account.is_deleted())
                    .ok_or_else(|| Error::NotFound(format!("account {}", id)))
            },
        )
    }

    fn delete_account(&self, id: &AcctId, clock: Option<HybridLogicalClock>) -> Result<()> {
        let clock = self.effective_clock(clock);
        self.record(
            Directive::DeleteAccount {
                id: id.clone(),
                clock,
            },
            |_| Ok(()),
        )
    }
}

impl VendorStore for Repository {
    fn create_vendor(&self, new: NewVendor, clock: Option<HybridLogicalClock>) -> Result<Vendor> {
        let id = new.id.clone();
        let clock = self.effective_clock(clock);
        self.record(Directive::CreateVendor { vendor: new, clock }, |tx| {
            storage::get_vendor(tx, &id)?
                .ok_or_else(|| Error::NotFound(format!("vendor {}", id)))
        })
    }

    fn find_vendor(&self, id: &VndrId) -> Result<Option<Vendor>> {
        self.store().transaction(|tx| {
            Ok(storage::get_vendor(tx, id)?.filter(|vendor| !vendor.is_deleted()))
        })
    }

    fn find_all_vendors(&self) -> Result<Vec<Vendor>> {
        self.store().transaction(|tx| {
            Ok(storage::all_vendors(tx)?
                .into_iter()
                .filter(|vendor| !vendor.is_deleted())
                .collect())
        })
    }

    fn update_vendor(
        &self,
        id: &VndrId,
        patch: VendorPatch,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Vendor> {
        let clock = self.effective_clock(clock);
        self.record(
            Directive::UpdateVendor {
                id: id.clone(),
                patch,
                clock,
            },
            |tx| {
                storage::get_vendor(tx, id)?
                    .filter(|vendor| !vendor.is_deleted())
                    .ok_or_else(|| Error::NotFound(format!("vendor {}", id)))
            },
        )
    }

    fn delete_vendor(&self, id: &VndrId, clock: Option<HybridLogicalClock>) -> Result<()> {
        let clock = self.effective_clock(clock);
        self.record(
            Directive::DeleteVendor {
                id: id.clone(),
                clock,
            },
            |_| Ok(()),
        )
    }
}

impl TransactionStore for Repository {
    fn create_transaction(
        &self,
        new: NewTransaction,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Transaction> {
        let id = new.id.clone();
        let clock = self.effective_clock(clock);
        self.record(
            Directive::CreateTransaction {
                transaction: new,
                clock,
            },
            |tx| {
                storage::get_transaction(tx, &id)?
                    .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
            },
        )
    }

    fn find_transaction(&self, id: &TxnId) -> Result<Option<Transaction>> {
        self.store().transaction(|tx| {
            Ok(storage::get_transaction(tx, id)?.filter(|txn| !txn.is_deleted()))
        })
    }

    fn find_all_transactions(&self) -> Result<Vec<Transaction>> {
        self.store().transaction(|tx| {
            Ok(storage::all_transactions(tx)?
                .into_iter()
                .filter(|txn| !txn.is_deleted())
                .collect())
        })
    }

    fn update_transaction(
        &self,
        id: &TxnId,
        patch: TransactionPatch,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Transaction> {
        let clock = self.effective_clock(clock);
        self.record(
            Directive::UpdateTransaction {
                id: id.clone(),
                patch,
                clock,
            },
            |tx| {
                storage::get_transaction(tx, id)?
                    .filter(|txn| !txn.is_deleted())
                    .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
            },
        )
    }

    fn delete_transaction(&self, id: &TxnId, clock: Option<HybridLogicalClock>) -> Result<()> {
        let clock = self.effective_clock(clock);
        self.record(
            Directive::DeleteTransaction {
                id: id.clone(),
                clock,
            },
            |_| Ok(()),
        )
    }
}

impl StatementStore for Repository {
    fn create_statement(
        &self,
        new: NewStatement,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Statement> {
        let id = new.id.clone();
        let clock = self.effective_clock(clock);
        self.record(
            Directive::CreateStatement {
                statement: new,
                clock,
            },
            |tx| {
                storage::get_statement(tx, &id)?
                    .ok_or_else(|| Error::NotFound(format!("statement {}", id)))
            },
        )
    }

    fn find_statement(&self, id: &StmtId) -> Result<Option<Statement>> {
        self.store().transaction(|tx| {
            Ok(storage::get_statement(tx, id)?.filter(|statement| !statement.is_deleted()))
        })
    }

    fn find_all_statements(&self) -> Result<Vec<Statement>> {
        self.store().transaction(|tx| {
            Ok(storage::all_statements(tx)?
                .into_iter()
                .filter(|statement| !statement.is_deleted())
                .collect())
        })
    }

    fn update_statement(
        &self,
        id: &StmtId,
        patch: StatementPatch,
        clock: Option<HybridLogicalClock>,
    ) -> Result<Statement> {
        let clock = self.effective_clock(clock);
        self.record(
            Directive::UpdateStatement {
                id: id.clone(),
                patch,
                clock,
            },
            |tx| {
                storage::get_statement(tx, id)?
                    .filter(|statement| !statement.is_deleted())
                    .ok_or_else(|| Error::NotFound(format!("statement {}", id)))
            },
        )
    }

    fn delete_statement(&self, id: &StmtId, clock: Option<HybridLogicalClock>) -> Result<()> {
        let clock = self.effective_clock(clock);
        self.record(
            Directive::DeleteStatement {
                id: id.clone(),
                clock,
            },
            |_| Ok(()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountType;

    fn repository() -> Repository {
        Repository::new(
            Arc::new(Store::open_in_memory().unwrap()),
            NodeId::parse("AAA").unwrap(),
        )
    }

    fn new_account(name: &str, kind: AccountType) -> NewAccount {
        NewAccount {
            id: AcctId::generate(),
            name: name.to_string(),
            number: None,
            kind,
            description: None,
        }
    }

    #[test]
    fn test_create_and_find_account() {
        let repo = repository();
        let created = repo
            .create_account(new_account("Checking", AccountType::Asset), None)
            .unwrap();

        let found = repo.find_account(&created.id).unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(repo.find_all_accounts().unwrap().len(), 1);
    }

    #[test]
    fn test_deleted_account_is_absent_from_queries() {
        let repo = repository();
        let created = repo
            .create_account(new_account("Scratch", AccountType::Expense), None)
            .unwrap();

        repo.delete_account(&created.id, None).unwrap();
        assert!(repo.find_account(&created.id).unwrap().is_none());
        assert!(repo.find_all_accounts().unwrap().is_empty());
    }

    #[test]
    fn test_update_returns_post_merge_state() {
        let repo = repository();
        let created = repo
            .create_account(new_account("Checking", AccountType::Asset), None)
            .unwrap();

        let updated = repo
            .update_account(
                &created.id,
                AccountPatch {
                    name: Some("Everyday Checking".to_string()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(updated.name.get(), "Everyday Checking");

        // A stale caller-supplied clock leaves the state unchanged
        let stale = repo
            .update_account(
                &created.id,
                AccountPatch {
                    name: Some("Old Name".to_string()),
                    ..Default::default()
                },
                Some(created.name.clock()),
            )
            .unwrap();
        assert_eq!(stale.name.get(), "Everyday Checking");
    }

    #[test]
    fn test_update_of_tombstoned_account_rolls_back_atomically() {
        let repo = repository();
        let created = repo
            .create_account(new_account("Scratch", AccountType::Expense), None)
            .unwrap();
        repo.delete_account(&created.id, None).unwrap();

        let err = repo
            .update_account(
                &created.id,
                AccountPatch {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
                None,
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // The mutation and the failed read-back share one transaction,
        // so the rejected patch left no trace behind the tombstone
        let raw = repo
            .projector()
            .store()
            .transaction(|tx| storage::get_account(tx, &created.id))
            .unwrap()
            .unwrap();
        assert_eq!(raw.name.get(), "Scratch");
    }

    #[test]
    fn test_journal_records_accepted_directives() {
        let journal = Arc::new(MemoryJournal::new());
        let repo = Repository::new(
            Arc::new(Store::open_in_memory().unwrap()),
            NodeId::parse("AAA").unwrap(),
        )
        .with_journal(journal.clone());

        let created = repo
            .create_account(new_account("Checking", AccountType::Asset), None)
            .unwrap();
        repo.update_account(
            &created.id,
            AccountPatch {
                description: Some("main".to_string()),
                ..Default::default()
            },
            None,
        )
        .unwrap();

        // A rejected directive must not be journaled
        let dup = repo.create_account(new_account("Checking", AccountType::Asset), None);
        assert!(dup.is_err());

        let recorded = journal.directives();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].action(), "create_account");
        assert_eq!(recorded[1].action(), "update_account");
    }

    #[test]
    fn test_generated_clocks_are_monotonic_per_writer() {
        let repo = repository();
        let a = repo
            .create_account(new_account("One", AccountType::Asset), None)
            .unwrap();
        let b = repo
            .create_account(new_account("Two", AccountType::Asset), None)
            .unwrap();
        assert!(b.name.clock() > a.name.clock());
    }

    #[test]
    fn test_supplied_remote_clock_advances_local_clock() {
        let repo = repository();
        let far_future = HybridLogicalClock::from_parts(0xFF_0000_0000, 0, NodeId::parse("ZZZ").unwrap());
        let a = repo
            .create_account(new_account("Remote", AccountType::Asset), Some(far_future))
            .unwrap();
        assert_eq!(a.name.clock(), far_future);

        // The next locally-generated clock is causally after the remote one
        let b = repo
            .create_account(new_account("Local", AccountType::Asset), None)
            .unwrap();
        assert!(b.name.clock() > far_future);
    }
}
