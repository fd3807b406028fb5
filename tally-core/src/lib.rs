//! Tally Ledger Core
//!
//! A personal double-entry ledger maintained as an append-only,
//! replayable directive log that multiple independent writers may
//! extend concurrently. This crate is the merge half of the engine:
//! a hybrid logical clock orders field-level edits across writers, and
//! a projection engine folds directives into a relational snapshot with
//! per-field last-writer-wins conflict resolution.
//!
//! # Invariants
//!
//! - Double-entry balance: Σ(debits) == Σ(credits) per transaction
//! - Convergence: the same directive set yields the same snapshot
//!   regardless of delivery order
//! - Tombstones: entities are soft-deleted, never physically removed
//! - All-or-nothing: each directive is one atomic storage transaction

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod clock;
pub mod config;
pub mod directive;
pub mod error;
pub mod ids;
pub mod money;
pub mod projection;
pub mod repository;
pub mod storage;
pub mod types;

// Re-exports
pub use clock::{HybridLogicalClock, NodeId};
pub use config::Config;
pub use directive::{
    AccountPatch, Directive, NewAccount, NewStatement, NewTransaction, NewVendor, StatementPatch,
    TransactionPatch, VendorPatch,
};
pub use error::{Error, Result};
pub use ids::{AcctId, StmtId, TxnId, VndrId};
pub use money::Cents;
pub use projection::{Projector, ReplaySummary};
pub use repository::{
    AccountStore, Journal, MemoryJournal, Repository, StatementStore, TransactionStore,
    VendorStore,
};
pub use storage::Store;
pub use types::{Account, AccountType, Entry, Lww, Statement, Transaction, Vendor};
