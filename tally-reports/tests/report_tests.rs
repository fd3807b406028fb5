//! End-to-end report scenarios: directives in, reports out
//!
//! Each test drives the projection engine with a directive sequence and
//! checks the resulting report views, including the accounting identity
//! assets == liabilities + equity.

use chrono::NaiveDate;
use std::sync::Arc;
use tally_core::{
    AccountType, AcctId, Cents, Directive, Entry, Error as CoreError, HybridLogicalClock,
    NewAccount, NewStatement, NewTransaction, NodeId, Projector, StmtId, Store, TransactionPatch,
    TxnId,
};
use tally_reports::{ReconciliationStatus, ReportEngine, SPLIT_MARKER};

struct Fixture {
    projector: Projector,
    engine: ReportEngine,
    next: u64,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(Store::open_in_memory().unwrap());
        Self {
            projector: Projector::new(store.clone()),
            engine: ReportEngine::new(store),
            next: 0,
        }
    }

    fn tick(&mut self) -> HybridLogicalClock {
        self.next += 1;
        HybridLogicalClock::from_parts(self.next, 0, NodeId::parse("AAA").unwrap())
    }

    fn account(&mut self, name: &str, kind: AccountType) -> AcctId {
        let id = AcctId::generate();
        let clock = self.tick();
        self.projector
            .apply(&Directive::CreateAccount {
                account: NewAccount {
                    id: id.clone(),
                    name: name.to_string(),
                    number: None,
                    kind,
                    description: None,
                },
                clock,
            })
            .unwrap();
        id
    }

    fn transaction(&mut self, date: NaiveDate, description: &str, entries: Vec<Entry>) -> TxnId {
        let id = TxnId::generate();
        let clock = self.tick();
        self.projector
            .apply(&Directive::CreateTransaction {
                transaction: NewTransaction {
                    id: id.clone(),
                    date,
                    code: None,
                    vendor: None,
                    description: Some(description.to_string()),
                    entries,
                },
                clock,
            })
            .unwrap();
        id
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
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
fn test_paycheck_shows_on_balance_sheet_and_income_statement() {
    let mut fx = Fixture::new();
    fx.account("Checking", AccountType::Asset);
    fx.account("Salary", AccountType::Income);
    fx.transaction(
        date(2024, 1, 15),
        "January paycheck",
        vec![entry("Checking", 10_000, 0), entry("Salary", 0, 10_000)],
    );

    let sheet = fx.engine.balance_sheet(date(2024, 1, 31)).unwrap();
    assert_eq!(sheet.assets.len(), 1);
    assert_eq!(sheet.assets[0].account, "Checking");
    assert_eq!(sheet.assets[0].amount.to_string(), "$100.00");
    assert_eq!(sheet.total_assets.to_string(), "$100.00");
    assert_eq!(sheet.equity.len(), 1);
    assert_eq!(sheet.equity[0].account, "Net Worth");
    assert_eq!(sheet.total_equity.to_string(), "$100.00");

    let income = fx
        .engine
        .income_statement(date(2024, 1, 1), date(2024, 1, 31))
        .unwrap();
    assert_eq!(income.income.len(), 1);
    assert_eq!(income.income[0].account, "Salary");
    assert_eq!(income.total_income.to_string(), "$100.00");
    assert_eq!(income.net_income.to_string(), "$100.00");
}

#[test]
fn test_balance_sheet_identity_holds_with_liabilities() {
    let mut fx = Fixture::new();
    fx.account("Checking", AccountType::Asset);
    fx.account("Credit Card", AccountType::Liability);
    fx.account("Salary", AccountType::Income);
    fx.account("Groceries", AccountType::Expense);

    fx.transaction(
        date(2024, 2, 1),
        "Paycheck",
        vec![entry("Checking", 250_000, 0), entry("Salary", 0, 250_000)],
    );
    fx.transaction(
        date(2024, 2, 10),
        "Groceries on the card",
        vec![entry("Groceries", 8_750, 0), entry("Credit Card", 0, 8_750)],
    );

    let sheet = fx.engine.balance_sheet(date(2024, 2, 28)).unwrap();
    assert_eq!(sheet.total_assets, Cents(250_000));
    assert_eq!(sheet.total_liabilities, Cents(8_750));
    assert_eq!(sheet.total_equity, Cents(241_250));
    assert_eq!(
        sheet.total_assets,
        sheet.total_liabilities + sheet.total_equity
    );
}

#[test]
fn test_register_is_reverse_chronological_with_running_balances() {
    let mut fx = Fixture::new();
    let checking = fx.account("Checking", AccountType::Asset);
    fx.account("Salary", AccountType::Income);
    fx.account("Rent", AccountType::Expense);
    fx.account("Groceries", AccountType::Expense);

    fx.transaction(
        date(2024, 3, 1),
        "Paycheck",
        vec![entry("Checking", 200_000, 0), entry("Salary", 0, 200_000)],
    );
    fx.transaction(
        date(2024, 3, 2),
        "Rent",
        vec![entry("Rent", 120_000, 0), entry("Checking", 0, 120_000)],
    );
    fx.transaction(
        date(2024, 3, 9),
        "Split shop",
        vec![
            entry("Groceries", 4_000, 0),
            entry("Rent", 1_000, 0),
            entry("Checking", 0, 5_000),
        ],
    );

    let register = fx.engine.register(&checking).unwrap().unwrap();
    assert_eq!(register.account, "Checking");
    assert_eq!(register.rows.len(), 3);

    // Newest first
    assert_eq!(register.rows[0].date, date(2024, 3, 9));
    assert_eq!(register.rows[2].date, date(2024, 3, 1));

    // Balances accumulate oldest to newest
    assert_eq!(register.rows[2].balance, Cents(200_000));
    assert_eq!(register.rows[1].balance, Cents(80_000));
    assert_eq!(register.rows[0].balance, Cents(75_000));

    // Offset labels
    assert_eq!(register.rows[2].offset_account, "Salary");
    assert_eq!(register.rows[1].offset_account, "Rent");
    assert_eq!(register.rows[0].offset_account, SPLIT_MARKER);
}

#[test]
fn test_deleted_transaction_disappears_from_all_reports() {
    let mut fx = Fixture::new();
    let checking = fx.account("Checking", AccountType::Asset);
    fx.account("Salary", AccountType::Income);
    let txn = fx.transaction(
        date(2024, 4, 1),
        "Paycheck",
        vec![entry("Checking", 10_000, 0), entry("Salary", 0, 10_000)],
    );

    let clock = fx.tick();
    fx.projector
        .apply(&Directive::DeleteTransaction { id: txn.clone(), clock })
        .unwrap();

    let sheet = fx.engine.balance_sheet(date(2024, 4, 30)).unwrap();
    assert!(sheet.assets.is_empty());

    let register = fx.engine.register(&checking).unwrap().unwrap();
    assert!(register.rows.is_empty());

    assert!(fx.engine.transaction_detail(&txn).unwrap().is_none());
}

#[test]
fn test_delete_account_with_postings_is_rejected() {
    let mut fx = Fixture::new();
    let checking = fx.account("Checking", AccountType::Asset);
    fx.account("Salary", AccountType::Income);
    fx.transaction(
        date(2024, 5, 1),
        "Paycheck",
        vec![entry("Checking", 10_000, 0), entry("Salary", 0, 10_000)],
    );

    let clock = fx.tick();
    let err = fx
        .projector
        .apply(&Directive::DeleteAccount {
            id: checking.clone(),
            clock,
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::InUse(_)));

    // Account still reports
    assert!(fx.engine.register(&checking).unwrap().is_some());
}

#[test]
fn test_statement_linkage_drives_reconciliation_status() {
    let mut fx = Fixture::new();
    fx.account("Checking", AccountType::Asset);
    fx.account("Salary", AccountType::Income);
    let txn = fx.transaction(
        date(2024, 6, 3),
        "Paycheck",
        vec![entry("Checking", 10_000, 0), entry("Salary", 0, 10_000)],
    );

    let stmt = StmtId::generate();
    let clock = fx.tick();
    fx.projector
        .apply(&Directive::CreateStatement {
            statement: NewStatement {
                id: stmt.clone(),
                account: "Checking".to_string(),
                begin_date: date(2024, 6, 1),
                end_date: date(2024, 6, 30),
                beginning_balance: Cents::ZERO,
                ending_balance: Cents(10_000),
                reconciled: false,
                transactions: vec![txn.clone()],
            },
            clock,
        })
        .unwrap();

    let detail = fx.engine.transaction_detail(&txn).unwrap().unwrap();
    let checking_entry = detail
        .entries
        .iter()
        .find(|e| e.account == "Checking")
        .unwrap();
    let salary_entry = detail
        .entries
        .iter()
        .find(|e| e.account == "Salary")
        .unwrap();
    assert_eq!(checking_entry.status, Some(ReconciliationStatus::Pending));
    assert_eq!(salary_entry.status, None);

    // Reconcile the statement and the status follows
    let clock = fx.tick();
    fx.projector
        .apply(&Directive::UpdateStatement {
            id: stmt,
            patch: tally_core::StatementPatch {
                reconciled: Some(true),
                ..Default::default()
            },
            clock,
        })
        .unwrap();

    let detail = fx.engine.transaction_detail(&txn).unwrap().unwrap();
    let checking_entry = detail
        .entries
        .iter()
        .find(|e| e.account == "Checking")
        .unwrap();
    assert_eq!(
        checking_entry.status,
        Some(ReconciliationStatus::Reconciled)
    );
}

#[test]
fn test_updated_entries_replace_the_register_wholesale() {
    let mut fx = Fixture::new();
    let checking = fx.account("Checking", AccountType::Asset);
    fx.account("Salary", AccountType::Income);
    let txn = fx.transaction(
        date(2024, 7, 1),
        "Paycheck",
        vec![entry("Checking", 10_000, 0), entry("Salary", 0, 10_000)],
    );

    let clock = fx.tick();
    fx.projector
        .apply(&Directive::UpdateTransaction {
            id: txn,
            patch: TransactionPatch {
                entries: Some(vec![
                    entry("Checking", 12_500, 0),
                    entry("Salary", 0, 12_500),
                ]),
                ..Default::default()
            },
            clock,
        })
        .unwrap();

    let register = fx.engine.register(&checking).unwrap().unwrap();
    assert_eq!(register.rows.len(), 1);
    assert_eq!(register.rows[0].debit, Cents(12_500));
    assert_eq!(register.rows[0].balance, Cents(12_500));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Property: assets == liabilities + equity for any mix of
        /// flows, and with all flows on income/expense accounts the
        /// derived equity equals net income
        #[test]
        fn prop_balance_sheet_identity_holds(
            amounts in prop::collection::vec(1i64..100_000, 1..12),
        ) {
            let mut fx = Fixture::new();
            fx.account("Checking", AccountType::Asset);
            fx.account("Credit Card", AccountType::Liability);
            fx.account("Salary", AccountType::Income);
            fx.account("Groceries", AccountType::Expense);

            for (i, amount) in amounts.iter().enumerate() {
                let (debit, credit) = match i % 3 {
                    0 => ("Checking", "Salary"),
                    1 => ("Groceries", "Credit Card"),
                    _ => ("Groceries", "Checking"),
                };
                fx.transaction(
                    date(2024, 8, 1 + (i as u32 % 28)),
                    "flow",
                    vec![entry(debit, *amount, 0), entry(credit, 0, *amount)],
                );
            }

            let sheet = fx.engine.balance_sheet(date(2024, 12, 31)).unwrap();
            prop_assert_eq!(
                sheet.total_assets,
                sheet.total_liabilities + sheet.total_equity
            );

            let income = fx
                .engine
                .income_statement(date(2024, 1, 1), date(2024, 12, 31))
                .unwrap();
            prop_assert_eq!(sheet.total_equity, income.net_income);
        }
    }
}
