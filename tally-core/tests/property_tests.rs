//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Clock ordering: encoded form sorts exactly like causal order
//! - Monotonicity: advance and merge always move forward
//! - Balance: unbalanced entry sets never validate
//! - Convergence: delivery order never changes the final snapshot

use proptest::prelude::*;
use std::sync::Arc;
use tally_core::{
    AccountPatch, AccountType, AcctId, Cents, Directive, Entry, HybridLogicalClock, NewAccount,
    NewTransaction, NodeId, Projector, Store, TxnId,
};

/// Strategy for generating node ids
fn node_strategy() -> impl Strategy<Value = NodeId> {
    "[0-9A-Z]{3}".prop_map(|s| NodeId::parse(&s).unwrap())
}

/// Strategy for generating arbitrary clock values
fn clock_strategy() -> impl Strategy<Value = HybridLogicalClock> {
    (0u64..0xFF_FFFF_FFFF, 0u16..0xFFF, node_strategy())
        .prop_map(|(time, counter, node)| HybridLogicalClock::from_parts(time, counter, node))
}

/// Strategy for generating positive amounts in cents
fn amount_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_00
}

/// Strategy for one field patch against a single account
fn patch_strategy() -> impl Strategy<Value = AccountPatch> {
    prop_oneof![
        "[a-z]{1,16}".prop_map(|name| AccountPatch {
            name: Some(name),
            ..Default::default()
        }),
        "[a-z0-9-]{1,8}".prop_map(|number| AccountPatch {
            number: Some(number),
            ..Default::default()
        }),
        "[a-z ]{0,24}".prop_map(|description| AccountPatch {
            description: Some(description.trim().to_string()),
            ..Default::default()
        }),
    ]
}

/// Patches stamped with strictly increasing clocks, plus a shuffled
/// application order for the same set
fn patches_with_shuffle() -> impl Strategy<Value = (Vec<AccountPatch>, Vec<usize>)> {
    prop::collection::vec(patch_strategy(), 1..8).prop_flat_map(|patches| {
        let order: Vec<usize> = (0..patches.len()).collect();
        (Just(patches), Just(order).prop_shuffle())
    })
}

fn entry(account: &str, debit: i64, credit: i64) -> Entry {
    Entry {
        account: account.to_string(),
        debit: Cents(debit),
        credit: Cents(credit),
        comment: None,
    }
}

fn projector() -> Projector {
    Projector::new(Arc::new(Store::open_in_memory().unwrap()))
}

fn create_account(id: &AcctId) -> Directive {
    Directive::CreateAccount {
        account: NewAccount {
            id: id.clone(),
            name: "Checking".to_string(),
            number: None,
            kind: AccountType::Asset,
            description: None,
        },
        clock: HybridLogicalClock::from_parts(1, 0, NodeId::parse("AAA").unwrap()),
    }
}

fn load_account(projector: &Projector, id: &AcctId) -> tally_core::Account {
    projector
        .store()
        .transaction(|tx| tally_core::storage::get_account(tx, id))
        .unwrap()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: lexicographic order of the encoded clock agrees with
    /// causal order
    #[test]
    fn prop_encoded_order_matches_causal_order(
        a in clock_strategy(),
        b in clock_strategy(),
    ) {
        prop_assert_eq!(a.cmp(&b), a.to_string().cmp(&b.to_string()));
    }

    /// Property: every clock survives an encode/parse round trip
    #[test]
    fn prop_clock_round_trip(clock in clock_strategy()) {
        let parsed: HybridLogicalClock = clock.to_string().parse().unwrap();
        prop_assert_eq!(parsed, clock);
    }

    /// Property: advance is strictly monotonic from any starting point
    #[test]
    fn prop_advance_is_strictly_monotonic(clock in clock_strategy()) {
        let next = clock.advance();
        prop_assert!(next > clock);
        prop_assert_eq!(next.node(), clock.node());
    }

    /// Property: merge dominates both inputs and keeps the local node
    #[test]
    fn prop_merge_dominates_both(a in clock_strategy(), b in clock_strategy()) {
        let merged = a.merge(&b);
        prop_assert!(merged > a);
        prop_assert!(merged.time_ms() > b.time_ms()
            || (merged.time_ms() == b.time_ms() && merged.counter() > b.counter()));
        prop_assert_eq!(merged.node(), a.node());
    }

    /// Property: dollar formatting round-trips every cent amount
    #[test]
    fn prop_money_round_trip(cents in -1_000_000_000_000i64..1_000_000_000_000) {
        let amount = Cents(cents);
        let parsed = Cents::parse(&amount.to_string()).unwrap();
        prop_assert_eq!(parsed, amount);
    }

    /// Property: a transaction whose debits and credits differ never
    /// validates
    #[test]
    fn prop_unbalanced_transaction_rejected(
        debit in amount_strategy(),
        credit in amount_strategy(),
    ) {
        prop_assume!(debit != credit);
        let directive = Directive::CreateTransaction {
            transaction: NewTransaction {
                id: TxnId::generate(),
                date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                code: None,
                vendor: None,
                description: Some("unbalanced".to_string()),
                entries: vec![entry("Checking", debit, 0), entry("Salary", 0, credit)],
            },
            clock: HybridLogicalClock::init(NodeId::parse("AAA").unwrap()),
        };
        prop_assert!(directive.validate().is_err());
    }

    /// Property: a balanced two-entry transaction always validates
    #[test]
    fn prop_balanced_transaction_accepted(amount in amount_strategy()) {
        let directive = Directive::CreateTransaction {
            transaction: NewTransaction {
                id: TxnId::generate(),
                date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                code: None,
                vendor: None,
                description: Some("balanced".to_string()),
                entries: vec![entry("Checking", amount, 0), entry("Salary", 0, amount)],
            },
            clock: HybridLogicalClock::init(NodeId::parse("AAA").unwrap()),
        };
        prop_assert!(directive.validate().is_ok());
    }

    /// Property: the same update set converges to the same account no
    /// matter the order it is delivered in
    #[test]
    fn prop_updates_converge_under_any_delivery_order(
        (patches, order) in patches_with_shuffle(),
    ) {
        let id = AcctId::generate();
        let node = NodeId::parse("AAA").unwrap();

        let directives: Vec<Directive> = patches
            .iter()
            .enumerate()
            .map(|(i, patch)| Directive::UpdateAccount {
                id: id.clone(),
                patch: patch.clone(),
                clock: HybridLogicalClock::from_parts(100 + i as u64, 0, node),
            })
            .collect();

        let in_order = projector();
        in_order.apply(&create_account(&id)).unwrap();
        for directive in &directives {
            in_order.apply(directive).unwrap();
        }

        let shuffled = projector();
        shuffled.apply(&create_account(&id)).unwrap();
        for i in &order {
            shuffled.apply(&directives[*i]).unwrap();
        }

        prop_assert_eq!(load_account(&in_order, &id), load_account(&shuffled, &id));
    }

    /// Property: re-delivering a directive is a no-op (equal clocks
    /// never win)
    #[test]
    fn prop_duplicate_delivery_is_idempotent(patch in patch_strategy()) {
        let id = AcctId::generate();
        let directive = Directive::UpdateAccount {
            id: id.clone(),
            patch,
            clock: HybridLogicalClock::from_parts(500, 0, NodeId::parse("AAA").unwrap()),
        };

        let projector = projector();
        projector.apply(&create_account(&id)).unwrap();
        projector.apply(&directive).unwrap();
        let once = load_account(&projector, &id);

        projector.apply(&directive).unwrap();
        let twice = load_account(&projector, &id);

        prop_assert_eq!(once, twice);
    }
}
