use std::{collections::BTreeMap, sync::Arc, thread};

use chrono::{Duration, TimeZone, Utc};

use engine::{
    Currency, Engine, EngineError, EntryKind, ErrorKind, ExpenseCmd, GroupKey, LogStore,
    MAX_LEDGER_TOTAL, MemberId, MemoryStore, Money, PaymentCmd, PercentShare, Scope, Share,
    SplitPolicy, TransactionLog, Transfer, VoidCmd,
};

fn engine_with(members: &[&str]) -> Engine {
    let engine = Engine::builder()
        .log(TransactionLog::new(Currency::Inr))
        .build()
        .unwrap();
    for id in members {
        engine.add_member(*id, &id.to_uppercase()).unwrap();
    }
    engine
}

fn m(id: &str) -> MemberId {
    MemberId::from(id)
}

fn at(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
}

fn expense(payer: &str, minor: i64, split: SplitPolicy) -> ExpenseCmd {
    ExpenseCmd::new(payer, Money::new(minor), split, at(1))
}

fn payment(payer: &str, payee: &str, minor: i64) -> PaymentCmd {
    PaymentCmd::new(payer, payee, Money::new(minor), at(2))
}

#[test]
fn even_split_between_three_members() {
    let engine = engine_with(&["a", "b", "c"]);
    engine
        .record_expense(expense("a", 9000, SplitPolicy::even(["a", "b", "c"])))
        .unwrap();

    assert_eq!(
        engine.compute_balance(&m("a"), &m("b"), Scope::Global).unwrap(),
        Money::new(3000)
    );
    assert_eq!(
        engine.compute_balance(&m("a"), &m("c"), Scope::Global).unwrap(),
        Money::new(3000)
    );
    assert_eq!(
        engine.compute_balance(&m("b"), &m("a"), Scope::Global).unwrap(),
        Money::new(-3000)
    );
    assert_eq!(
        engine.compute_balance(&m("b"), &m("c"), Scope::Global).unwrap(),
        Money::ZERO
    );

    let net = engine.compute_net_balance(&m("a"), Scope::Global).unwrap();
    assert_eq!(
        net,
        BTreeMap::from([(m("b"), Money::new(3000)), (m("c"), Money::new(3000))])
    );
}

#[test]
fn chain_of_debts_settles_in_one_transfer() {
    let engine = engine_with(&["a", "b", "c"]);
    // b owes a 10, c owes b 10
    engine
        .record_expense(expense("a", 1000, SplitPolicy::even(["b"])))
        .unwrap();
    engine
        .record_expense(expense("b", 1000, SplitPolicy::even(["c"])))
        .unwrap();

    let plan = engine.simplify_debts(&[], Scope::Global).unwrap();
    assert_eq!(
        plan,
        vec![Transfer {
            from: m("c"),
            to: m("a"),
            amount: Money::new(1000),
        }]
    );

    let pairwise = engine.pairwise_plan(Scope::Global).unwrap();
    assert_eq!(pairwise.len(), 2);
}

#[test]
fn rejected_exact_split_leaves_log_untouched() {
    let engine = engine_with(&["a", "b"]);
    let before = engine.version().unwrap();

    let err = engine
        .record_expense(expense(
            "a",
            10000,
            SplitPolicy::exact(vec![
                Share::new("a", Money::new(4900)),
                Share::new("b", Money::new(5000)),
            ]),
        ))
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidSplit(_)));
    assert_eq!(engine.version().unwrap(), before);
    assert!(engine.snapshot().unwrap().entries().next().is_none());
}

#[test]
fn percentage_split_assigns_leftover_units() {
    let engine = engine_with(&["a", "b", "c"]);
    let id = engine
        .record_expense(expense(
            "a",
            100,
            SplitPolicy::percentage(vec![
                PercentShare::new("a", 3334),
                PercentShare::new("b", 3333),
                PercentShare::new("c", 3333),
            ]),
        ))
        .unwrap();

    let snapshot = engine.snapshot().unwrap();
    let Some(engine::LedgerEntry::Expense(recorded)) = snapshot.entry(id) else {
        panic!("expense not found");
    };
    let total: Money = recorded.shares.iter().map(|s| s.amount).sum();
    assert_eq!(total, Money::new(100));
    assert_eq!(recorded.share_of(&m("a")), Money::new(34));
}

#[test]
fn payment_reduces_what_the_payer_owes() {
    let engine = engine_with(&["a", "b"]);
    engine
        .record_expense(expense("a", 2000, SplitPolicy::even(["a", "b"])))
        .unwrap();
    assert_eq!(
        engine.compute_balance(&m("b"), &m("a"), Scope::Global).unwrap(),
        Money::new(-1000)
    );

    engine.record_payment(payment("b", "a", 400)).unwrap();
    assert_eq!(
        engine.compute_balance(&m("b"), &m("a"), Scope::Global).unwrap(),
        Money::new(-600)
    );

    engine.record_payment(payment("b", "a", 600)).unwrap();
    assert!(
        engine
            .compute_net_balance(&m("a"), Scope::Global)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn payment_validation() {
    let engine = engine_with(&["a", "b"]);

    let err = engine.record_payment(payment("a", "a", 100)).unwrap_err();
    assert!(matches!(err, EngineError::SamePayerPayee(_)));

    let err = engine.record_payment(payment("a", "b", 0)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine.record_payment(payment("a", "zed", 100)).unwrap_err();
    assert!(matches!(err, EngineError::UnknownMember(_)));

    assert_eq!(engine.version().unwrap(), 2);
}

#[test]
fn expense_in_group_requires_membership() {
    let engine = engine_with(&["a", "b", "c"]);
    let group = engine.new_group("Flat", ["a", "b"]).unwrap();

    let err = engine
        .record_expense(expense("a", 900, SplitPolicy::even(["a", "b", "c"])).group(group))
        .unwrap_err();
    assert!(matches!(err, EngineError::NotInGroup { .. }));

    engine
        .record_expense(expense("a", 900, SplitPolicy::even(["a", "b"])).group(group))
        .unwrap();
    engine
        .record_payment(payment("c", "a", 500))
        .unwrap();

    assert_eq!(
        engine
            .compute_balance(&m("a"), &m("b"), Scope::Group(group))
            .unwrap(),
        Money::new(450)
    );
    assert_eq!(
        engine.compute_balance(&m("a"), &m("c"), Scope::Direct).unwrap(),
        Money::new(-500)
    );
    assert_eq!(
        engine.net_balance_by_group(&m("a")).unwrap(),
        BTreeMap::from([
            (GroupKey::Direct, Money::new(-500)),
            (GroupKey::Group(group), Money::new(450)),
        ])
    );
}

#[test]
fn group_names_are_unique_ignoring_case_and_accents() {
    let engine = engine_with(&["a"]);
    engine.new_group("Café Crew", ["a"]).unwrap();

    let err = engine.new_group("  cafe crew ", ["a"]).unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let found = engine.group_by_name("CAFE CREW").unwrap();
    assert_eq!(found.name, "Café Crew");
}

#[test]
fn void_cancels_an_entry_once() {
    let engine = engine_with(&["a", "b"]);
    let id = engine
        .record_expense(expense("a", 1000, SplitPolicy::even(["a", "b"])))
        .unwrap();

    let void = engine
        .void_entry(VoidCmd::new(id, "a", at(3)).reason("typo"))
        .unwrap();
    assert_eq!(
        engine.compute_balance(&m("a"), &m("b"), Scope::Global).unwrap(),
        Money::ZERO
    );

    let snapshot = engine.snapshot().unwrap();
    assert!(snapshot.entry(id).is_some());
    assert_eq!(snapshot.voided_by(id), Some(void));

    let err = engine.void_entry(VoidCmd::new(id, "a", at(4))).unwrap_err();
    assert!(matches!(&err, EngineError::InvalidVoid(msg) if msg.contains("already voided")));
    let err = engine.void_entry(VoidCmd::new(void, "a", at(4))).unwrap_err();
    assert!(matches!(&err, EngineError::InvalidVoid(msg) if msg.contains("itself a void")));
    let err = engine
        .void_entry(VoidCmd::new(engine::EntryId::new(), "a", at(4)))
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[test]
fn ledger_total_is_capped() {
    let engine = engine_with(&["a", "b"]);
    let half = Money::new(i64::MAX / 2 + 1);
    let err = engine
        .record_expense(ExpenseCmd::new(
            "a",
            half,
            SplitPolicy::exact(vec![Share::new("b", half)]),
            at(1),
        ))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    engine
        .record_expense(ExpenseCmd::new(
            "a",
            MAX_LEDGER_TOTAL,
            SplitPolicy::exact(vec![Share::new("b", MAX_LEDGER_TOTAL)]),
            at(1),
        ))
        .unwrap();
    let version = engine.version().unwrap();
    let err = engine.record_payment(payment("b", "a", 1)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert_eq!(engine.version().unwrap(), version);

    assert_eq!(
        engine.compute_balance(&m("a"), &m("b"), Scope::Global).unwrap(),
        MAX_LEDGER_TOTAL
    );
    assert_eq!(engine.simplify_debts(&[], Scope::Global).unwrap().len(), 1);
    assert_eq!(engine.audit(Scope::Global).unwrap(), 1);
}

#[test]
fn stale_expected_version_is_rejected() {
    let engine = engine_with(&["a", "b"]);
    let version = engine.version().unwrap();

    engine
        .record_expense(
            expense("a", 1000, SplitPolicy::even(["a", "b"])).expected_version(version),
        )
        .unwrap();

    let err = engine
        .record_payment(payment("b", "a", 500).expected_version(version))
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ConcurrentModification {
            expected: version,
            actual: version + 1,
        }
    );
    assert!(err.is_retryable());
    assert_eq!(engine.version().unwrap(), version + 1);
}

#[test]
fn concurrent_writers_lose_nothing() {
    let engine = engine_with(&["a", "b", "c", "d"]);
    let start = engine.version().unwrap();

    let handles: Vec<_> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|payer| {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    engine
                        .record_expense(expense(
                            payer,
                            400,
                            SplitPolicy::even(["a", "b", "c", "d"]),
                        ))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.version().unwrap(), start + 100);
    // Everyone paid the same, so nobody owes anything.
    assert!(engine.net_positions(Scope::Global).unwrap().is_empty());
    assert_eq!(engine.audit(Scope::Global).unwrap(), 100);
}

#[test]
fn snapshot_is_not_affected_by_later_appends() {
    let engine = engine_with(&["a", "b"]);
    let snapshot = engine.snapshot().unwrap();
    engine
        .record_expense(expense("a", 1000, SplitPolicy::even(["a", "b"])))
        .unwrap();

    assert_eq!(snapshot.entries().count(), 0);
    assert_eq!(engine.snapshot().unwrap().entries().count(), 1);
}

#[test]
fn store_replay_restores_the_same_balances() {
    let store: Arc<dyn LogStore> = Arc::new(MemoryStore::new(Currency::Eur));
    let engine = Engine::builder().store(Arc::clone(&store)).build().unwrap();
    for id in ["a", "b", "c"] {
        engine.add_member(id, id).unwrap();
    }
    engine
        .record_expense(expense("a", 3000, SplitPolicy::even(["a", "b", "c"])))
        .unwrap();
    engine.record_payment(payment("b", "a", 1000)).unwrap();

    assert_eq!(store.load().unwrap().version(), engine.version().unwrap());

    let replayed = Engine::builder().store(Arc::clone(&store)).build().unwrap();
    assert_eq!(replayed.currency().unwrap(), Currency::Eur);
    assert_eq!(
        replayed.net_positions(Scope::Global).unwrap(),
        engine.net_positions(Scope::Global).unwrap()
    );

    let err = Engine::builder()
        .store(store)
        .currency(Currency::Usd)
        .build()
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
}

#[test]
fn members_with_open_balances_cannot_leave() {
    let engine = engine_with(&["a", "b"]);
    let group = engine.new_group("Trip", ["a", "b"]).unwrap();
    engine
        .record_expense(expense("a", 1000, SplitPolicy::even(["a", "b"])).group(group))
        .unwrap();

    let err = engine.remove_group_member(group, &m("b")).unwrap_err();
    assert!(matches!(err, EngineError::MemberInUse(_)));

    engine
        .record_payment(payment("b", "a", 500).group(group))
        .unwrap();
    engine.remove_group_member(group, &m("b")).unwrap();
    assert!(!engine.group(group).unwrap().contains(&m("b")));

    engine.remove_member(&m("b")).unwrap();
    let err = engine.member(&m("b")).unwrap_err();
    assert!(matches!(err, EngineError::UnknownMember(_)));

    let err = engine.remove_member(&m("a")).unwrap_err();
    assert!(matches!(err, EngineError::MemberInUse(_)));
}

#[test]
fn summary_splits_owed_and_owing() {
    let engine = engine_with(&["a", "b", "c"]);
    let group = engine.new_group("Flat", ["a", "b", "c"]).unwrap();
    engine
        .record_expense(expense("a", 3000, SplitPolicy::even(["a", "b", "c"])).group(group))
        .unwrap();
    engine
        .record_expense(expense("c", 800, SplitPolicy::even(["a"])))
        .unwrap();

    let summary = engine.summary(&m("a")).unwrap();
    assert_eq!(summary.you_are_owed, Money::new(1000 + 200));
    assert_eq!(summary.you_owe, Money::ZERO);
    assert_eq!(summary.net, Money::new(1200));
    assert_eq!(summary.by_member.len(), 2);
    assert_eq!(summary.by_member[0].name, "B");

    let by_group: Vec<_> = summary
        .by_group
        .iter()
        .map(|g| (g.name.as_str(), g.amount))
        .collect();
    assert_eq!(
        by_group,
        vec![("Direct", Money::new(-800)), ("Flat", Money::new(2000))]
    );

    let summary = engine.summary(&m("b")).unwrap();
    assert_eq!(summary.you_owe, Money::new(1000));
    assert_eq!(summary.net, Money::new(-1000));
}

#[test]
fn activity_lists_newest_first() {
    let engine = engine_with(&["a", "b", "c"]);
    let first = engine
        .record_expense(
            ExpenseCmd::new("a", Money::new(600), SplitPolicy::even(["a", "b"]), at(1))
                .description("Groceries"),
        )
        .unwrap();
    engine
        .record_payment(PaymentCmd::new("c", "a", Money::new(100), at(1) + Duration::hours(1)))
        .unwrap();
    engine
        .void_entry(VoidCmd::new(first, "a", at(5)))
        .unwrap();

    let feed = engine.activity(Some(&m("b")), Scope::Global, 10).unwrap();
    let kinds: Vec<_> = feed.iter().map(|item| item.kind).collect();
    assert_eq!(kinds, vec![EntryKind::Void, EntryKind::Expense]);
    assert!(feed[1].voided);
    assert_eq!(feed[1].description, "Groceries");
    assert_eq!(feed[1].impact, Some(Money::new(-300)));
    assert_eq!(feed[0].impact, Some(Money::new(300)));

    let all = engine.activity(None, Scope::Global, 2).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].kind, EntryKind::Void);
}

#[test]
fn group_overview_reports_spend_and_balance() {
    let engine = engine_with(&["a", "b"]);
    let flat = engine.new_group("Flat", ["a", "b"]).unwrap();
    let trip = engine.new_group("Trip", ["a", "b"]).unwrap();
    engine
        .record_expense(
            ExpenseCmd::new("a", Money::new(5000), SplitPolicy::even(["a", "b"]), at(2))
                .group(trip),
        )
        .unwrap();
    engine
        .record_expense(
            ExpenseCmd::new("b", Money::new(1000), SplitPolicy::even(["a", "b"]), at(1))
                .group(flat),
        )
        .unwrap();

    let overview = engine.group_overview(Some(&m("a"))).unwrap();
    assert_eq!(overview.len(), 2);
    assert_eq!(overview[0].name, "Trip");
    assert_eq!(overview[0].total_spent, Money::new(5000));
    assert_eq!(overview[0].balance, Some(Money::new(2500)));
    assert_eq!(overview[1].balance, Some(Money::new(-500)));
    assert_eq!(overview[1].member_count, 2);
}

#[test]
fn simplify_for_a_subset_must_balance() {
    let engine = engine_with(&["a", "b", "c"]);
    engine
        .record_expense(expense("a", 900, SplitPolicy::even(["a", "b", "c"])))
        .unwrap();

    let err = engine
        .simplify_debts(&[m("a"), m("b")], Scope::Global)
        .unwrap_err();
    assert!(matches!(err, EngineError::UnbalancedSelection(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let plan = engine
        .simplify_debts(&[m("a"), m("b"), m("c")], Scope::Global)
        .unwrap();
    assert_eq!(plan.len(), 2);
    assert!(plan.iter().all(|t| t.to == m("a") && t.amount == Money::new(300)));
}

#[test]
fn unknown_scope_and_members_are_rejected() {
    let engine = engine_with(&["a"]);
    let err = engine
        .compute_net_balance(&m("a"), Scope::Group(engine::GroupId::new()))
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownGroup(_)));

    let err = engine.compute_balance(&m("a"), &m("nobody"), Scope::Global).unwrap_err();
    assert!(matches!(err, EngineError::UnknownMember(_)));
}
