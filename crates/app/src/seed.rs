//! Demo dataset: four groups around one member (`you`), with the debts the
//! dashboard mock-ups show. Amounts are given in major units and converted
//! once, here.

use chrono::{DateTime, TimeZone, Utc};
use engine::{Engine, ExpenseCmd, Money, PaymentCmd, Share, SplitPolicy};

use crate::error::AppError;

const MEMBERS: [(&str, &str); 9] = [
    ("you", "You"),
    ("alice", "Alice"),
    ("bob", "Bob"),
    ("charlie", "Charlie"),
    ("david", "David"),
    ("emily", "Emily"),
    ("frank", "Frank"),
    ("grace", "Grace"),
    ("henry", "Henry"),
];

const GROUPS: [(&str, &[&str]); 4] = [
    ("Apartment Buddies", &["you", "alice", "bob", "frank", "grace"]),
    ("Dinner Club", &["you", "alice", "charlie", "david"]),
    ("Vacation 2025", &["you", "emily", "frank", "henry"]),
    ("Work Lunch", &["you", "emily", "henry"]),
];

/// `(group, payer, debtor, description, amount, day of June 2025)`: the
/// payer covered the debtor's share.
const DEBTS: [(&str, &str, &str, &str, f64, u32); 12] = [
    ("Apartment Buddies", "alice", "you", "Your share of rent", 50.0, 1),
    ("Apartment Buddies", "bob", "you", "Electricity bill contribution", 25.0, 2),
    ("Dinner Club", "charlie", "you", "Share of last dinner", 30.0, 5),
    ("Dinner Club", "david", "you", "Coffee shop payment", 12.5, 6),
    ("Apartment Buddies", "frank", "you", "Internet bill", 20.0, 7),
    ("Dinner Club", "alice", "you", "Drinks", 8.0, 8),
    ("Vacation 2025", "you", "emily", "Your share of flight", 100.0, 10),
    ("Vacation 2025", "you", "frank", "Hotel deposit share", 80.0, 10),
    ("Apartment Buddies", "you", "grace", "Groceries (your share)", 20.5, 8),
    ("Work Lunch", "you", "henry", "Lunch reimbursement", 15.0, 7),
    ("Vacation 2025", "you", "henry", "Car rental", 30.0, 9),
    ("Work Lunch", "you", "emily", "Coffee", 5.0, 11),
];

fn june(day: u32) -> Result<DateTime<Utc>, AppError> {
    Utc.with_ymd_and_hms(2025, 6, day, 18, 0, 0)
        .single()
        .ok_or_else(|| AppError::Argument(format!("invalid seed date: June {day}")))
}

/// Loads the dataset. Returns the number of log records appended.
pub fn seed(engine: &Engine) -> Result<u64, AppError> {
    let start = engine.version()?;
    if start != 0 {
        return Err(AppError::Argument(
            "seed only runs on an empty ledger".to_string(),
        ));
    }
    let currency = engine.currency()?;

    for (id, name) in MEMBERS {
        engine.add_member(id, name)?;
    }
    for (name, members) in GROUPS {
        engine.new_group(name, members.iter().copied())?;
    }

    for (group, payer, debtor, description, amount, day) in DEBTS {
        let group = engine.group_by_name(group)?;
        let amount = Money::from_major_f64(amount, currency)?;
        engine.record_expense(
            ExpenseCmd::new(
                payer,
                amount,
                SplitPolicy::exact(vec![Share::new(debtor, amount)]),
                june(day)?,
            )
            .group(group.id)
            .description(description),
        )?;
    }

    // A shared grocery run and a partial repayment, so the group has
    // multi-party expenses and payments too.
    let flat = engine.group_by_name("Apartment Buddies")?;
    engine.record_expense(
        ExpenseCmd::new(
            "grace",
            Money::from_major_f64(80.0, currency)?,
            SplitPolicy::even(["you", "alice", "bob", "grace"]),
            june(10)?,
        )
        .group(flat.id)
        .description("Groceries"),
    )?;
    engine.record_payment(
        PaymentCmd::new("you", "alice", Money::from_major_f64(35.2, currency)?, june(12)?)
            .group(flat.id)
            .description("Rent, first half"),
    )?;

    let appended = engine.version()? - start;
    tracing::info!("seeded {appended} records");
    Ok(appended)
}

#[cfg(test)]
mod tests {
    use engine::{Currency, MemberId, Scope, TransactionLog};

    use super::*;

    #[test]
    fn seed_produces_a_consistent_ledger() {
        let engine = Engine::builder()
            .log(TransactionLog::new(Currency::Inr))
            .build()
            .unwrap();
        let appended = seed(&engine).unwrap();
        assert_eq!(appended, 9 + 4 + 12 + 2);
        assert_eq!(engine.audit(Scope::Global).unwrap(), 14);

        let you = MemberId::from("you");
        let summary = engine.summary(&you).unwrap();
        assert_eq!(summary.net, summary.you_are_owed - summary.you_owe);

        let plan = engine.simplify_debts(&[], Scope::Global).unwrap();
        assert!(plan.len() < engine.net_positions(Scope::Global).unwrap().len());

        assert!(seed(&engine).is_err());
    }
}
