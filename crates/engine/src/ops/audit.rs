use std::collections::BTreeSet;

use crate::{
    EngineError, LedgerEntry, MemberId, Money, PairwiseBalances, ResultEngine, Scope, balances,
};

use super::{Engine, report, require_scope};

impl Engine {
    /// Recompute every derived figure in `scope` from scratch and cross-check
    /// them. Returns the number of effective entries inspected.
    ///
    /// Checks that expense shares add up to the expense total, that the
    /// pairwise matrix agrees with a direct fold in both directions and that
    /// net positions sum to zero.
    pub fn audit(&self, scope: Scope) -> ResultEngine<usize> {
        let snapshot = self.snapshot()?;
        require_scope(&snapshot, scope)?;

        let violation = |message: String| {
            let err = EngineError::InvariantViolation(message);
            report(&err);
            err
        };

        let mut inspected = 0;
        let mut parties: BTreeSet<&MemberId> = BTreeSet::new();
        for entry in snapshot.effective_entries(scope) {
            inspected += 1;
            if let LedgerEntry::Expense(expense) = entry {
                let total: Money = expense.shares.iter().map(|s| s.amount).sum();
                if total != expense.amount {
                    return Err(violation(format!(
                        "expense {} shares sum to {total}, expected {}",
                        expense.id, expense.amount
                    )));
                }
            }
            for (creditor, debtor, _) in entry.effects() {
                parties.insert(creditor);
                parties.insert(debtor);
            }
        }

        let pairwise = PairwiseBalances::from_state(&snapshot, scope);
        for a in &parties {
            for b in &parties {
                if a >= b {
                    continue;
                }
                let ab = balances::balance_between(&snapshot, a, b, scope);
                let ba = balances::balance_between(&snapshot, b, a, scope);
                if ab != -ba || ab != pairwise.get(a, b) {
                    return Err(violation(format!(
                        "balance between {a} and {b} is inconsistent: {ab} / {ba} / {}",
                        pairwise.get(a, b)
                    )));
                }
            }
        }

        let positions = balances::net_positions(&snapshot, scope);
        let total: Money = positions.values().sum();
        if !total.is_zero() {
            return Err(violation(format!("net positions sum to {total}")));
        }
        if positions != pairwise.net_positions() {
            return Err(violation(
                "net positions disagree with the pairwise matrix".to_string(),
            ));
        }

        tracing::info!(
            "audit passed: {inspected} entries, {} parties, version {}",
            parties.len(),
            snapshot.version()
        );
        Ok(inspected)
    }
}
